//! Provides the PackURI value type and utilities for working with package URIs.
//!
//! A PackURI represents a part name within an OPC package, following the URI format
//! defined by the Open Packaging Conventions specification.

use std::fmt;
use std::str::FromStr;

use crate::ooxml::opc::error::{OpcError, Result};

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

/// Absolute, slash-rooted name of a part inside a package.
///
/// PackURIs always begin with a forward slash and use forward slashes as path separators.
/// They expose the pieces the rest of the OPC layer needs: the directory used as the base
/// for relative relationship targets, the extension used for content-type defaults, the
/// numeric index used when allocating tuple partnames, and the zip member name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a new PackURI, rejecting strings that do not begin with `/`.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(OpcError::InvalidPackUri(format!(
                "PackURI must begin with slash, got '{}'",
                uri
            )));
        }
        Ok(PackURI { uri })
    }

    /// The package pseudo-partname `/`.
    pub fn package() -> Self {
        PackURI {
            uri: PACKAGE_URI.to_string(),
        }
    }

    pub fn content_types() -> Self {
        PackURI {
            uri: CONTENT_TYPES_URI.to_string(),
        }
    }

    /// Resolve a relationship target reference against the directory of its source.
    ///
    /// `("/word", "../customXml/item1.xml")` resolves to `/customXml/item1.xml`.
    /// A reference that is already absolute replaces the base entirely.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(normalize(&joined))
    }

    /// Directory portion, `/word` for `/word/document.xml`; `/` for top-level parts.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Last path segment, empty for the package pseudo-partname.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Extension without the leading period, empty when there is none.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Index of a tuple partname: 21 for `/word/media/image21.png`, `None` for
    /// singleton partnames such as `/word/document.xml`.
    ///
    /// The stem must be letters followed by digits without a leading zero.
    pub fn idx(&self) -> Option<u32> {
        let filename = self.filename();
        let stem = match filename.rfind('.') {
            Some(pos) => &filename[..pos],
            None => filename,
        };
        let alpha_len = stem.bytes().take_while(u8::is_ascii_alphabetic).count();
        if alpha_len == 0 {
            return None;
        }
        let rest = &stem.as_bytes()[alpha_len..];
        let digit_len = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        if digit_len == 0 || rest[0] == b'0' {
            return None;
        }
        atoi_simd::parse::<u32>(&rest[..digit_len]).ok()
    }

    /// Zip member name: the URI without its leading slash.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Reference to this partname relative to `base_uri`, as written in a `.rels` file.
    ///
    /// `/word/styles.xml` relative to `/word` is `styles.xml`; relative to
    /// `/word/glossary` it is `../styles.xml`.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut segments: Vec<&str> = Vec::with_capacity(from.len() - common + to.len() - common);
        segments.extend(std::iter::repeat_n("..", from.len() - common));
        segments.extend(&to[common..]);
        segments.join("/")
    }

    /// PackURI of the `.rels` item holding this part's relationships.
    ///
    /// `/word/_rels/document.xml.rels` for `/word/document.xml`, and
    /// `/_rels/.rels` for the package itself.
    pub fn rels_uri(&self) -> PackURI {
        let base_uri = self.base_uri();
        let uri = if base_uri == "/" {
            format!("/_rels/{}.rels", self.filename())
        } else {
            format!("{}/_rels/{}.rels", base_uri, self.filename())
        };
        PackURI { uri }
    }

    pub fn is_package(&self) -> bool {
        self.uri == PACKAGE_URI
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

/// Collapse `.` and `..` segments and duplicate slashes.
fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            _ => segments.push(segment),
        }
    }
    let mut normalized = String::with_capacity(path.len());
    for segment in &segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

impl FromStr for PackURI {
    type Err = OpcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for PackURI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}
