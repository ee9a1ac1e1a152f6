//! Parts of an OPC package and the factory that builds them on load.
//!
//! A part is a named stream in the package with a content type and its own
//! relationships. Parts whose content type the factory knows are loaded into a
//! specialised type; anything else is kept as an opaque [`BlobPart`] and
//! written back byte for byte.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};

use crate::ooxml::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::ns;
use crate::ooxml::oxml::parser::parse_xml;
use crate::ooxml::oxml::serialize::serialize_for_storage;

/// A part in an OPC package.
///
/// Implementors hold their partname, content type and relationships; the
/// provided methods build relationship management on top of those.
pub trait Part: Any + fmt::Debug {
    fn partname(&self) -> &PackURI;

    /// Rename the part. Relationship targets are absolute, only the base moves.
    fn set_partname(&mut self, partname: PackURI);

    fn content_type(&self) -> &str;

    /// Bytes to store in the package. XML parts serialize their tree here.
    fn blob(&self) -> Cow<'_, [u8]>;

    fn rels(&self) -> &Relationships;

    fn rels_mut(&mut self) -> &mut Relationships;

    /// Root element for parts that hold parsed XML.
    fn element(&self) -> Option<&Element> {
        None
    }

    fn element_mut(&mut self) -> Option<&mut Element> {
        None
    }

    /// rId of the relationship of `reltype` to `target`, created when missing.
    fn relate_to(&mut self, target: &PackURI, reltype: &str) -> String {
        self.rels_mut().get_or_add(reltype, target).to_string()
    }

    /// rId of the external relationship of `reltype` to `url`, created when missing.
    fn relate_to_external(&mut self, url: &str, reltype: &str) -> String {
        self.rels_mut().get_or_add_external(reltype, url).to_string()
    }

    /// Relative reference to the target of `r_id`, or the URL when external.
    fn target_ref(&self, r_id: &str) -> Result<String> {
        Ok(self.rels().target_ref(r_id)?.into_owned())
    }

    /// Number of references to `r_id` in the part content.
    ///
    /// XML parts count attributes in the relationships namespace (`r:id`,
    /// `r:embed`, `r:link` and the like); other parts count quoted
    /// occurrences in the raw bytes.
    fn rel_ref_count(&self, r_id: &str) -> usize {
        match self.element() {
            Some(root) => count_rel_refs(root, r_id),
            None => count_quoted(&self.blob(), r_id),
        }
    }

    /// Remove relationship `r_id` unless two or more references to it remain.
    ///
    /// Call while the referencing element being removed is still in the
    /// tree, so a count of one is that element alone. Returns whether the
    /// relationship was removed.
    fn drop_rel(&mut self, r_id: &str) -> bool {
        let refs = self.rel_ref_count(r_id);
        if refs < 2 {
            return self.rels_mut().remove(r_id).is_some();
        }
        warn!(
            "keeping relationship {} of {}: still referenced {} times",
            r_id,
            self.partname(),
            refs
        );
        false
    }

    /// Called once every part of a freshly loaded package is in place.
    fn after_unmarshal(&mut self) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Attributes in the relationships namespace whose value is `r_id`.
fn count_rel_refs(root: &Element, r_id: &str) -> usize {
    root.iter()
        .flat_map(|el| el.attributes())
        .filter(|attr| attr.name.namespace() == Some(ns::R) && attr.value == r_id)
        .count()
}

fn count_quoted(blob: &[u8], r_id: &str) -> usize {
    let double = format!("\"{}\"", r_id);
    let single = format!("'{}'", r_id);
    [double.as_bytes(), single.as_bytes()]
        .iter()
        .map(|needle| blob.windows(needle.len()).filter(|w| w == needle).count())
        .sum()
}

/// Forward [`Part`] to a field that already implements it.
///
/// Specialised parts wrap an [`XmlPart`] or [`BlobPart`] and only add typed
/// accessors, so everything except `as_any` goes to the inner part.
macro_rules! delegate_part {
    ($ty:ty, $field:ident $(, { $($extra:item)* })?) => {
        impl $crate::ooxml::opc::part::Part for $ty {
            fn partname(&self) -> &$crate::ooxml::opc::packuri::PackURI {
                $crate::ooxml::opc::part::Part::partname(&self.$field)
            }
            fn set_partname(&mut self, partname: $crate::ooxml::opc::packuri::PackURI) {
                $crate::ooxml::opc::part::Part::set_partname(&mut self.$field, partname)
            }
            fn content_type(&self) -> &str {
                $crate::ooxml::opc::part::Part::content_type(&self.$field)
            }
            fn blob(&self) -> ::std::borrow::Cow<'_, [u8]> {
                $crate::ooxml::opc::part::Part::blob(&self.$field)
            }
            fn rels(&self) -> &$crate::ooxml::opc::rel::Relationships {
                $crate::ooxml::opc::part::Part::rels(&self.$field)
            }
            fn rels_mut(&mut self) -> &mut $crate::ooxml::opc::rel::Relationships {
                $crate::ooxml::opc::part::Part::rels_mut(&mut self.$field)
            }
            fn element(&self) -> Option<&$crate::ooxml::oxml::element::Element> {
                $crate::ooxml::opc::part::Part::element(&self.$field)
            }
            fn element_mut(&mut self) -> Option<&mut $crate::ooxml::oxml::element::Element> {
                $crate::ooxml::opc::part::Part::element_mut(&mut self.$field)
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            $($($extra)*)?
        }
    };
}

pub(crate) use delegate_part;

/// A part kept as raw bytes.
#[derive(Debug, Clone)]
pub struct BlobPart {
    partname: PackURI,
    content_type: String,
    blob: Vec<u8>,
    rels: Relationships,
}

impl BlobPart {
    pub fn new(partname: PackURI, content_type: impl Into<String>, blob: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri());
        Self {
            partname,
            content_type: content_type.into(),
            blob,
            rels,
        }
    }

    /// [`PartConstructor`] for parts with no specialised type.
    pub fn load(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        Ok(Box::new(Self::new(partname, content_type, blob)))
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.blob
    }

    pub fn set_blob(&mut self, blob: Vec<u8>) {
        self.blob = blob;
    }
}

impl Part for BlobPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn set_partname(&mut self, partname: PackURI) {
        self.rels.set_base_uri(partname.base_uri());
        self.partname = partname;
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.blob)
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A part whose content is a parsed XML tree.
///
/// The tree is the only copy of the content; [`Part::blob`] serializes it.
#[derive(Debug, Clone)]
pub struct XmlPart {
    partname: PackURI,
    content_type: String,
    element: Element,
    rels: Relationships,
}

impl XmlPart {
    pub fn new(partname: PackURI, content_type: impl Into<String>, element: Element) -> Self {
        let rels = Relationships::new(partname.base_uri());
        Self {
            partname,
            content_type: content_type.into(),
            element,
            rels,
        }
    }

    /// Parse `blob` into a new part.
    pub fn from_blob(partname: PackURI, content_type: &str, blob: &[u8]) -> Result<Self> {
        let element = parse_xml(blob)?;
        Ok(Self::new(partname, content_type, element))
    }

    /// [`PartConstructor`] for XML content with no more specific type.
    pub fn load(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        Ok(Box::new(Self::from_blob(partname, content_type, &blob)?))
    }

    #[inline]
    pub fn root(&self) -> &Element {
        &self.element
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.element
    }
}

impl Part for XmlPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn set_partname(&mut self, partname: PackURI) {
        self.rels.set_base_uri(partname.base_uri());
        self.partname = partname;
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> Cow<'_, [u8]> {
        Cow::Owned(serialize_for_storage(&self.element))
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn element(&self) -> Option<&Element> {
        Some(&self.element)
    }

    fn element_mut(&mut self) -> Option<&mut Element> {
        Some(&mut self.element)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Builds a part from its partname, content type and stored bytes.
pub type PartConstructor = fn(PackURI, &str, Vec<u8>) -> Result<Box<dyn Part>>;

/// Chooses a constructor from content type and relationship type, ahead of
/// the content-type table. `None` defers to the table.
pub type PartSelector = fn(content_type: &str, reltype: &str) -> Option<PartConstructor>;

/// Maps content types to part constructors.
///
/// Lookup order is the selector, then the content-type table, then
/// [`BlobPart`].
#[derive(Clone, Default)]
pub struct PartFactory {
    constructors: HashMap<String, PartConstructor>,
    selector: Option<PartSelector>,
}

impl PartFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `constructor` for every part of `content_type`.
    pub fn register(&mut self, content_type: &str, constructor: PartConstructor) -> &mut Self {
        self.constructors.insert(content_type.to_string(), constructor);
        self
    }

    pub fn with_selector(mut self, selector: PartSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn load(
        &self,
        partname: PackURI,
        content_type: &str,
        reltype: &str,
        blob: Vec<u8>,
    ) -> Result<Box<dyn Part>> {
        let constructor = self
            .selector
            .and_then(|select| select(content_type, reltype))
            .or_else(|| self.constructors.get(content_type).copied());
        match constructor {
            Some(construct) => construct(partname, content_type, blob),
            None => {
                debug!("loading {} as blob part ({})", partname, content_type);
                BlobPart::load(partname, content_type, blob)
            },
        }
    }
}

impl fmt::Debug for PartFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartFactory")
            .field("content_types", &self.constructors.keys().collect::<Vec<_>>())
            .field("selector", &self.selector.is_some())
            .finish()
    }
}
