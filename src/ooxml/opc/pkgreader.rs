//! Read-only view of a serialized package.
//!
//! [`PackageReader`] parses `[Content_Types].xml`, then walks the
//! relationship graph from the package relationships, loading every reachable
//! part once. Members no relationship reaches are never read.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;

use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::options::LoadOptions;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::phys_pkg::PhysPkgReader;

pub type SerializedRelationships = SmallVec<[SerializedRelationship; 8]>;

/// A part as stored: bytes plus everything needed to build a part object.
#[derive(Debug)]
pub struct SerializedPart {
    pub partname: PackURI,
    pub content_type: String,
    /// Type of the first relationship found pointing at this part
    pub reltype: String,
    pub blob: Vec<u8>,
    pub srels: SerializedRelationships,
}

/// A relationship as read from a `.rels` member, target still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedRelationship {
    /// Directory of the source, targets are relative to it
    pub base_uri: String,
    pub r_id: String,
    pub reltype: String,
    pub target_ref: String,
    pub target_mode: String,
}

impl SerializedRelationship {
    #[inline]
    pub fn is_external(&self) -> bool {
        self.target_mode == target_mode::EXTERNAL
    }

    /// Absolute partname of an internal target.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external() {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target part",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref)
    }
}

/// Content types from `[Content_Types].xml`.
///
/// An `Override` for the exact partname wins over a `Default` for its
/// extension. Both lookups ignore ASCII case.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeMap {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self::new();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(ref e) | Event::Start(ref e) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) =
                            (attr_value(e, b"Extension")?, attr_value(e, b"ContentType")?)
                        {
                            map.add_default(&ext, ct);
                        }
                    },
                    b"Override" => {
                        if let (Some(partname), Some(ct)) =
                            (attr_value(e, b"PartName")?, attr_value(e, b"ContentType")?)
                        {
                            map.add_override(&partname, ct);
                        }
                    },
                    _ => {},
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        debug!(
            "content types: {} defaults, {} overrides",
            map.defaults.len(),
            map.overrides.len()
        );
        Ok(map)
    }

    pub fn add_default(&mut self, extension: &str, content_type: String) {
        self.defaults.insert(extension.to_ascii_lowercase(), content_type);
    }

    pub fn add_override(&mut self, partname: &str, content_type: String) {
        self.overrides.insert(partname.to_ascii_lowercase(), content_type);
    }

    pub fn get(&self, partname: &PackURI) -> Result<&str> {
        if let Some(ct) = self.overrides.get(&partname.as_str().to_ascii_lowercase()) {
            return Ok(ct);
        }
        if let Some(ct) = self.defaults.get(&partname.ext().to_ascii_lowercase()) {
            return Ok(ct);
        }
        Err(OpcError::ContentTypeNotFound(partname.to_string()))
    }
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Parse a `.rels` member whose source lives in `base_uri`.
pub fn parse_rels_xml(rels_xml: &[u8], base_uri: &str) -> Result<SerializedRelationships> {
    let mut srels = SmallVec::new();
    let mut reader = Reader::from_reader(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if e.local_name().as_ref() == b"Relationship" => {
                let r_id = attr_value(e, b"Id")?;
                let reltype = attr_value(e, b"Type")?;
                let target_ref = attr_value(e, b"Target")?;
                let target_mode = attr_value(e, b"TargetMode")?
                    .unwrap_or_else(|| target_mode::INTERNAL.to_string());
                match (r_id, reltype, target_ref) {
                    (Some(r_id), Some(reltype), Some(target_ref)) => {
                        srels.push(SerializedRelationship {
                            base_uri: base_uri.to_string(),
                            r_id,
                            reltype,
                            target_ref,
                            target_mode,
                        });
                    },
                    _ => {
                        return Err(OpcError::InvalidRelationship(format!(
                            "<Relationship> in {} lacks Id, Type or Target",
                            base_uri
                        )));
                    },
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok(srels)
}

/// All reachable parts of a package with their relationships.
#[derive(Debug)]
pub struct PackageReader {
    pkg_srels: SerializedRelationships,
    sparts: Vec<SerializedPart>,
}

impl PackageReader {
    pub fn read(phys: &mut dyn PhysPkgReader, options: &LoadOptions) -> Result<Self> {
        let content_types = ContentTypeMap::from_xml(&phys.content_types_xml(options.max_part_size)?)?;
        let pkg_srels = Self::load_rels(phys, &PackURI::package(), options)?;
        let sparts = Self::walk_parts(phys, &pkg_srels, &content_types, options)?;
        debug!("read {} parts", sparts.len());
        Ok(Self { pkg_srels, sparts })
    }

    fn load_rels(
        phys: &mut dyn PhysPkgReader,
        source_uri: &PackURI,
        options: &LoadOptions,
    ) -> Result<SerializedRelationships> {
        match phys.rels_xml_for(source_uri, options.max_part_size)? {
            Some(xml) => parse_rels_xml(&xml, source_uri.base_uri()),
            None => Ok(SmallVec::new()),
        }
    }

    /// Depth-first walk in relationship order, each part visited once.
    ///
    /// A target missing from the archive is an error in strict mode; otherwise
    /// it is logged and skipped, leaving the relationship dangling.
    fn walk_parts(
        phys: &mut dyn PhysPkgReader,
        pkg_srels: &[SerializedRelationship],
        content_types: &ContentTypeMap,
        options: &LoadOptions,
    ) -> Result<Vec<SerializedPart>> {
        let mut sparts = Vec::new();
        let mut visited: HashSet<PackURI> = HashSet::new();
        let mut stack: Vec<(PackURI, String)> = Vec::new();
        push_targets(&mut stack, pkg_srels, &visited)?;

        while let Some((partname, reltype)) = stack.pop() {
            if !visited.insert(partname.clone()) {
                continue;
            }
            if sparts.len() >= options.max_parts {
                return Err(OpcError::LimitExceeded(format!(
                    "package has more than {} parts",
                    options.max_parts
                )));
            }
            let blob = match phys.read_member(partname.membername(), options.max_part_size)? {
                Some(blob) => blob,
                None if options.strict => return Err(OpcError::PartNotFound(partname.to_string())),
                None => {
                    warn!("relationship target {} is not in the package, skipping", partname);
                    continue;
                },
            };
            let content_type = content_types.get(&partname)?.to_string();
            let srels = Self::load_rels(phys, &partname, options)?;
            push_targets(&mut stack, &srels, &visited)?;
            sparts.push(SerializedPart {
                partname,
                content_type,
                reltype,
                blob,
                srels,
            });
        }

        Ok(sparts)
    }

    pub fn pkg_srels(&self) -> &[SerializedRelationship] {
        &self.pkg_srels
    }

    pub fn iter_sparts(&self) -> impl Iterator<Item = &SerializedPart> {
        self.sparts.iter()
    }

    /// Hand over the package relationships and parts for unmarshalling.
    pub fn into_parts(self) -> (SerializedRelationships, Vec<SerializedPart>) {
        (self.pkg_srels, self.sparts)
    }
}

/// Stack internal targets so they pop in relationship order.
fn push_targets(
    stack: &mut Vec<(PackURI, String)>,
    srels: &[SerializedRelationship],
    visited: &HashSet<PackURI>,
) -> Result<()> {
    for srel in srels.iter().rev().filter(|srel| !srel.is_external()) {
        let target = srel.target_partname()?;
        if !visited.contains(&target) {
            stack.push((target, srel.reltype.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    #[test]
    fn test_content_type_override_wins_and_ignores_case() {
        let xml = br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="XML" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/Word/Document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;
        let map = ContentTypeMap::from_xml(xml).unwrap();
        let doc = PackURI::new("/word/document.xml").unwrap();
        assert!(map.get(&doc).unwrap().ends_with("document.main+xml"));
        let other = PackURI::new("/customXml/item1.xml").unwrap();
        assert_eq!(map.get(&other).unwrap(), "application/xml");
        let image = PackURI::new("/word/media/image1.PNG").unwrap();
        assert_eq!(map.get(&image).unwrap(), "image/png");

        let unknown = PackURI::new("/word/media/image1.bin").unwrap();
        assert!(matches!(map.get(&unknown), Err(OpcError::ContentTypeNotFound(_))));
    }

    #[test]
    fn test_parse_rels_xml() {
        let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
</Relationships>"#;
        let srels = parse_rels_xml(xml, "/word").unwrap();
        assert_eq!(srels.len(), 2);
        assert_eq!(srels[0].reltype, rt::STYLES);
        assert_eq!(srels[0].target_partname().unwrap().as_str(), "/word/styles.xml");
        assert!(srels[1].is_external());
        assert_eq!(srels[1].target_ref, "https://example.com/?a=1&b=2");
        assert!(srels[1].target_partname().is_err());
    }

    #[test]
    fn test_relationship_missing_target_is_rejected() {
        let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="x"/></Relationships>"#;
        assert!(matches!(
            parse_rels_xml(xml, "/"),
            Err(OpcError::InvalidRelationship(_))
        ));
    }
}
