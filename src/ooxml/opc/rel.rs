//! Relationships from a source (the package or a part) to its targets.
//!
//! Internal targets are held as absolute [`PackURI`]s so a relationship keeps
//! pointing at the same part whatever the source's own partname is; the
//! relative `Target` attribute is only computed when the rels XML is written.

use std::borrow::Cow;
use std::fmt::Write as _;

use log::debug;

use crate::common::xml::escape_attr;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;

/// Where a relationship points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelTarget {
    /// Another part in the same package.
    Part(PackURI),
    /// A URL outside the package, written with `TargetMode="External"`.
    External(String),
}

/// A single relationship from a source to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    target: RelTarget,
}

impl Relationship {
    pub fn new(r_id: impl Into<String>, reltype: impl Into<String>, target: RelTarget) -> Self {
        Self {
            r_id: r_id.into(),
            reltype: reltype.into(),
            target,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target(&self) -> &RelTarget {
        &self.target
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self.target, RelTarget::External(_))
    }

    /// Partname of the target part, `None` for external relationships.
    pub fn target_partname(&self) -> Option<&PackURI> {
        match &self.target {
            RelTarget::Part(partname) => Some(partname),
            RelTarget::External(_) => None,
        }
    }

    /// Value of the `Target` attribute as seen from `base_uri`.
    ///
    /// External targets are returned as-is; internal ones become a reference
    /// relative to the directory of the source part.
    pub fn target_ref(&self, base_uri: &str) -> Cow<'_, str> {
        match &self.target {
            RelTarget::Part(partname) => Cow::Owned(partname.relative_ref(base_uri)),
            RelTarget::External(url) => Cow::Borrowed(url),
        }
    }
}

/// The relationships of one source, in insertion order.
///
/// Order is preserved so that a loaded package writes its `.rels` back with
/// the relationships where they were.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    base_uri: String,
    rels: Vec<Relationship>,
}

impl Relationships {
    /// Empty collection for a source whose directory is `base_uri`.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: Vec::new(),
        }
    }

    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Rebase after the source part was renamed. Targets are absolute and stay put.
    pub fn set_base_uri(&mut self, base_uri: impl Into<String>) {
        self.base_uri = base_uri.into();
    }

    /// Add a relationship under an explicit rId.
    ///
    /// An existing relationship with the same rId is replaced.
    pub fn add(&mut self, r_id: &str, reltype: &str, target: RelTarget) -> &Relationship {
        debug!("add relationship {} ({}) from {}", r_id, reltype, self.base_uri);
        let rel = Relationship::new(r_id, reltype, target);
        let idx = match self.position(r_id) {
            Some(idx) => {
                self.rels[idx] = rel;
                idx
            },
            None => {
                self.rels.push(rel);
                self.rels.len() - 1
            },
        };
        &self.rels[idx]
    }

    /// rId of the relationship of `reltype` to `target`, adding one when none exists.
    pub fn get_or_add(&mut self, reltype: &str, target: &PackURI) -> &str {
        let idx = match self.rels.iter().position(|rel| {
            rel.reltype == reltype && rel.target_partname() == Some(target)
        }) {
            Some(idx) => idx,
            None => {
                let r_id = self.next_r_id();
                self.add(&r_id, reltype, RelTarget::Part(target.clone()));
                self.rels.len() - 1
            },
        };
        &self.rels[idx].r_id
    }

    /// rId of the external relationship of `reltype` to `url`, adding one when none exists.
    pub fn get_or_add_external(&mut self, reltype: &str, url: &str) -> &str {
        let idx = match self.rels.iter().position(|rel| {
            rel.reltype == reltype && matches!(&rel.target, RelTarget::External(u) if u == url)
        }) {
            Some(idx) => idx,
            None => {
                let r_id = self.next_r_id();
                self.add(&r_id, reltype, RelTarget::External(url.to_string()));
                self.rels.len() - 1
            },
        };
        &self.rels[idx].r_id
    }

    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// Partname of the single internal target of `reltype`.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&PackURI> {
        let mut matching = self
            .rels
            .iter()
            .filter(|rel| rel.reltype == reltype)
            .filter_map(Relationship::target_partname);
        let first = matching
            .next()
            .ok_or_else(|| OpcError::RelationshipNotFound(format!("no relationship of type '{}'", reltype)))?;
        if matching.next().is_some() {
            return Err(OpcError::AmbiguousRelationship(reltype.to_string()));
        }
        Ok(first)
    }

    /// Every relationship of `reltype`, in document order.
    pub fn all_with_reltype<'a>(&'a self, reltype: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.rels.iter().filter(move |rel| rel.reltype == reltype)
    }

    /// Lowest `rIdN` (N >= 1) not already taken.
    ///
    /// Gaps left by removed relationships are reused, so with `rId1` and
    /// `rId3` present the next id is `rId2`.
    pub fn next_r_id(&self) -> String {
        let used: Vec<u32> = self
            .rels
            .iter()
            .filter_map(|rel| rel.r_id.strip_prefix("rId"))
            .filter_map(|n| atoi_simd::parse::<u32>(n.as_bytes()).ok())
            .collect();
        let n = (1..=used.len() as u32 + 1)
            .find(|n| !used.contains(n))
            .unwrap_or(used.len() as u32 + 1);
        let mut buf = itoa::Buffer::new();
        format!("rId{}", buf.format(n))
    }

    /// `Target` attribute value of `r_id` relative to this source.
    pub fn target_ref(&self, r_id: &str) -> Result<Cow<'_, str>> {
        self.get(r_id)
            .map(|rel| rel.target_ref(&self.base_uri))
            .ok_or_else(|| OpcError::RelationshipNotFound(r_id.to_string()))
    }

    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        let idx = self.position(r_id)?;
        debug!("drop relationship {} from {}", r_id, self.base_uri);
        Some(self.rels.remove(idx))
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Relationship> {
        self.rels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize to a `.rels` document.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.rels.len() * 160);
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        let _ = write!(xml, "<Relationships xmlns=\"{}\">", namespace::OPC_RELATIONSHIPS);
        for rel in &self.rels {
            let _ = write!(
                xml,
                "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"",
                escape_attr(&rel.r_id),
                escape_attr(&rel.reltype),
                escape_attr(&rel.target_ref(&self.base_uri)),
            );
            if rel.is_external() {
                xml.push_str(" TargetMode=\"External\"");
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn position(&self, r_id: &str) -> Option<usize> {
        self.rels.iter().position(|rel| rel.r_id == r_id)
    }
}

impl<'a> IntoIterator for &'a Relationships {
    type Item = &'a Relationship;
    type IntoIter = std::slice::Iter<'a, Relationship>;

    fn into_iter(self) -> Self::IntoIter {
        self.rels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    fn uri(s: &str) -> PackURI {
        PackURI::new(s).unwrap()
    }

    #[test]
    fn test_next_r_id_fills_gaps() {
        let mut rels = Relationships::new("/word");
        assert_eq!(rels.next_r_id(), "rId1");
        rels.add("rId1", rt::STYLES, RelTarget::Part(uri("/word/styles.xml")));
        rels.add("rId3", rt::SETTINGS, RelTarget::Part(uri("/word/settings.xml")));
        assert_eq!(rels.next_r_id(), "rId2");

        let r_id = rels.get_or_add(rt::NUMBERING, &uri("/word/numbering.xml")).to_string();
        assert_eq!(r_id, "rId2");
        assert_eq!(rels.next_r_id(), "rId4");
    }

    #[test]
    fn test_get_or_add_reuses_matching_relationship() {
        let mut rels = Relationships::new("/word");
        let first = rels.get_or_add(rt::IMAGE, &uri("/word/media/image1.png")).to_string();
        let again = rels.get_or_add(rt::IMAGE, &uri("/word/media/image1.png")).to_string();
        assert_eq!(first, again);
        assert_eq!(rels.len(), 1);

        let ext = rels.get_or_add_external(rt::HYPERLINK, "https://example.com/").to_string();
        assert_eq!(ext, "rId2");
        assert_eq!(rels.get_or_add_external(rt::HYPERLINK, "https://example.com/"), "rId2");
        assert!(rels.get("rId2").unwrap().is_external());
    }

    #[test]
    fn test_part_with_reltype() {
        let mut rels = Relationships::new("/word");
        let err = rels.part_with_reltype(rt::STYLES).unwrap_err();
        assert!(matches!(err, OpcError::RelationshipNotFound(_)));

        rels.get_or_add(rt::STYLES, &uri("/word/styles.xml"));
        assert_eq!(rels.part_with_reltype(rt::STYLES).unwrap().as_str(), "/word/styles.xml");

        rels.get_or_add(rt::STYLES, &uri("/word/styles2.xml"));
        let err = rels.part_with_reltype(rt::STYLES).unwrap_err();
        assert!(matches!(err, OpcError::AmbiguousRelationship(_)));
    }

    #[test]
    fn test_add_replaces_same_r_id() {
        let mut rels = Relationships::new("/");
        rels.add("rId1", rt::OFFICE_DOCUMENT, RelTarget::Part(uri("/word/document.xml")));
        rels.add("rId1", rt::CORE_PROPERTIES, RelTarget::Part(uri("/docProps/core.xml")));
        assert_eq!(rels.len(), 1);
        assert_eq!(rels.get("rId1").unwrap().reltype(), rt::CORE_PROPERTIES);
        assert!(rels.remove("rId1").is_some());
        assert!(rels.remove("rId1").is_none());
        assert!(rels.is_empty());
    }

    #[test]
    fn test_to_xml_uses_relative_targets() {
        let mut rels = Relationships::new("/word");
        rels.add("rId1", rt::STYLES, RelTarget::Part(uri("/word/styles.xml")));
        rels.add("rId2", rt::HYPERLINK, RelTarget::External("http://a.b/?x=1&y=2".into()));
        let xml = rels.to_xml();
        assert!(xml.contains(r#"<Relationship Id="rId1" Type=""#));
        assert!(xml.contains(r#"Target="styles.xml"/>"#));
        assert!(xml.contains(r#"Target="http://a.b/?x=1&amp;y=2" TargetMode="External"/>"#));
        assert_eq!(rels.target_ref("rId1").unwrap(), "styles.xml");
    }
}
