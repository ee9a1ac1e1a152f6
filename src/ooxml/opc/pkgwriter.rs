//! Serialize a package graph into a ZIP archive.
//!
//! Members are written in a fixed order: `[Content_Types].xml`, the package
//! relationships, then each part followed by its relationships when it has
//! any.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{Seek, Write};

use log::debug;

use crate::common::xml::escape_attr;
use crate::ooxml::opc::constants::{content_type as ct, is_default_content_type, namespace};
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::options::SaveOptions;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use crate::ooxml::opc::rel::Relationships;

pub struct PackageWriter;

impl PackageWriter {
    /// Write `parts` and the package relationships `pkg_rels` to `writer`.
    pub fn write<W: Write + Seek>(
        writer: W,
        pkg_rels: &Relationships,
        parts: &[&dyn Part],
        options: &SaveOptions,
    ) -> Result<W> {
        let mut phys = PhysPkgWriter::new(writer, options);
        let content_types = ContentTypesItem::from_parts(parts.iter().copied());
        phys.write(&PackURI::content_types(), content_types.to_xml().as_bytes())?;
        phys.write(&PackURI::package().rels_uri(), pkg_rels.to_xml().as_bytes())?;
        for part in parts {
            phys.write(part.partname(), &part.blob())?;
            if !part.rels().is_empty() {
                phys.write(&part.partname().rels_uri(), part.rels().to_xml().as_bytes())?;
            }
        }
        debug!("wrote {} parts", parts.len());
        phys.finish()
    }
}

/// The `[Content_Types].xml` manifest for a set of parts.
///
/// A part whose extension and content type form a well-known pair is covered
/// by a `Default`; every other part gets an `Override`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypesItem {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl Default for ContentTypesItem {
    fn default() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }
}

impl ContentTypesItem {
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = &'a dyn Part>) -> Self {
        let mut item = Self::default();
        for part in parts {
            item.add_content_type(part.partname(), part.content_type());
        }
        item
    }

    fn add_content_type(&mut self, partname: &PackURI, content_type: &str) {
        let ext = partname.ext();
        if is_default_content_type(ext, content_type) {
            self.defaults.insert(ext.to_ascii_lowercase(), content_type.to_string());
        } else {
            self.overrides.insert(partname.to_string(), content_type.to_string());
        }
    }

    pub fn defaults(&self) -> &BTreeMap<String, String> {
        &self.defaults
    }

    pub fn overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + (self.defaults.len() + self.overrides.len()) * 120);
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        let _ = write!(xml, "<Types xmlns=\"{}\">", namespace::OPC_CONTENT_TYPES);
        for (ext, content_type) in &self.defaults {
            let _ = write!(
                xml,
                "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                escape_attr(ext),
                escape_attr(content_type)
            );
        }
        for (partname, content_type) in &self.overrides {
            let _ = write!(
                xml,
                "<Override PartName=\"{}\" ContentType=\"{}\"/>",
                escape_attr(partname),
                escape_attr(content_type)
            );
        }
        xml.push_str("</Types>");
        xml
    }
}
