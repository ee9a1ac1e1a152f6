//! The main document part, `/word/document.xml`.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, XmlPart, delegate_part};
use crate::ooxml::oxml::document::{Body, Document};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::section::SectPr;

pub const DOCUMENT_PARTNAME: &str = "/word/document.xml";

/// Main document part of a WordprocessingML package.
///
/// Holds the `w:document` tree. Sections are numbered in document order; the
/// last one is the `w:sectPr` at the end of the body.
#[derive(Debug, Clone)]
pub struct DocumentPart {
    xml: XmlPart,
}

delegate_part!(DocumentPart, xml);

impl DocumentPart {
    /// Wrap `root`, which must be a `w:document` element.
    pub fn new(partname: PackURI, root: Element) -> Result<Self> {
        let root = Document::new(root)?.into_inner();
        Ok(Self {
            xml: XmlPart::new(partname, ct::WML_DOCUMENT_MAIN, root),
        })
    }

    /// A document with one empty paragraph and a default section.
    pub fn default_part() -> Result<Self> {
        let partname = PackURI::new(DOCUMENT_PARTNAME)?;
        Self::new(partname, Document::new_document()?.into_inner())
    }

    pub fn load(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        let xml = XmlPart::from_blob(partname, content_type, &blob)?;
        Document::new(xml.root())?;
        Ok(Box::new(Self { xml }))
    }

    pub fn document(&self) -> Document<&Element> {
        Document::wrap(self.xml.root())
    }

    pub fn document_mut(&mut self) -> Document<&mut Element> {
        Document::wrap(self.xml.root_mut())
    }

    /// The `w:body`, an error when the document has none.
    pub fn body(&self) -> Result<Body<&Element>> {
        self.document().into_body()
    }

    pub fn body_mut(&mut self) -> Body<&mut Element> {
        self.document_mut().into_body_mut()
    }

    pub fn section_count(&self) -> Result<usize> {
        Ok(self.body()?.into_sect_prs().len())
    }

    /// Properties of section `n`, counting from zero.
    pub fn sect_pr(&self, n: usize) -> Result<SectPr<&Element>> {
        self.body()?
            .into_sect_prs()
            .into_iter()
            .nth(n)
            .ok_or_else(|| OoxmlError::NotFound(format!("section {}", n)))
    }

    pub fn sect_pr_mut(&mut self, n: usize) -> Result<SectPr<&mut Element>> {
        self.body_mut()
            .into_sect_pr(n)
            .ok_or_else(|| OoxmlError::NotFound(format!("section {}", n)))
    }

    /// One more than the largest numeric `id` attribute in the document.
    ///
    /// Drawing and bookmark ids share this space. Only unprefixed `id`
    /// attributes whose value is all digits count; 1 when there are none.
    pub fn next_id(&self) -> u32 {
        self.xml
            .root()
            .iter()
            .flat_map(|el| el.attributes())
            .filter(|attr| attr.name.prefix().is_none() && attr.name.local_name() == "id")
            .filter_map(|attr| {
                let value = attr.value.as_bytes();
                if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
                    return None;
                }
                atoi_simd::parse::<u32>(value).ok()
            })
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::oxml::parser::parse_xml;

    const DOC: &[u8] = br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"><w:body><w:p><w:pPr><w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:pPr></w:p><w:p><w:r><w:drawing><wp:inline><wp:docPr id="7" name="Picture 7"/></wp:inline></w:drawing></w:r></w:p><w:bookmarkStart w:id="42" w:name="x"/><w:sectPr><w:pgSz w:w="15840" w:h="12240"/></w:sectPr></w:body></w:document>"#;

    fn load(xml: &[u8]) -> DocumentPart {
        let partname = PackURI::new(DOCUMENT_PARTNAME).unwrap();
        DocumentPart::new(partname, parse_xml(xml).unwrap()).unwrap()
    }

    #[test]
    fn test_default_part() {
        let part = DocumentPart::default_part().unwrap();
        assert_eq!(part.partname().as_str(), DOCUMENT_PARTNAME);
        assert_eq!(part.content_type(), ct::WML_DOCUMENT_MAIN);
        assert_eq!(part.body().unwrap().paragraphs().count(), 1);
        assert_eq!(part.section_count().unwrap(), 1);
        assert_eq!(part.next_id(), 1);
    }

    #[test]
    fn test_sections_in_document_order() {
        let mut part = load(DOC);
        assert_eq!(part.section_count().unwrap(), 2);
        let first = part.sect_pr(0).unwrap();
        assert_eq!(first.page_width().unwrap().unwrap().twips(), 12240);
        let last = part.sect_pr(1).unwrap();
        assert_eq!(last.page_width().unwrap().unwrap().twips(), 15840);
        assert!(part.sect_pr(2).is_err());

        part.sect_pr_mut(0).unwrap().set_title_pg(true).unwrap();
        assert!(part.sect_pr(0).unwrap().title_pg().unwrap());
    }

    #[test]
    fn test_next_id_ignores_prefixed_ids() {
        // w:id="42" is prefixed, only docPr/@id counts
        let part = load(DOC);
        assert_eq!(part.next_id(), 8);
    }

    #[test]
    fn test_rejects_wrong_root() {
        let partname = PackURI::new(DOCUMENT_PARTNAME).unwrap();
        let root = parse_xml(br#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#).unwrap();
        assert!(DocumentPart::new(partname, root).is_err());
    }
}
