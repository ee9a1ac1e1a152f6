//! The styles part, `/word/styles.xml`.

use log::debug;

use crate::ooxml::docx::enums::WdStyleType;
use crate::ooxml::docx::template::default_styles_xml;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, XmlPart, delegate_part};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::styles::{Style, Styles};

pub const STYLES_PARTNAME: &str = "/word/styles.xml";

#[derive(Debug, Clone)]
pub struct StylesPart {
    xml: XmlPart,
}

delegate_part!(StylesPart, xml);

impl StylesPart {
    /// A styles part holding Word's default style set, for packages that lack one.
    pub fn default_part() -> Result<Self> {
        let partname = PackURI::new(STYLES_PARTNAME)?;
        let xml = XmlPart::from_blob(partname, ct::WML_STYLES, default_styles_xml())?;
        Ok(Self { xml })
    }

    pub fn load(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        let xml = XmlPart::from_blob(partname, content_type, &blob)?;
        Styles::new(xml.root())?;
        Ok(Box::new(Self { xml }))
    }

    pub fn styles(&self) -> Styles<&Element> {
        Styles::wrap(self.xml.root())
    }

    pub fn styles_mut(&mut self) -> Styles<&mut Element> {
        Styles::wrap(self.xml.root_mut())
    }

    pub fn style_by_id(&self, style_id: &str) -> Option<Style<&Element>> {
        self.styles().into_style_by_id(style_id)
    }

    /// The default style of `style_type`, `None` when the document defines none.
    pub fn default_style(&self, style_type: WdStyleType) -> Result<Option<Style<&Element>>> {
        self.styles().into_default_for(style_type)
    }

    /// Id to use for a reference to `style_id` from content of `style_type`.
    ///
    /// `None` means "use the default style". A missing id, or one naming a
    /// style of another type, resolves to the default style of the type.
    pub fn resolve_style_id(
        &self,
        style_id: Option<&str>,
        style_type: WdStyleType,
    ) -> Result<Option<String>> {
        let Some(style_id) = style_id else {
            return Ok(None);
        };
        if let Some(style) = self.style_by_id(style_id)
            && style.style_type()? == style_type
        {
            return Ok(Some(style_id.to_string()));
        }
        debug!("style {} is not a {} style, using the default", style_id, style_type);
        match self.default_style(style_type)? {
            Some(default) => default.style_id(),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_part() {
        let part = StylesPart::default_part().unwrap();
        assert_eq!(part.partname().as_str(), STYLES_PARTNAME);
        let normal = part.default_style(WdStyleType::Paragraph).unwrap().unwrap();
        assert_eq!(normal.style_id().unwrap().as_deref(), Some("Normal"));
    }

    #[test]
    fn test_resolve_style_id() {
        let part = StylesPart::default_part().unwrap();
        let resolve = |id, ty| part.resolve_style_id(id, ty).unwrap();

        assert_eq!(resolve(Some("Heading1"), WdStyleType::Paragraph).as_deref(), Some("Heading1"));
        assert_eq!(resolve(None, WdStyleType::Paragraph), None);
        // unknown id and wrong type both fall back to the default
        assert_eq!(resolve(Some("NoSuchStyle"), WdStyleType::Paragraph).as_deref(), Some("Normal"));
        assert_eq!(
            resolve(Some("Heading1"), WdStyleType::Character).as_deref(),
            Some("DefaultParagraphFont")
        );
    }

    #[test]
    fn test_add_style_through_part() {
        let mut part = StylesPart::default_part().unwrap();
        part.styles_mut().add_style("Quote Block", WdStyleType::Paragraph, false).unwrap();
        let style = part.style_by_id("QuoteBlock").unwrap();
        assert!(style.is_custom().unwrap());
    }
}
