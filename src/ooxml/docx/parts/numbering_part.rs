//! The numbering definitions part, `/word/numbering.xml`.
//!
//! Only loaded from existing documents; a new package has none.

use crate::ooxml::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, XmlPart, delegate_part};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::numbering::Numbering;

#[derive(Debug, Clone)]
pub struct NumberingPart {
    xml: XmlPart,
}

delegate_part!(NumberingPart, xml);

impl NumberingPart {
    pub fn load(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        let xml = XmlPart::from_blob(partname, content_type, &blob)?;
        Numbering::new(xml.root())?;
        Ok(Box::new(Self { xml }))
    }

    pub fn numbering(&self) -> Numbering<&Element> {
        Numbering::wrap(self.xml.root())
    }

    pub fn numbering_mut(&mut self) -> Numbering<&mut Element> {
        Numbering::wrap(self.xml.root_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;

    const NUMBERING: &[u8] = br#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:abstractNum w:abstractNumId="0"/><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#;

    #[test]
    fn test_add_num_through_part() {
        let partname = PackURI::new("/word/numbering.xml").unwrap();
        let mut part = NumberingPart::load(partname, ct::WML_NUMBERING, NUMBERING.to_vec()).unwrap();
        let part = part.as_any_mut().downcast_mut::<NumberingPart>().unwrap();
        assert_eq!(part.numbering().nums().count(), 1);

        let num_id = part.numbering_mut().add_num(0).unwrap().num_id().unwrap();
        assert_eq!(num_id, 2);
        assert_eq!(part.numbering().num_having_num_id(2).unwrap().abstract_num_id().unwrap(), 0);
    }
}
