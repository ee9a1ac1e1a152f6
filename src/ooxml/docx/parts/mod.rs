//! Part types of a WordprocessingML package.
//!
//! Each wraps an [`XmlPart`](crate::ooxml::opc::part::XmlPart) or
//! [`BlobPart`](crate::ooxml::opc::part::BlobPart) and adds typed access to
//! its content. [`part_factory`] maps content types to them for loading.

pub mod coreprops_part;
pub mod document_part;
pub mod hdrftr;
pub mod image_part;
pub mod numbering_part;
pub mod settings_part;
pub mod styles_part;

pub use coreprops_part::CorePropertiesPart;
pub use document_part::DocumentPart;
pub use hdrftr::{FooterPart, HeaderPart};
pub use image_part::ImagePart;
pub use numbering_part::NumberingPart;
pub use settings_part::SettingsPart;
pub use styles_part::StylesPart;

use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::part::{PartConstructor, PartFactory};

/// Any part reached through an image relationship is an image, whatever its
/// content type says.
fn select_part(_content_type: &str, reltype: &str) -> Option<PartConstructor> {
    (reltype == rt::IMAGE).then_some(ImagePart::load as PartConstructor)
}

/// Factory that loads every part type this module defines.
pub fn part_factory() -> PartFactory {
    let mut factory = PartFactory::new();
    factory
        .register(ct::WML_DOCUMENT_MAIN, DocumentPart::load)
        .register(ct::WML_HEADER, HeaderPart::load)
        .register(ct::WML_FOOTER, FooterPart::load)
        .register(ct::WML_NUMBERING, NumberingPart::load)
        .register(ct::WML_SETTINGS, SettingsPart::load)
        .register(ct::WML_STYLES, StylesPart::load)
        .register(ct::OPC_CORE_PROPERTIES, CorePropertiesPart::load);
    factory.with_selector(select_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::packuri::PackURI;
    use crate::ooxml::opc::part::{BlobPart, Part};

    #[test]
    fn test_factory_dispatch() {
        let factory = part_factory();
        let partname = PackURI::new("/word/media/image1.bin").unwrap();
        let part = factory
            .load(partname, "application/octet-stream", rt::IMAGE, b"data".to_vec())
            .unwrap();
        assert!(part.as_any().is::<ImagePart>());

        let partname = PackURI::new("/word/header1.xml").unwrap();
        let header = HeaderPart::new(partname.clone());
        let part = factory.load(partname, ct::WML_HEADER, rt::HEADER, header.blob().into_owned()).unwrap();
        assert!(part.as_any().is::<HeaderPart>());

        let partname = PackURI::new("/word/fontTable.xml").unwrap();
        let part = factory.load(partname, ct::WML_FONT_TABLE, rt::FONT_TABLE, b"<x/>".to_vec()).unwrap();
        assert!(part.as_any().is::<BlobPart>());
    }
}
