//! Word (.docx) document support.
//!
//! This module provides the WordprocessingML layer on top of the OPC
//! package: typed parts for the main document, styles, settings, numbering,
//! headers, footers, images and core properties, and a [`Package`] that
//! finds them through their relationships and creates the optional ones on
//! demand.
//!
//! # Architecture
//!
//! - `Package`: The overall .docx file package
//! - `parts`: One type per part, each giving typed views over its XML
//! - `enums`: Attribute value enumerations shared by the element views
//! - `template`: Content for parts a new document needs
//!
//! # Example
//!
//! ```rust,no_run
//! use docx_opc::ooxml::docx::{Package, WdHeaderFooter};
//!
//! let mut package = Package::new()?;
//! package.document_part_mut()?.body_mut().add_p();
//! let r_id = package.add_header(0, WdHeaderFooter::Primary)?;
//! package.header_part_mut(&r_id)?.hdr_mut().add_p();
//! package.save("new.docx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod enums;
pub mod package;
pub mod parts;
pub mod template;

pub use enums::{
    WdHeaderFooter, WdOrientation, WdParagraphAlignment, WdRowHeightRule, WdSectionStart,
    WdStyleType, WdTableAlignment,
};
pub use package::Package;
pub use parts::{
    CorePropertiesPart, DocumentPart, FooterPart, HeaderPart, ImagePart, NumberingPart,
    SettingsPart, StylesPart, part_factory,
};
