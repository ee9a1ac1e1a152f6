//! Element layer: an owned XML tree plus typed views over WordprocessingML.
//!
//! Parts that carry XML hold an [`Element`] tree parsed by [`parse_xml`].
//! Every element is tagged with an [`ElementClass`] from the tag registry,
//! and the typed views in the submodules (`Tbl`, `P`, `SectPr`, ...) wrap an
//! element of their class to expose schema-checked accessors. A view is
//! generic over how it holds the element, so `Tbl<&Element>` reads and
//! `Tbl<&mut Element>` edits through the same type.
//!
//! Tags the registry does not know stay [`ElementClass::Generic`] and are
//! written back unchanged.

pub mod coreprops;
pub mod document;
pub mod element;
pub mod ns;
pub mod numbering;
pub mod parser;
pub mod registry;
pub mod section;
pub mod serialize;
pub mod settings;
pub mod simpletypes;
pub mod styles;
pub mod table;
pub mod text;
pub mod xmlchemy;

pub use coreprops::CoreProperties;
pub use document::{Body, Document};
pub use element::{Element, QName};
pub use numbering::{Num, Numbering};
pub use parser::parse_xml;
pub use registry::ElementClass;
pub use section::{Ftr, HdrFtrKind, Hdr, Margin, SectPr};
pub use serialize::{serialize_for_reading, serialize_for_storage, to_xml_string};
pub use settings::Settings;
pub use styles::{Style, Styles};
pub use table::{CellAddr, Tbl, Tc, Tr};
pub use text::{P, R};
