//! Low-level XML text helpers shared by the package and element layers.

mod escape;

pub use escape::{escape_attr, escape_text, resolve_entity, unescape_xml};
