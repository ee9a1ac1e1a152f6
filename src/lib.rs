//! docx-opc - A Rust library for reading and writing WordprocessingML (.docx) packages
//!
//! This library loads a .docx file into an in-memory graph of parts joined
//! by relationships, exposes the XML of each part through typed views that
//! keep child elements in schema order, and writes the graph back out.
//!
//! # Features
//!
//! - **OPC Package Layer**: ZIP or extracted-directory packages, content
//!   types, relationship graphs with cycle-safe traversal
//! - **Element Framework**: Owned XML trees with schema-ordered insertion and
//!   typed attribute codecs
//! - **Word Parts**: Document, styles, settings, numbering, headers,
//!   footers, images and core properties
//! - **Tables**: Grid-aware cell addressing and rectangular cell merges
//!
//! # Example - Creating a DOCX file
//!
//! ```no_run
//! use docx_opc::ooxml::docx::Package;
//! use docx_opc::ooxml::oxml::CellAddr;
//! use docx_opc::ooxml::shared::Length;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = Package::new()?;
//! let mut body = pkg.document_part_mut()?.body_mut();
//! let mut table = body.add_tbl(3, 3, Length::from_inches(6.0));
//! table.merge(CellAddr::new(0, 0), CellAddr::new(1, 1))?;
//! pkg.save("table.docx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Reading a DOCX file
//!
//! ```no_run
//! use docx_opc::ooxml::docx::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pkg = Package::open("document.docx")?;
//! for (source, rel) in pkg.opc().iter_rels() {
//!     println!("{} -[{}]-> {:?}", source, rel.reltype(), rel.target());
//! }
//! # Ok(())
//! # }
//! ```

/// Format-independent helpers
pub mod common;

/// OOXML (Office Open XML) package and WordprocessingML support
pub mod ooxml;

// Re-export commonly used types for convenience
pub use ooxml::docx::Package;
pub use ooxml::{ErrorKind, OoxmlError, OpcPackage, PackURI, Result};
