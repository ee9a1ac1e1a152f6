//! Office Open XML (OOXML) format implementation for WordprocessingML.
//!
//! The implementation is based on the Open Packaging Conventions (OPC).
//!
//! # Architecture
//!
//! The module is organized into several layers:
//!
//! 1. **OPC Layer** (`opc`): Package handling (ZIP or directory, content
//!    types, parts, relationships)
//! 2. **Element Layer** (`oxml`): Owned XML trees, the schema framework that
//!    keeps children in sequence order, and typed element views
//! 3. **Shared Utilities** (`shared`, `error`): Lengths, colors and error types
//! 4. **Word Documents** (`docx`): Typed parts and the .docx package
//!
//! # Example: Working with Word Documents
//!
//! ```rust,no_run
//! use docx_opc::ooxml::docx::Package;
//!
//! let pkg = Package::open("document.docx")?;
//! let part = pkg.document_part()?;
//! println!("Document contains {} paragraphs", part.body()?.paragraphs().count());
//! for table in part.body()?.tables() {
//!     println!("table with {} columns", table.col_count()?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod docx;
pub mod error;
pub mod opc;
pub mod oxml;
pub mod shared;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{ErrorKind, OoxmlError, Result};
