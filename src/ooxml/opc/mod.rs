//! Open Packaging Conventions (OPC) layer.
//!
//! A package is a ZIP archive (or an extracted directory) of named parts, a
//! `[Content_Types].xml` manifest, and `.rels` members that relate the package
//! and its parts to one another. This module reads such a package into an
//! [`OpcPackage`] graph, lets callers edit parts and relationships, and writes
//! the graph back out.
//!
//! - `quick-xml` parses the manifest and relationship members
//! - `zip` provides the archive container
//! - `atoi_simd`/`itoa` handle rId and partname numbering

pub mod constants;
pub mod error;
pub mod options;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

pub use options::{Compression, LoadOptions, SaveOptions};
pub use package::{OpcPackage, PackageModel};
pub use packuri::PackURI;
pub use part::{BlobPart, Part, PartConstructor, PartFactory, PartSelector, XmlPart};
pub use rel::{RelTarget, Relationship, Relationships};
