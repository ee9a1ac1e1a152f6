//! Error types for OPC package operations

use thiserror::Error;

use crate::ooxml::error::ErrorKind;

#[derive(Error, Debug)]
pub enum OpcError {
    #[error("Package not found at '{0}'")]
    PackageNotFound(String),

    #[error("Invalid pack URI: {0}")]
    InvalidPackUri(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("no content type for partname '{0}' in [Content_Types].xml")]
    ContentTypeNotFound(String),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(String),

    #[error("multiple relationships of type '{0}'")]
    AmbiguousRelationship(String),

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    #[error("XML parsing error: {0}")]
    Xml(String),

    #[error("Package limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpcError {
    /// Coarse classification shared with [`OoxmlError`](crate::ooxml::error::OoxmlError).
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PackageNotFound(_) => ErrorKind::PackageNotFound,
            Self::Xml(_) | Self::InvalidRelationship(_) | Self::ContentTypeNotFound(_) => {
                ErrorKind::InvalidXml
            },
            Self::PartNotFound(_) | Self::RelationshipNotFound(_) => ErrorKind::NotFound,
            Self::AmbiguousRelationship(_) => ErrorKind::Ambiguous,
            Self::InvalidPackUri(_) | Self::LimitExceeded(_) => ErrorKind::InvalidOperation,
            // A corrupt archive is reported the same way as a missing one
            Self::Zip(_) => ErrorKind::PackageNotFound,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<quick_xml::Error> for OpcError {
    fn from(err: quick_xml::Error) -> Self {
        OpcError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for OpcError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OpcError::Xml(err.to_string())
    }
}

impl From<std::str::Utf8Error> for OpcError {
    fn from(err: std::str::Utf8Error) -> Self {
        OpcError::Xml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;
