//! Error types for OOXML operations.

use thiserror::Error;

/// Result type for OOXML operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for OOXML operations.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] crate::ooxml::opc::error::OpcError),

    /// Malformed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// Well-formed XML that violates the expected schema
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// A value rejected by a setter or simple-type validator
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Requested cell span is not a rectangle
    #[error("Invalid span: {0}")]
    InvalidSpan(String),

    /// Lookup that found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Lookup that found more than one candidate
    #[error("Ambiguous: {0}")]
    Ambiguous(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error classification.
///
/// Lets callers branch on the category of a failure without matching on
/// every variant of [`OoxmlError`] or [`OpcError`](crate::ooxml::opc::error::OpcError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PackageNotFound,
    InvalidXml,
    NotFound,
    Ambiguous,
    InvalidOperation,
    Io,
}

impl OoxmlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Opc(e) => e.kind(),
            Self::Xml(_) | Self::InvalidXml(_) => ErrorKind::InvalidXml,
            Self::InvalidValue(_) | Self::InvalidSpan(_) => ErrorKind::InvalidOperation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Ambiguous(_) => ErrorKind::Ambiguous,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for OoxmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

impl From<std::str::Utf8Error> for OoxmlError {
    fn from(err: std::str::Utf8Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}
