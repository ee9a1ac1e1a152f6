//! Image parts under `/word/media/`.
//!
//! The bytes are stored as given. A SHA-1 digest of them identifies the
//! image so the same picture added twice shares one part.

use std::fmt::Write as _;

use phf::{Map, phf_map};
use sha1::{Digest, Sha1};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{BlobPart, Part, delegate_part};

static IMAGE_CONTENT_TYPES: Map<&'static str, &'static str> = phf_map! {
    "bmp" => ct::BMP,
    "emf" => ct::X_EMF,
    "gif" => ct::GIF,
    "jpe" => ct::JPEG,
    "jpeg" => ct::JPEG,
    "jpg" => ct::JPEG,
    "png" => ct::PNG,
    "tif" => ct::TIFF,
    "tiff" => ct::TIFF,
    "wmf" => ct::X_WMF,
};

/// Content type for an image file extension, ignoring case.
pub fn image_content_type(ext: &str) -> Result<&'static str> {
    IMAGE_CONTENT_TYPES
        .get(ext.to_ascii_lowercase().as_str())
        .copied()
        .ok_or_else(|| OoxmlError::InvalidValue(format!("unsupported image extension '{}'", ext)))
}

/// Lowercase hex SHA-1 of `blob`.
pub fn sha1_hex(blob: &[u8]) -> String {
    let digest = Sha1::digest(blob);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

#[derive(Debug, Clone)]
pub struct ImagePart {
    blob: BlobPart,
    sha1: String,
}

delegate_part!(ImagePart, blob);

impl ImagePart {
    pub fn new(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Self {
        let sha1 = sha1_hex(&blob);
        Self {
            blob: BlobPart::new(partname, content_type, blob),
            sha1,
        }
    }

    /// A part for `blob` at `partname`, content type taken from its extension.
    pub fn from_blob(partname: PackURI, blob: Vec<u8>) -> Result<Self> {
        let content_type = image_content_type(partname.ext())?;
        Ok(Self::new(partname, content_type, blob))
    }

    pub fn load(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        Ok(Box::new(Self::new(partname, content_type, blob)))
    }

    /// Hex SHA-1 digest of the image bytes.
    #[inline]
    pub fn sha1(&self) -> &str {
        &self.sha1
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.blob.bytes()
    }

    /// Extension of the partname, used for new partnames of the same format.
    pub fn ext(&self) -> &str {
        self.partname().ext()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_hex() {
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_from_blob_picks_content_type() {
        let part = ImagePart::from_blob(PackURI::new("/word/media/image1.JPG").unwrap(), b"fake".to_vec()).unwrap();
        assert_eq!(part.content_type(), ct::JPEG);
        assert_eq!(part.sha1(), sha1_hex(b"fake"));
        assert_eq!(part.bytes(), b"fake");

        let err = ImagePart::from_blob(PackURI::new("/word/media/image1.svgz").unwrap(), Vec::new()).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidValue(_)));
    }
}
