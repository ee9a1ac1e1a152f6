/// Options controlling how packages are loaded and saved.
///
/// Loading guards against hostile archives with a cap on the number of parts
/// and on the size of any single part. `strict` decides what happens to a
/// relationship whose target part is missing from the archive.
///
/// # Examples
///
/// ```rust
/// use docx_opc::ooxml::opc::{Compression, LoadOptions, SaveOptions};
///
/// let load = LoadOptions::new().with_max_parts(500).with_strict(false);
/// assert_eq!(load.max_parts, 500);
///
/// let save = SaveOptions::new().with_compression(Compression::Stored);
/// assert_eq!(save.compression, Compression::Stored);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Largest number of parts a package may contain
    pub max_parts: usize,
    /// Largest uncompressed size of one part, in bytes
    pub max_part_size: u64,
    /// Fail on relationships to parts missing from the archive instead of
    /// logging and skipping them
    pub strict: bool,
}

pub const DEFAULT_MAX_PARTS: usize = 10_000;
pub const DEFAULT_MAX_PART_SIZE: u64 = 256 * 1024 * 1024;

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_parts: DEFAULT_MAX_PARTS,
            max_part_size: DEFAULT_MAX_PART_SIZE,
            strict: true,
        }
    }
}

impl LoadOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_max_parts(mut self, max_parts: usize) -> Self {
        self.max_parts = max_parts;
        self
    }

    #[inline]
    pub fn with_max_part_size(mut self, max_part_size: u64) -> Self {
        self.max_part_size = max_part_size;
        self
    }

    /// Set whether dangling relationship targets are an error.
    #[inline]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Compression applied to every member when saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    pub(crate) fn method(self) -> zip::CompressionMethod {
        match self {
            Self::Deflated => zip::CompressionMethod::Deflated,
            Self::Stored => zip::CompressionMethod::Stored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOptions {
    pub compression: Compression,
}

impl SaveOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}
