//! Physical storage behind an OPC package.
//!
//! A package is read either from a ZIP archive or from a directory holding the
//! extracted members; both sit behind [`PhysPkgReader`]. Writing always
//! produces a ZIP archive.

use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use log::debug;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::options::SaveOptions;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};

/// Read access to the members of a physical package.
pub trait PhysPkgReader {
    /// Bytes of member `membername`, `None` when it does not exist.
    ///
    /// Members larger than `max_size` are refused with
    /// [`OpcError::LimitExceeded`] before being read.
    fn read_member(&mut self, membername: &str, max_size: u64) -> Result<Option<Vec<u8>>>;

    /// Bytes of the part stored at `pack_uri`.
    fn blob_for(&mut self, pack_uri: &PackURI, max_size: u64) -> Result<Vec<u8>> {
        self.read_member(pack_uri.membername(), max_size)?
            .ok_or_else(|| OpcError::PartNotFound(pack_uri.to_string()))
    }

    /// The `[Content_Types].xml` manifest, which every package must have.
    fn content_types_xml(&mut self, max_size: u64) -> Result<Vec<u8>> {
        self.read_member(&CONTENT_TYPES_URI[1..], max_size)?
            .ok_or_else(|| OpcError::PartNotFound(CONTENT_TYPES_URI.to_string()))
    }

    /// Relationships XML of `source_uri`, `None` when the source has none.
    fn rels_xml_for(&mut self, source_uri: &PackURI, max_size: u64) -> Result<Option<Vec<u8>>> {
        self.read_member(source_uri.rels_uri().membername(), max_size)
    }
}

/// Open the package at `path`, a ZIP file or an extracted directory.
pub fn open_phys_reader(path: &Path) -> Result<Box<dyn PhysPkgReader>> {
    if path.is_dir() {
        debug!("reading package from directory {}", path.display());
        return Ok(Box::new(DirPhysReader::new(path)));
    }
    if !path.is_file() {
        return Err(OpcError::PackageNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;
    match ZipPhysReader::new(file) {
        Ok(reader) => Ok(Box::new(reader)),
        Err(OpcError::Zip(_)) => Err(OpcError::PackageNotFound(path.display().to_string())),
        Err(err) => Err(err),
    }
}

/// Package stored as a ZIP archive.
pub struct ZipPhysReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipPhysReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        debug!("opened zip package with {} members", archive.len());
        Ok(Self { archive })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Every member name, in central directory order.
    pub fn member_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }
}

impl ZipPhysReader<Cursor<Vec<u8>>> {
    /// Package held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(data))
    }
}

impl<R: Read + Seek> PhysPkgReader for ZipPhysReader<R> {
    fn read_member(&mut self, membername: &str, max_size: u64) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(membername) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let size = file.size();
        if size > max_size {
            return Err(OpcError::LimitExceeded(format!(
                "member '{}' is {} bytes, limit is {}",
                membername, size, max_size
            )));
        }
        let mut data = Vec::with_capacity(size as usize);
        // The declared size is not trusted; cap what is actually inflated.
        (&mut file).take(max_size + 1).read_to_end(&mut data)?;
        if data.len() as u64 > max_size {
            return Err(OpcError::LimitExceeded(format!(
                "member '{}' exceeds {} bytes",
                membername, max_size
            )));
        }
        Ok(Some(data))
    }
}

/// Package extracted into a directory, one file per member.
pub struct DirPhysReader {
    root: PathBuf,
}

impl DirPhysReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PhysPkgReader for DirPhysReader {
    fn read_member(&mut self, membername: &str, max_size: u64) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(membername);
        let meta = match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if meta.len() > max_size {
            return Err(OpcError::LimitExceeded(format!(
                "member '{}' is {} bytes, limit is {}",
                membername,
                meta.len(),
                max_size
            )));
        }
        Ok(Some(fs::read(path)?))
    }
}

/// Writes package members into a ZIP archive.
pub struct PhysPkgWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> PhysPkgWriter<W> {
    pub fn new(writer: W, options: &SaveOptions) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: SimpleFileOptions::default().compression_method(options.compression.method()),
        }
    }

    /// Add member `pack_uri` holding `blob`.
    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        self.zip.start_file(pack_uri.membername(), self.options)?;
        self.zip.write_all(blob)?;
        Ok(())
    }

    /// Write the central directory and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::options::Compression;

    fn archive(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer =
            PhysPkgWriter::new(Cursor::new(Vec::new()), &SaveOptions::new().with_compression(Compression::Stored));
        for (name, data) in members {
            writer.write(&PackURI::new(format!("/{}", name)).unwrap(), data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_zip_reader_members() {
        let data = archive(&[
            ("[Content_Types].xml", b"<Types/>"),
            ("word/document.xml", b"<w:document/>"),
            ("word/_rels/document.xml.rels", b"<Relationships/>"),
        ]);
        let mut reader = ZipPhysReader::from_bytes(data).unwrap();
        assert_eq!(reader.len(), 3);
        assert_eq!(reader.content_types_xml(1024).unwrap(), b"<Types/>");

        let doc = PackURI::new("/word/document.xml").unwrap();
        assert_eq!(reader.blob_for(&doc, 1024).unwrap(), b"<w:document/>");
        assert!(reader.rels_xml_for(&doc, 1024).unwrap().is_some());
        assert!(reader.rels_xml_for(&PackURI::package(), 1024).unwrap().is_none());

        let missing = PackURI::new("/word/styles.xml").unwrap();
        assert!(matches!(reader.blob_for(&missing, 1024), Err(OpcError::PartNotFound(_))));
        assert!(matches!(reader.blob_for(&doc, 4), Err(OpcError::LimitExceeded(_))));
    }

    #[test]
    fn test_dir_reader() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("word")).unwrap();
        fs::write(dir.path().join("[Content_Types].xml"), b"<Types/>").unwrap();
        fs::write(dir.path().join("word/document.xml"), b"<w:document/>").unwrap();

        let mut reader = open_phys_reader(dir.path()).unwrap();
        assert_eq!(reader.content_types_xml(1024).unwrap(), b"<Types/>");
        let doc = PackURI::new("/word/document.xml").unwrap();
        assert_eq!(reader.blob_for(&doc, 1024).unwrap(), b"<w:document/>");
        assert!(reader.rels_xml_for(&doc, 1024).unwrap().is_none());
    }

    #[test]
    fn test_open_missing_or_not_zip() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.docx");
        assert!(matches!(open_phys_reader(&missing), Err(OpcError::PackageNotFound(_))));

        let text = dir.path().join("plain.docx");
        fs::write(&text, b"not a zip archive").unwrap();
        assert!(matches!(open_phys_reader(&text), Err(OpcError::PackageNotFound(_))));
    }
}
