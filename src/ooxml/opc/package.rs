//! The in-memory package: a graph of parts joined by relationships.
//!
//! `OpcPackage` owns every part, keyed by partname. Relationships hold
//! partnames rather than references, so the graph may contain cycles and parts
//! can be renamed or replaced without touching their neighbours. Walks over
//! the graph keep a visited set and terminate on any topology.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use log::{debug, warn};

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::options::{LoadOptions, SaveOptions};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory};
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, ZipPhysReader, open_phys_reader};
use crate::ooxml::opc::pkgreader::{PackageReader, SerializedRelationship};
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::{RelTarget, Relationship, Relationships};

/// A typed document built over a loaded package.
///
/// [`OpcPackage::open_as`] and friends wrap the package with
/// [`PackageModel::from_opc`], then call [`PackageModel::after_unmarshal`]
/// exactly once. By then every part exists, every relationship is resolved
/// and every part's own [`Part::after_unmarshal`] has run.
pub trait PackageModel: Sized {
    fn from_opc(opc: OpcPackage) -> Result<Self>;

    fn after_unmarshal(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct OpcPackage {
    rels: Relationships,
    parts: HashMap<PackURI, Box<dyn Part>>,
}

impl OpcPackage {
    /// An empty package with no parts and no relationships.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI),
            parts: HashMap::new(),
        }
    }

    /// Open a package file or extracted directory with default options.
    ///
    /// Every part is loaded through the default [`PartFactory`], which keeps
    /// parts as raw bytes.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &LoadOptions::default(), &PartFactory::default())
    }

    pub fn open_with<P: AsRef<Path>>(
        path: P,
        options: &LoadOptions,
        factory: &PartFactory,
    ) -> Result<Self> {
        let path = path.as_ref();
        debug!("opening package {}", path.display());
        let mut phys = open_phys_reader(path)?;
        Self::load(phys.as_mut(), options, factory)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(data, &LoadOptions::default(), &PartFactory::default())
    }

    pub fn from_bytes_with(data: Vec<u8>, options: &LoadOptions, factory: &PartFactory) -> Result<Self> {
        Self::from_reader_with(Cursor::new(data), options, factory)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_reader_with(reader, &LoadOptions::default(), &PartFactory::default())
    }

    pub fn from_reader_with<R: Read + Seek>(
        reader: R,
        options: &LoadOptions,
        factory: &PartFactory,
    ) -> Result<Self> {
        let mut phys = ZipPhysReader::new(reader).map_err(|err| match err {
            OpcError::Zip(zip_err) => OpcError::PackageNotFound(format!("stream is not a zip archive: {}", zip_err)),
            other => other,
        })?;
        Self::load(&mut phys, options, factory)
    }

    /// Load the package at `path` and wrap it in the model `M`.
    pub fn open_as<M: PackageModel, P: AsRef<Path>>(
        path: P,
        options: &LoadOptions,
        factory: &PartFactory,
    ) -> Result<M> {
        Self::open_with(path, options, factory)?.into_model()
    }

    pub fn from_bytes_as<M: PackageModel>(data: Vec<u8>, options: &LoadOptions, factory: &PartFactory) -> Result<M> {
        Self::from_bytes_with(data, options, factory)?.into_model()
    }

    pub fn from_reader_as<M: PackageModel, R: Read + Seek>(
        reader: R,
        options: &LoadOptions,
        factory: &PartFactory,
    ) -> Result<M> {
        Self::from_reader_with(reader, options, factory)?.into_model()
    }

    /// Wrap this loaded package in `M` and run its package-level hook.
    pub fn into_model<M: PackageModel>(self) -> Result<M> {
        let mut model = M::from_opc(self)?;
        model.after_unmarshal()?;
        Ok(model)
    }

    /// Read every reachable part from `phys` and build the graph.
    pub fn load(phys: &mut dyn PhysPkgReader, options: &LoadOptions, factory: &PartFactory) -> Result<Self> {
        let reader = PackageReader::read(phys, options)?;
        Self::unmarshal(reader, factory)
    }

    /// Build the graph from serialized parts.
    ///
    /// All parts are created first, then relationships are resolved against
    /// them, then each part's [`Part::after_unmarshal`] runs.
    pub fn unmarshal(reader: PackageReader, factory: &PartFactory) -> Result<Self> {
        let (pkg_srels, sparts) = reader.into_parts();
        let mut parts: HashMap<PackURI, Box<dyn Part>> = HashMap::with_capacity(sparts.len());
        let mut part_srels = Vec::with_capacity(sparts.len());
        for spart in sparts {
            let part = factory.load(spart.partname.clone(), &spart.content_type, &spart.reltype, spart.blob)?;
            part_srels.push((spart.partname.clone(), spart.srels));
            parts.insert(spart.partname, part);
        }

        let rels = resolve_rels(PACKAGE_URI, &pkg_srels, &parts)?;
        for (partname, srels) in part_srels {
            let base_uri = partname.base_uri().to_string();
            let resolved = resolve_rels(&base_uri, &srels, &parts)?;
            if let Some(part) = parts.get_mut(&partname) {
                *part.rels_mut() = resolved;
            }
        }
        for part in parts.values_mut() {
            part.after_unmarshal();
        }

        debug!("unmarshalled {} parts", parts.len());
        Ok(Self { rels, parts })
    }

    /// Target of the package's `officeDocument` relationship.
    pub fn main_document_part(&self) -> Result<&dyn Part> {
        self.part_related_by(rt::OFFICE_DOCUMENT)
    }

    /// The part the package relationship of `reltype` points to.
    pub fn part_related_by(&self, reltype: &str) -> Result<&dyn Part> {
        let partname = self.rels.part_with_reltype(reltype)?;
        self.part(partname)
    }

    pub fn part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname)
            .map(|part| part.as_ref())
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()).into())
    }

    pub fn part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        match self.parts.get_mut(partname) {
            Some(part) => Ok(part.as_mut()),
            None => Err(OpcError::PartNotFound(partname.to_string()).into()),
        }
    }

    /// The part at `partname` as its concrete type, `None` when absent or of another type.
    pub fn part_as<T: Part>(&self, partname: &PackURI) -> Option<&T> {
        self.parts.get(partname)?.as_any().downcast_ref::<T>()
    }

    pub fn part_as_mut<T: Part>(&mut self, partname: &PackURI) -> Option<&mut T> {
        self.parts.get_mut(partname)?.as_any_mut().downcast_mut::<T>()
    }

    #[inline]
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname)
    }

    /// Number of parts held, reachable or not.
    #[inline]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Put `part` into the package, returning the part it replaced.
    ///
    /// The part is not reachable until some source relates to it.
    pub fn add_part(&mut self, part: Box<dyn Part>) -> Option<Box<dyn Part>> {
        debug!("add part {} ({})", part.partname(), part.content_type());
        self.parts.insert(part.partname().clone(), part)
    }

    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Box<dyn Part>> {
        self.parts.remove(partname)
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// rId of the package relationship of `reltype` to `target`, created when missing.
    pub fn relate_to(&mut self, target: &PackURI, reltype: &str) -> String {
        self.rels.get_or_add(reltype, target).to_string()
    }

    /// Reachable parts, depth first in relationship order, each once.
    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        let mut order: Vec<&dyn Part> = Vec::with_capacity(self.parts.len());
        let mut visited: HashSet<&PackURI> = HashSet::with_capacity(self.parts.len());
        let mut stack = vec![self.rels.iter()];
        while let Some(iter) = stack.last_mut() {
            let Some(rel) = iter.next() else {
                stack.pop();
                continue;
            };
            let Some(part) = rel.target_partname().and_then(|target| self.parts.get(target)) else {
                continue;
            };
            if visited.insert(part.partname()) {
                order.push(part.as_ref());
                stack.push(part.rels().iter());
            }
        }
        order.into_iter()
    }

    /// Every relationship reachable from the package with its source partname.
    ///
    /// Package relationships report `/` as their source. Each relationship is
    /// yielded once; a part's relationships are visited the first time the
    /// part is reached.
    pub fn iter_rels(&self) -> impl Iterator<Item = (&PackURI, &Relationship)> {
        let mut out = Vec::new();
        let mut visited: HashSet<&PackURI> = HashSet::new();
        let root: &PackURI = &PACKAGE_ROOT;
        let mut stack = vec![(root, self.rels.iter())];
        while let Some((source, iter)) = stack.last_mut() {
            let source: &PackURI = *source;
            let Some(rel) = iter.next() else {
                stack.pop();
                continue;
            };
            out.push((source, rel));
            if let Some(part) = rel.target_partname().and_then(|target| self.parts.get(target))
                && visited.insert(part.partname())
            {
                stack.push((part.partname(), part.rels().iter()));
            }
        }
        out.into_iter()
    }

    /// First partname from `template` not already taken.
    ///
    /// `template` holds a `%d` that is replaced by 1, 2, ... in turn, so
    /// `/word/header%d.xml` yields `/word/header1.xml` in an empty package and
    /// fills gaps left by removed parts.
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        if !template.contains("%d") {
            return Err(OpcError::InvalidPackUri(format!("partname template '{}' has no %d", template)).into());
        }
        let mut buf = itoa::Buffer::new();
        let mut n: usize = 1;
        loop {
            let candidate = PackURI::new(template.replacen("%d", buf.format(n), 1))?;
            if !self.parts.contains_key(&candidate) {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Remove parts no relationship chain from the package reaches.
    pub fn drop_unreachable_parts(&mut self) -> usize {
        let reachable: HashSet<PackURI> = self.iter_parts().map(|part| part.partname().clone()).collect();
        let before = self.parts.len();
        self.parts.retain(|partname, _| reachable.contains(partname));
        let dropped = before - self.parts.len();
        if dropped > 0 {
            debug!("dropped {} unreachable parts", dropped);
        }
        dropped
    }

    /// Save to a ZIP file at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_with(path, &SaveOptions::default())
    }

    pub fn save_with<P: AsRef<Path>>(&self, path: P, options: &SaveOptions) -> Result<()> {
        let path = path.as_ref();
        debug!("saving package to {}", path.display());
        let file = BufWriter::new(File::create(path)?);
        let mut file = self.write_to(file, options)?;
        file.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with(&SaveOptions::default())
    }

    pub fn to_bytes_with(&self, options: &SaveOptions) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()), options)?.into_inner())
    }

    /// Write the reachable parts to `writer` and return it.
    pub fn write_to<W: Write + Seek>(&self, writer: W, options: &SaveOptions) -> Result<W> {
        let parts: Vec<&dyn Part> = self.iter_parts().collect();
        Ok(PackageWriter::write(writer, &self.rels, &parts, options)?)
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

static PACKAGE_ROOT: once_cell::sync::Lazy<PackURI> = once_cell::sync::Lazy::new(PackURI::package);

/// Turn serialized relationships into [`Relationships`] whose internal
/// targets are parts present in `parts`.
///
/// Targets that were skipped while reading are dropped with a warning.
fn resolve_rels(
    base_uri: &str,
    srels: &[SerializedRelationship],
    parts: &HashMap<PackURI, Box<dyn Part>>,
) -> Result<Relationships> {
    let mut rels = Relationships::new(base_uri);
    for srel in srels {
        let target = if srel.is_external() {
            RelTarget::External(srel.target_ref.clone())
        } else {
            let partname = srel.target_partname()?;
            if !parts.contains_key(&partname) {
                warn!("dropping relationship {} from {}: {} was not loaded", srel.r_id, base_uri, partname);
                continue;
            }
            RelTarget::Part(partname)
        };
        rels.add(&srel.r_id, &srel.reltype, target);
    }
    Ok(rels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::error::ErrorKind;
    use crate::ooxml::opc::constants::content_type as ct;
    use crate::ooxml::opc::part::{BlobPart, XmlPart};

    fn uri(s: &str) -> PackURI {
        PackURI::new(s).unwrap()
    }

    fn blob_part(partname: &str) -> Box<dyn Part> {
        Box::new(BlobPart::new(uri(partname), ct::XML, b"<x/>".to_vec()))
    }

    fn cyclic_package() -> OpcPackage {
        let mut pkg = OpcPackage::new();
        let mut a = blob_part("/a.xml");
        let mut b = blob_part("/sub/b.xml");
        a.relate_to(&uri("/sub/b.xml"), rt::CUSTOM_XML);
        b.relate_to(&uri("/a.xml"), rt::CUSTOM_XML);
        b.relate_to(&uri("/sub/b.xml"), rt::CUSTOM_XML);
        pkg.add_part(a);
        pkg.add_part(b);
        pkg.relate_to(&uri("/a.xml"), rt::OFFICE_DOCUMENT);
        pkg
    }

    #[test]
    fn test_walks_terminate_on_cycles() {
        let pkg = cyclic_package();
        let names: Vec<&str> = pkg.iter_parts().map(|part| part.partname().as_str()).collect();
        assert_eq!(names, ["/a.xml", "/sub/b.xml"]);

        let rels: Vec<(&str, &str)> = pkg
            .iter_rels()
            .map(|(source, rel)| (source.as_str(), rel.r_id()))
            .collect();
        assert_eq!(
            rels,
            [("/", "rId1"), ("/a.xml", "rId1"), ("/sub/b.xml", "rId1"), ("/sub/b.xml", "rId2")]
        );
    }

    #[test]
    fn test_round_trip_through_bytes() {
        let pkg = cyclic_package();
        let bytes = pkg.to_bytes().unwrap();
        let loaded = OpcPackage::from_bytes(bytes).unwrap();
        assert_eq!(loaded.part_count(), 2);
        assert_eq!(loaded.main_document_part().unwrap().partname().as_str(), "/a.xml");
        let b = loaded.part(&uri("/sub/b.xml")).unwrap();
        assert_eq!(b.rels().target_ref("rId1").unwrap(), "../a.xml");
        assert_eq!(b.blob().as_ref(), b"<x/>");
    }

    #[test]
    fn test_next_partname_fills_gaps() {
        let mut pkg = OpcPackage::new();
        assert_eq!(pkg.next_partname("/word/header%d.xml").unwrap().as_str(), "/word/header1.xml");
        pkg.add_part(blob_part("/word/header1.xml"));
        pkg.add_part(blob_part("/word/header3.xml"));
        assert_eq!(pkg.next_partname("/word/header%d.xml").unwrap().as_str(), "/word/header2.xml");
        assert!(pkg.next_partname("/word/header.xml").is_err());
    }

    #[test]
    fn test_unreachable_parts_are_not_saved() {
        let mut pkg = cyclic_package();
        pkg.add_part(blob_part("/orphan.xml"));
        assert_eq!(pkg.part_count(), 3);
        assert_eq!(pkg.iter_parts().count(), 2);
        assert_eq!(pkg.drop_unreachable_parts(), 1);
        assert!(!pkg.contains_part(&uri("/orphan.xml")));
    }

    #[test]
    fn test_missing_part_and_typed_access() {
        let mut pkg = OpcPackage::new();
        let err = pkg.part(&uri("/nope.xml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(pkg.main_document_part().unwrap_err().kind(), ErrorKind::NotFound);

        let xml = XmlPart::from_blob(uri("/word/document.xml"), ct::WML_DOCUMENT_MAIN, b"<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"/>").unwrap();
        pkg.add_part(Box::new(xml));
        assert!(pkg.part_as::<XmlPart>(&uri("/word/document.xml")).is_some());
        assert!(pkg.part_as::<BlobPart>(&uri("/word/document.xml")).is_none());
    }

    #[derive(Debug)]
    struct Counted {
        opc: OpcPackage,
        hook_runs: usize,
        rels_seen: usize,
    }

    impl PackageModel for Counted {
        fn from_opc(opc: OpcPackage) -> Result<Self> {
            Ok(Self { opc, hook_runs: 0, rels_seen: 0 })
        }

        fn after_unmarshal(&mut self) -> Result<()> {
            self.hook_runs += 1;
            self.rels_seen = self.opc.iter_rels().count();
            Ok(())
        }
    }

    #[test]
    fn test_package_hook_runs_once_after_wiring() {
        let bytes = cyclic_package().to_bytes().unwrap();
        let model: Counted =
            OpcPackage::from_bytes_as(bytes, &LoadOptions::default(), &PartFactory::default()).unwrap();
        assert_eq!(model.hook_runs, 1);
        // every relationship already resolved when the hook ran
        assert_eq!(model.rels_seen, 4);
        assert_eq!(model.opc.part_count(), 2);
    }

    #[test]
    fn test_package_hook_error_fails_the_load() {
        #[derive(Debug)]
        struct Refuses;
        impl PackageModel for Refuses {
            fn from_opc(_: OpcPackage) -> Result<Self> {
                Ok(Refuses)
            }
            fn after_unmarshal(&mut self) -> Result<()> {
                Err(OpcError::PartNotFound("/missing.xml".to_string()).into())
            }
        }
        let bytes = cyclic_package().to_bytes().unwrap();
        let err = OpcPackage::from_bytes_as::<Refuses>(bytes, &LoadOptions::default(), &PartFactory::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_from_bytes_rejects_non_zip() {
        let err = OpcPackage::from_bytes(b"plain text".to_vec()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PackageNotFound);
    }
}
