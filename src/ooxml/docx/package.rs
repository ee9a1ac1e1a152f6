//! Package implementation for Word documents.

use std::io::{Read, Seek, Write};
use std::path::Path;

use log::debug;

use crate::ooxml::docx::enums::WdHeaderFooter;
use crate::ooxml::docx::parts::image_part::{image_content_type, sha1_hex};
use crate::ooxml::docx::parts::{
    CorePropertiesPart, DocumentPart, FooterPart, HeaderPart, ImagePart, NumberingPart,
    SettingsPart, StylesPart, part_factory,
};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::options::{LoadOptions, SaveOptions};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::{OpcPackage, PackageModel};
use crate::ooxml::oxml::coreprops::CoreProperties;
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::section::HdrFtrKind;

const HEADER_TEMPLATE: &str = "/word/header%d.xml";
const FOOTER_TEMPLATE: &str = "/word/footer%d.xml";

/// A Word (.docx) package.
///
/// This is the main entry point for working with Word documents. It wraps an
/// [`OpcPackage`] whose parts were loaded through the WordprocessingML
/// [`part_factory`], and reaches the document, styles, settings, numbering,
/// header, footer and image parts through their relationships.
///
/// # Examples
///
/// ```rust,no_run
/// use docx_opc::ooxml::docx::Package;
///
/// let mut pkg = Package::open("document.docx")?;
/// let paragraphs = pkg.document_part()?.body()?.paragraphs().count();
/// println!("{} paragraphs", paragraphs);
/// pkg.core_properties()?.set_title("Quarterly report")?;
/// pkg.save("report.docx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Package {
    opc: OpcPackage,
    /// Image parts known to the package, in discovery order
    image_parts: Vec<PackURI>,
}

impl Package {
    /// A minimal valid document: one empty paragraph in a default section,
    /// the default styles and core properties.
    pub fn new() -> Result<Self> {
        let mut opc = OpcPackage::new();
        let mut document = DocumentPart::default_part()?;
        let styles = StylesPart::default_part()?;
        let core = CorePropertiesPart::default_part()?;

        document.relate_to(styles.partname(), rt::STYLES);
        opc.relate_to(document.partname(), rt::OFFICE_DOCUMENT);
        opc.relate_to(core.partname(), rt::CORE_PROPERTIES);
        opc.add_part(Box::new(document));
        opc.add_part(Box::new(styles));
        opc.add_part(Box::new(core));

        Ok(Self {
            opc,
            image_parts: Vec::new(),
        })
    }

    /// Open a .docx file, or a directory holding an extracted one.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use docx_opc::ooxml::docx::Package;
    ///
    /// let pkg = Package::open("document.docx")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &LoadOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        OpcPackage::open_as(path, options, &part_factory())
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(data, &LoadOptions::default())
    }

    pub fn from_bytes_with(data: Vec<u8>, options: &LoadOptions) -> Result<Self> {
        OpcPackage::from_bytes_as(data, options, &part_factory())
    }

    /// Read a .docx package from `reader`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use docx_opc::ooxml::docx::Package;
    /// use std::io::Cursor;
    ///
    /// let data = std::fs::read("document.docx")?;
    /// let pkg = Package::from_reader(Cursor::new(data))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        OpcPackage::from_reader_as(reader, &LoadOptions::default(), &part_factory())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.opc.save(path)
    }

    pub fn save_with<P: AsRef<Path>>(&self, path: P, options: &SaveOptions) -> Result<()> {
        self.opc.save_with(path, options)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.opc.to_bytes()
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W, options: &SaveOptions) -> Result<W> {
        self.opc.write_to(writer, options)
    }

    #[inline]
    pub fn opc(&self) -> &OpcPackage {
        &self.opc
    }

    #[inline]
    pub fn opc_mut(&mut self) -> &mut OpcPackage {
        &mut self.opc
    }

    fn document_partname(&self) -> Result<PackURI> {
        Ok(self.opc.rels().part_with_reltype(rt::OFFICE_DOCUMENT)?.clone())
    }

    pub fn document_part(&self) -> Result<&DocumentPart> {
        let partname = self.opc.rels().part_with_reltype(rt::OFFICE_DOCUMENT)?;
        self.opc
            .part_as::<DocumentPart>(partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("document part {}", partname)))
    }

    pub fn document_part_mut(&mut self) -> Result<&mut DocumentPart> {
        let partname = self.document_partname()?;
        self.opc
            .part_as_mut::<DocumentPart>(&partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("document part {}", partname)))
    }

    /// The part of type `T` the document part relates to by `reltype`.
    fn document_related<T: Part>(&self, reltype: &str) -> Result<&T> {
        let partname = self.document_part()?.rels().part_with_reltype(reltype)?;
        self.opc
            .part_as::<T>(partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("{} at {}", std::any::type_name::<T>(), partname)))
    }

    /// Like [`Self::document_related`], creating the part with `create` and
    /// relating it from the document part when there is none.
    fn get_or_add_document_related<T: Part>(
        &mut self,
        reltype: &str,
        create: fn() -> Result<T>,
    ) -> Result<&mut T> {
        let existing = self
            .document_part()?
            .rels()
            .part_with_reltype(reltype)
            .map(PackURI::clone);
        let partname = match existing {
            Ok(partname) => partname,
            Err(OpcError::RelationshipNotFound(_)) => {
                let part = create()?;
                let partname = part.partname().clone();
                debug!("adding default part {}", partname);
                self.opc.add_part(Box::new(part));
                self.document_part_mut()?.relate_to(&partname, reltype);
                partname
            },
            Err(err) => return Err(err.into()),
        };
        self.opc
            .part_as_mut::<T>(&partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("{} at {}", std::any::type_name::<T>(), partname)))
    }

    /// The styles part; [`OoxmlError::Opc`] with a not-found kind when absent.
    pub fn styles_part(&self) -> Result<&StylesPart> {
        self.document_related(rt::STYLES)
    }

    /// The styles part, created with the default styles when the document has none.
    pub fn get_or_add_styles_part(&mut self) -> Result<&mut StylesPart> {
        self.get_or_add_document_related(rt::STYLES, StylesPart::default_part)
    }

    pub fn settings_part(&self) -> Result<&SettingsPart> {
        self.document_related(rt::SETTINGS)
    }

    pub fn get_or_add_settings_part(&mut self) -> Result<&mut SettingsPart> {
        self.get_or_add_document_related(rt::SETTINGS, SettingsPart::default_part)
    }

    /// The numbering part. Never created, documents without lists have none.
    pub fn numbering_part(&self) -> Result<&NumberingPart> {
        self.document_related(rt::NUMBERING)
    }

    pub fn numbering_part_mut(&mut self) -> Result<&mut NumberingPart> {
        let partname = self.document_part()?.rels().part_with_reltype(rt::NUMBERING)?.clone();
        self.opc
            .part_as_mut::<NumberingPart>(&partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("numbering part {}", partname)))
    }

    pub fn core_properties_part(&self) -> Result<&CorePropertiesPart> {
        let partname = self.opc.rels().part_with_reltype(rt::CORE_PROPERTIES)?;
        self.opc
            .part_as::<CorePropertiesPart>(partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("core properties part {}", partname)))
    }

    /// The core properties part, created with default values when missing.
    pub fn get_or_add_core_properties_part(&mut self) -> Result<&mut CorePropertiesPart> {
        let partname = match self.opc.rels().part_with_reltype(rt::CORE_PROPERTIES) {
            Ok(partname) => partname.clone(),
            Err(OpcError::RelationshipNotFound(_)) => {
                let part = CorePropertiesPart::default_part()?;
                let partname = part.partname().clone();
                debug!("adding default part {}", partname);
                self.opc.add_part(Box::new(part));
                self.opc.relate_to(&partname, rt::CORE_PROPERTIES);
                partname
            },
            Err(err) => return Err(err.into()),
        };
        self.opc
            .part_as_mut::<CorePropertiesPart>(&partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("core properties part {}", partname)))
    }

    /// Core document properties, created with default values when missing.
    pub fn core_properties(&mut self) -> Result<CoreProperties<&mut Element>> {
        Ok(self.get_or_add_core_properties_part()?.core_properties_mut())
    }

    /// Image parts in the package, in the order they were found or added.
    pub fn image_parts(&self) -> impl Iterator<Item = &ImagePart> {
        self.image_parts
            .iter()
            .filter_map(|partname| self.opc.part_as::<ImagePart>(partname))
    }

    /// Partname of the image part holding `blob`, adding one when no image
    /// part has the same bytes.
    ///
    /// `ext` is the image file extension and picks the content type. A new
    /// part is not reachable until something relates to it; see
    /// [`Self::get_or_add_image`].
    pub fn get_or_add_image_part(&mut self, blob: Vec<u8>, ext: &str) -> Result<PackURI> {
        let sha1 = sha1_hex(&blob);
        if let Some(existing) = self.image_parts().find(|part| part.sha1() == sha1) {
            return Ok(existing.partname().clone());
        }
        let content_type = image_content_type(ext)?;
        let partname = self.next_image_partname(ext)?;
        debug!("adding image part {} ({} bytes)", partname, blob.len());
        self.opc
            .add_part(Box::new(ImagePart::new(partname.clone(), content_type, blob)));
        self.image_parts.push(partname.clone());
        Ok(partname)
    }

    /// rId and partname of the image part for `blob`, related from the
    /// document part.
    pub fn get_or_add_image(&mut self, blob: Vec<u8>, ext: &str) -> Result<(String, PackURI)> {
        let partname = self.get_or_add_image_part(blob, ext)?;
        let r_id = self.document_part_mut()?.relate_to(&partname, rt::IMAGE);
        Ok((r_id, partname))
    }

    /// `/word/media/image{n}.{ext}` with the lowest `n` no image part uses.
    fn next_image_partname(&self, ext: &str) -> Result<PackURI> {
        let used: Vec<u32> = self.image_parts().filter_map(|part| part.partname().idx()).collect();
        let ext = ext.to_ascii_lowercase();
        let mut buf = itoa::Buffer::new();
        let mut n: u32 = 1;
        loop {
            if !used.contains(&n) {
                let candidate = PackURI::new(format!("/word/media/image{}.{}", buf.format(n), ext))?;
                if !self.opc.contains_part(&candidate) {
                    return Ok(candidate);
                }
            }
            n += 1;
        }
    }

    /// Add an empty header or footer part and relate it from the document part.
    fn add_hdr_ftr_part(&mut self, kind: HdrFtrKind) -> Result<(String, PackURI)> {
        let (template, reltype) = match kind {
            HdrFtrKind::Header => (HEADER_TEMPLATE, rt::HEADER),
            HdrFtrKind::Footer => (FOOTER_TEMPLATE, rt::FOOTER),
        };
        let partname = self.opc.next_partname(template)?;
        let part: Box<dyn Part> = match kind {
            HdrFtrKind::Header => Box::new(HeaderPart::new(partname.clone())),
            HdrFtrKind::Footer => Box::new(FooterPart::new(partname.clone())),
        };
        self.opc.add_part(part);
        let r_id = self.document_part_mut()?.relate_to(&partname, reltype);
        debug!("added {:?} part {} as {}", kind, partname, r_id);
        Ok((r_id, partname))
    }

    /// A new empty header part related from the document part.
    pub fn add_header_part(&mut self) -> Result<(String, PackURI)> {
        self.add_hdr_ftr_part(HdrFtrKind::Header)
    }

    pub fn add_footer_part(&mut self) -> Result<(String, PackURI)> {
        self.add_hdr_ftr_part(HdrFtrKind::Footer)
    }

    fn hdr_ftr_partname(&self, r_id: &str) -> Result<&PackURI> {
        self.document_part()?
            .rels()
            .get(r_id)
            .and_then(|rel| rel.target_partname())
            .ok_or_else(|| OpcError::RelationshipNotFound(r_id.to_string()).into())
    }

    /// The header part the document part relates to by `r_id`.
    pub fn header_part(&self, r_id: &str) -> Result<&HeaderPart> {
        let partname = self.hdr_ftr_partname(r_id)?;
        self.opc
            .part_as::<HeaderPart>(partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("{} is not a header part", partname)))
    }

    pub fn header_part_mut(&mut self, r_id: &str) -> Result<&mut HeaderPart> {
        let partname = self.hdr_ftr_partname(r_id)?.clone();
        self.opc
            .part_as_mut::<HeaderPart>(&partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("{} is not a header part", partname)))
    }

    pub fn footer_part(&self, r_id: &str) -> Result<&FooterPart> {
        let partname = self.hdr_ftr_partname(r_id)?;
        self.opc
            .part_as::<FooterPart>(partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("{} is not a footer part", partname)))
    }

    pub fn footer_part_mut(&mut self, r_id: &str) -> Result<&mut FooterPart> {
        let partname = self.hdr_ftr_partname(r_id)?.clone();
        self.opc
            .part_as_mut::<FooterPart>(&partname)
            .ok_or_else(|| OoxmlError::NotFound(format!("{} is not a footer part", partname)))
    }

    /// Drop the document part's relationship `r_id` to a header part, unless
    /// more than one section still references it.
    pub(crate) fn drop_header_part(&mut self, r_id: &str) -> Result<bool> {
        Ok(self.document_part_mut()?.drop_rel(r_id))
    }

    pub(crate) fn drop_footer_part(&mut self, r_id: &str) -> Result<bool> {
        Ok(self.document_part_mut()?.drop_rel(r_id))
    }

    /// rId of the header or footer of type `index` for section `section`,
    /// adding an empty part and the section reference when there is none.
    fn get_or_add_hdr_ftr(
        &mut self,
        kind: HdrFtrKind,
        section: usize,
        index: WdHeaderFooter,
    ) -> Result<String> {
        if let Some(r_id) = self.document_part()?.sect_pr(section)?.reference(kind, index)? {
            return Ok(r_id);
        }
        let (r_id, _) = self.add_hdr_ftr_part(kind)?;
        self.document_part_mut()?
            .sect_pr_mut(section)?
            .add_reference(kind, index, &r_id)?;
        Ok(r_id)
    }

    /// Header of type `index` for section `section`, added when missing.
    /// Returns the rId of its relationship from the document part.
    pub fn add_header(&mut self, section: usize, index: WdHeaderFooter) -> Result<String> {
        self.get_or_add_hdr_ftr(HdrFtrKind::Header, section, index)
    }

    pub fn add_footer(&mut self, section: usize, index: WdHeaderFooter) -> Result<String> {
        self.get_or_add_hdr_ftr(HdrFtrKind::Footer, section, index)
    }

    /// Remove the reference to a header or footer from a section, dropping
    /// the relationship when no other section uses the same part.
    fn remove_hdr_ftr(&mut self, kind: HdrFtrKind, section: usize, index: WdHeaderFooter) -> Result<bool> {
        let Some(r_id) = self.document_part()?.sect_pr(section)?.reference(kind, index)? else {
            return Ok(false);
        };
        // count references while this section's is still in the tree
        match kind {
            HdrFtrKind::Header => self.drop_header_part(&r_id)?,
            HdrFtrKind::Footer => self.drop_footer_part(&r_id)?,
        };
        self.document_part_mut()?
            .sect_pr_mut(section)?
            .remove_reference(kind, index)?;
        Ok(true)
    }

    /// Remove the header of type `index` from section `section`. Returns
    /// whether the section had one.
    pub fn remove_header(&mut self, section: usize, index: WdHeaderFooter) -> Result<bool> {
        self.remove_hdr_ftr(HdrFtrKind::Header, section, index)
    }

    pub fn remove_footer(&mut self, section: usize, index: WdHeaderFooter) -> Result<bool> {
        self.remove_hdr_ftr(HdrFtrKind::Footer, section, index)
    }
}

impl PackageModel for Package {
    /// Wrap a loaded OPC package, checking that it holds a Word document.
    fn from_opc(opc: OpcPackage) -> Result<Self> {
        let content_type = opc.main_document_part()?.content_type();
        if content_type != ct::WML_DOCUMENT_MAIN {
            return Err(OoxmlError::InvalidValue(format!(
                "main document part has content type '{}', expected '{}'",
                content_type,
                ct::WML_DOCUMENT_MAIN
            )));
        }
        Ok(Self {
            opc,
            image_parts: Vec::new(),
        })
    }

    /// Collect the image parts reachable through image relationships.
    fn after_unmarshal(&mut self) -> Result<()> {
        for (_, rel) in self.opc.iter_rels() {
            if rel.reltype() != rt::IMAGE {
                continue;
            }
            if let Some(target) = rel.target_partname()
                && !self.image_parts.contains(target)
                && self.opc.part_as::<ImagePart>(target).is_some()
            {
                self.image_parts.push(target.clone());
            }
        }
        debug!("package has {} image parts", self.image_parts.len());
        Ok(())
    }
}
