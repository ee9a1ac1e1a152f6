//! The core properties part, `/docProps/core.xml`.

use chrono::Utc;

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, XmlPart, delegate_part};
use crate::ooxml::oxml::coreprops::CoreProperties;
use crate::ooxml::oxml::element::Element;

pub const CORE_PROPERTIES_PARTNAME: &str = "/docProps/core.xml";

#[derive(Debug, Clone)]
pub struct CorePropertiesPart {
    xml: XmlPart,
}

delegate_part!(CorePropertiesPart, xml);

impl CorePropertiesPart {
    /// Properties for a package that has none: a placeholder title, this
    /// library as last editor, revision 1 and the current time as modified.
    pub fn default_part() -> Result<Self> {
        let partname = PackURI::new(CORE_PROPERTIES_PARTNAME)?;
        let mut props = CoreProperties::new_root();
        props.set_title("Word Document")?;
        props.set_last_modified_by("docx-opc")?;
        props.set_revision(1)?;
        props.set_modified(Utc::now());
        Ok(Self {
            xml: XmlPart::new(partname, ct::OPC_CORE_PROPERTIES, props.into_inner()),
        })
    }

    pub fn load(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        let xml = XmlPart::from_blob(partname, content_type, &blob)?;
        CoreProperties::new(xml.root())?;
        Ok(Box::new(Self { xml }))
    }

    pub fn core_properties(&self) -> CoreProperties<&Element> {
        CoreProperties::wrap(self.xml.root())
    }

    pub fn core_properties_mut(&mut self) -> CoreProperties<&mut Element> {
        CoreProperties::wrap(self.xml.root_mut())
    }
}
