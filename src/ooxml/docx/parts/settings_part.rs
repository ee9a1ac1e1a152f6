//! The document settings part, `/word/settings.xml`.

use crate::ooxml::docx::template::default_settings_xml;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, XmlPart, delegate_part};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::settings::Settings;

pub const SETTINGS_PARTNAME: &str = "/word/settings.xml";

#[derive(Debug, Clone)]
pub struct SettingsPart {
    xml: XmlPart,
}

delegate_part!(SettingsPart, xml);

impl SettingsPart {
    /// Settings Word writes for a blank document.
    pub fn default_part() -> Result<Self> {
        let partname = PackURI::new(SETTINGS_PARTNAME)?;
        let xml = XmlPart::from_blob(partname, ct::WML_SETTINGS, default_settings_xml())?;
        Ok(Self { xml })
    }

    pub fn load(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        let xml = XmlPart::from_blob(partname, content_type, &blob)?;
        Settings::new(xml.root())?;
        Ok(Box::new(Self { xml }))
    }

    pub fn settings(&self) -> Settings<&Element> {
        Settings::wrap(self.xml.root())
    }

    pub fn settings_mut(&mut self) -> Settings<&mut Element> {
        Settings::wrap(self.xml.root_mut())
    }
}
