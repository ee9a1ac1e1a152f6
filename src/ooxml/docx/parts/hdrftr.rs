//! Header and footer parts.

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, XmlPart, delegate_part};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::section::{Ftr, Hdr};

macro_rules! hdr_ftr_part {
    ($(#[$meta:meta])* $part:ident, $view:ident, $accessor:ident, $accessor_mut:ident, $content_type:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $part {
            xml: XmlPart,
        }

        delegate_part!($part, xml);

        impl $part {
            /// A new part at `partname` holding one empty paragraph.
            pub fn new(partname: PackURI) -> Self {
                Self {
                    xml: XmlPart::new(partname, $content_type, $view::new_root().into_inner()),
                }
            }

            pub fn load(partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<Box<dyn Part>> {
                let xml = XmlPart::from_blob(partname, content_type, &blob)?;
                $view::new(xml.root())?;
                Ok(Box::new(Self { xml }))
            }

            pub fn $accessor(&self) -> $view<&Element> {
                $view::wrap(self.xml.root())
            }

            pub fn $accessor_mut(&mut self) -> $view<&mut Element> {
                $view::wrap(self.xml.root_mut())
            }
        }
    };
}

hdr_ftr_part!(
    /// A `/word/header%d.xml` part.
    HeaderPart,
    Hdr,
    hdr,
    hdr_mut,
    ct::WML_HEADER
);
hdr_ftr_part!(
    /// A `/word/footer%d.xml` part.
    FooterPart,
    Ftr,
    ftr,
    ftr_mut,
    ct::WML_FOOTER
);
