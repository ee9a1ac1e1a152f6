//! Mapping from qualified element names to element classes.
//!
//! Every element in a parsed or constructed tree is tagged with an
//! [`ElementClass`]. Typed views check the class before wrapping an element,
//! and the class decides what default content a freshly created element gets.
//! Names without a registered class are [`ElementClass::Generic`] and are
//! carried through untouched.

use phf::{Map, phf_map};

use crate::ooxml::oxml::element::{Element, QName};
use crate::ooxml::oxml::ns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementClass {
    Generic,

    // document
    Document,
    Body,

    // sections and headers/footers
    SectPr,
    SectType,
    PgSz,
    PgMar,
    TitlePg,
    HeaderReference,
    FooterReference,
    Hdr,
    Ftr,

    // paragraphs and runs
    P,
    PPr,
    PStyle,
    Jc,
    NumPr,
    Ilvl,
    NumId,
    R,
    RPr,
    RStyle,
    B,
    I,
    Strike,
    Sz,
    Color,
    U,
    T,
    Br,
    Cr,
    Tab,

    // tables
    Tbl,
    TblPr,
    TblStyle,
    TblW,
    TblLayout,
    TblGrid,
    GridCol,
    Tr,
    TrPr,
    TrHeight,
    GridBefore,
    GridAfter,
    Tc,
    TcPr,
    TcW,
    GridSpan,
    VMerge,
    VAlign,

    // styles
    Styles,
    Style,
    StyleName,
    BasedOn,
    Next,
    UiPriority,
    SemiHidden,
    UnhideWhenUsed,
    QFormat,
    DocDefaults,
    LatentStyles,

    // settings
    Settings,
    EvenAndOddHeaders,

    // numbering
    Numbering,
    AbstractNum,
    Num,
    AbstractNumId,
    LvlOverride,
    StartOverride,

    // core properties
    CoreProperties,
}

static ELEMENT_CLASSES: Map<&'static str, ElementClass> = phf_map! {
    "w:document" => ElementClass::Document,
    "w:body" => ElementClass::Body,

    "w:sectPr" => ElementClass::SectPr,
    "w:type" => ElementClass::SectType,
    "w:pgSz" => ElementClass::PgSz,
    "w:pgMar" => ElementClass::PgMar,
    "w:titlePg" => ElementClass::TitlePg,
    "w:headerReference" => ElementClass::HeaderReference,
    "w:footerReference" => ElementClass::FooterReference,
    "w:hdr" => ElementClass::Hdr,
    "w:ftr" => ElementClass::Ftr,

    "w:p" => ElementClass::P,
    "w:pPr" => ElementClass::PPr,
    "w:pStyle" => ElementClass::PStyle,
    "w:jc" => ElementClass::Jc,
    "w:numPr" => ElementClass::NumPr,
    "w:ilvl" => ElementClass::Ilvl,
    "w:numId" => ElementClass::NumId,
    "w:r" => ElementClass::R,
    "w:rPr" => ElementClass::RPr,
    "w:rStyle" => ElementClass::RStyle,
    "w:b" => ElementClass::B,
    "w:i" => ElementClass::I,
    "w:strike" => ElementClass::Strike,
    "w:sz" => ElementClass::Sz,
    "w:color" => ElementClass::Color,
    "w:u" => ElementClass::U,
    "w:t" => ElementClass::T,
    "w:br" => ElementClass::Br,
    "w:cr" => ElementClass::Cr,
    "w:tab" => ElementClass::Tab,

    "w:tbl" => ElementClass::Tbl,
    "w:tblPr" => ElementClass::TblPr,
    "w:tblStyle" => ElementClass::TblStyle,
    "w:tblW" => ElementClass::TblW,
    "w:tblLayout" => ElementClass::TblLayout,
    "w:tblGrid" => ElementClass::TblGrid,
    "w:gridCol" => ElementClass::GridCol,
    "w:tr" => ElementClass::Tr,
    "w:trPr" => ElementClass::TrPr,
    "w:trHeight" => ElementClass::TrHeight,
    "w:gridBefore" => ElementClass::GridBefore,
    "w:gridAfter" => ElementClass::GridAfter,
    "w:tc" => ElementClass::Tc,
    "w:tcPr" => ElementClass::TcPr,
    "w:tcW" => ElementClass::TcW,
    "w:gridSpan" => ElementClass::GridSpan,
    "w:vMerge" => ElementClass::VMerge,
    "w:vAlign" => ElementClass::VAlign,

    "w:styles" => ElementClass::Styles,
    "w:style" => ElementClass::Style,
    "w:name" => ElementClass::StyleName,
    "w:basedOn" => ElementClass::BasedOn,
    "w:next" => ElementClass::Next,
    "w:uiPriority" => ElementClass::UiPriority,
    "w:semiHidden" => ElementClass::SemiHidden,
    "w:unhideWhenUsed" => ElementClass::UnhideWhenUsed,
    "w:qFormat" => ElementClass::QFormat,
    "w:docDefaults" => ElementClass::DocDefaults,
    "w:latentStyles" => ElementClass::LatentStyles,

    "w:settings" => ElementClass::Settings,
    "w:evenAndOddHeaders" => ElementClass::EvenAndOddHeaders,

    "w:numbering" => ElementClass::Numbering,
    "w:abstractNum" => ElementClass::AbstractNum,
    "w:num" => ElementClass::Num,
    "w:abstractNumId" => ElementClass::AbstractNumId,
    "w:lvlOverride" => ElementClass::LvlOverride,
    "w:startOverride" => ElementClass::StartOverride,

    "cp:coreProperties" => ElementClass::CoreProperties,
};

impl ElementClass {
    /// Class registered for `name`, [`ElementClass::Generic`] when there is none.
    pub fn for_name(name: &QName) -> ElementClass {
        let Some(prefix) = name.namespace().and_then(ns::prefix_for) else {
            return ElementClass::Generic;
        };
        let mut key = String::with_capacity(prefix.len() + 1 + name.local_name().len());
        key.push_str(prefix);
        key.push(':');
        key.push_str(name.local_name());
        ELEMENT_CLASSES
            .get(key.as_str())
            .copied()
            .unwrap_or(ElementClass::Generic)
    }

    /// Class registered for a prefixed name such as `w:tc`.
    pub fn for_tag(tag: &str) -> ElementClass {
        ELEMENT_CLASSES
            .get(tag)
            .copied()
            .unwrap_or(ElementClass::Generic)
    }

    /// Add the content a new element of this class must have to be valid.
    pub(crate) fn populate(self, element: &mut Element) {
        if self == ElementClass::Tc {
            // a cell always holds at least one paragraph
            element.append(Element::new("w:p"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_namespace_not_prefix() {
        let name = QName::new(
            Some(ns::W.into()),
            Some("wx".to_string()),
            "tc",
        );
        assert_eq!(ElementClass::for_name(&name), ElementClass::Tc);
        assert_eq!(
            ElementClass::for_name(&QName::from_prefixed("a:p")),
            ElementClass::Generic
        );
        assert_eq!(
            ElementClass::for_name(&QName::from_prefixed("tc")),
            ElementClass::Generic
        );
    }

    #[test]
    fn test_every_registered_tag_round_trips() {
        for (tag, class) in ELEMENT_CLASSES.entries() {
            assert_eq!(Element::new(tag).class(), *class, "{}", tag);
            assert_eq!(ElementClass::for_tag(tag), *class);
        }
    }

    #[test]
    fn test_populate() {
        let tc = Element::new("w:tc");
        assert_eq!(tc.children().len(), 1);
        assert!(tc.children()[0].is("w:p"));
        assert!(Element::new("w:tr").children().is_empty());
    }
}
