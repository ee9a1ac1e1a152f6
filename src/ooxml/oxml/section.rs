//! Section properties (`w:sectPr`) and header/footer roots (`w:hdr`, `w:ftr`).

use std::borrow::{Borrow, BorrowMut};

use log::debug;

use crate::ooxml::docx::enums::{WdHeaderFooter, WdOrientation, WdSectionStart};
use crate::ooxml::error::Result;
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::simpletypes::{
    Enum, StOnOff, StRelationshipId, StSignedTwipsMeasure, StTwipsMeasure,
};
use crate::ooxml::oxml::xmlchemy::{
    OptionalAttribute, RequiredAttribute, ZeroOrMore, ZeroOrOne, element_view, successors_of,
};
use crate::ooxml::shared::Length;

const SECT_PR_SEQ: &[&str] = &[
    "w:footnotePr",
    "w:endnotePr",
    "w:type",
    "w:pgSz",
    "w:pgMar",
    "w:paperSrc",
    "w:pgBorders",
    "w:lnNumType",
    "w:pgNumType",
    "w:cols",
    "w:formProt",
    "w:vAlign",
    "w:noEndnote",
    "w:titlePg",
    "w:textDirection",
    "w:bidi",
    "w:rtlGutter",
    "w:docGrid",
    "w:printerSettings",
    "w:sectPrChange",
];

// header and footer references come before everything else
const HEADER_REFERENCE: ZeroOrMore = ZeroOrMore::new("w:headerReference", SECT_PR_SEQ);
const FOOTER_REFERENCE: ZeroOrMore = ZeroOrMore::new("w:footerReference", SECT_PR_SEQ);
const SECT_TYPE: ZeroOrOne = ZeroOrOne::new("w:type", successors_of(SECT_PR_SEQ, "w:type"));
const PG_SZ: ZeroOrOne = ZeroOrOne::new("w:pgSz", successors_of(SECT_PR_SEQ, "w:pgSz"));
const PG_MAR: ZeroOrOne = ZeroOrOne::new("w:pgMar", successors_of(SECT_PR_SEQ, "w:pgMar"));
const TITLE_PG: ZeroOrOne = ZeroOrOne::new("w:titlePg", successors_of(SECT_PR_SEQ, "w:titlePg"));

const HDR_FTR_P: ZeroOrMore = ZeroOrMore::new("w:p", &[]);
const HDR_FTR_TBL: ZeroOrMore = ZeroOrMore::new("w:tbl", &[]);

const REF_TYPE: RequiredAttribute<Enum<WdHeaderFooter>> = RequiredAttribute::new("w:type");
const REF_ID: RequiredAttribute<StRelationshipId> = RequiredAttribute::new("r:id");
const SECT_TYPE_VAL: OptionalAttribute<Enum<WdSectionStart>> = OptionalAttribute::new("w:val");
const PAGE_WIDTH: OptionalAttribute<StTwipsMeasure> = OptionalAttribute::new("w:w");
const PAGE_HEIGHT: OptionalAttribute<StTwipsMeasure> = OptionalAttribute::new("w:h");
const ORIENT: OptionalAttribute<Enum<WdOrientation>> =
    OptionalAttribute::with_default("w:orient", WdOrientation::Portrait);
const ON_OFF_VAL: OptionalAttribute<StOnOff> = OptionalAttribute::with_default("w:val", true);

/// The page margins of `w:pgMar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Margin {
    Top,
    Bottom,
    Left,
    Right,
    Header,
    Footer,
    Gutter,
}

impl Margin {
    pub const ALL: [Margin; 7] = [
        Margin::Top,
        Margin::Bottom,
        Margin::Left,
        Margin::Right,
        Margin::Header,
        Margin::Footer,
        Margin::Gutter,
    ];

    fn attr(self) -> &'static str {
        match self {
            Margin::Top => "w:top",
            Margin::Bottom => "w:bottom",
            Margin::Left => "w:left",
            Margin::Right => "w:right",
            Margin::Header => "w:header",
            Margin::Footer => "w:footer",
            Margin::Gutter => "w:gutter",
        }
    }

    /// Top and bottom may be negative: the text then ignores header or footer extent.
    fn is_signed(self) -> bool {
        matches!(self, Margin::Top | Margin::Bottom)
    }
}

element_view!(
    /// `<w:sectPr>`, the page setup and header/footer references of one section.
    SectPr,
    ElementClass::SectPr,
    "w:sectPr"
);
element_view!(
    /// `<w:hdr>`, root of a header part.
    Hdr,
    ElementClass::Hdr,
    "w:hdr"
);
element_view!(
    /// `<w:ftr>`, root of a footer part.
    Ftr,
    ElementClass::Ftr,
    "w:ftr"
);

/// Which reference list a header/footer operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdrFtrKind {
    Header,
    Footer,
}

impl HdrFtrKind {
    fn references(self) -> &'static ZeroOrMore {
        match self {
            HdrFtrKind::Header => &HEADER_REFERENCE,
            HdrFtrKind::Footer => &FOOTER_REFERENCE,
        }
    }

    fn reference_tag(self) -> &'static str {
        match self {
            HdrFtrKind::Header => "w:headerReference",
            HdrFtrKind::Footer => "w:footerReference",
        }
    }
}

impl<E: Borrow<Element>> SectPr<E> {
    pub fn page_width(&self) -> Result<Option<Length>> {
        PG_SZ.get(self.element()).map_or(Ok(None), |el| PAGE_WIDTH.get(el))
    }

    pub fn page_height(&self) -> Result<Option<Length>> {
        PG_SZ.get(self.element()).map_or(Ok(None), |el| PAGE_HEIGHT.get(el))
    }

    /// Portrait unless `w:pgSz` says otherwise.
    pub fn orientation(&self) -> Result<WdOrientation> {
        match PG_SZ.get(self.element()) {
            Some(el) => Ok(ORIENT.get(el)?.unwrap_or_default()),
            None => Ok(WdOrientation::Portrait),
        }
    }

    pub fn margin(&self, margin: Margin) -> Result<Option<Length>> {
        let Some(pg_mar) = PG_MAR.get(self.element()) else {
            return Ok(None);
        };
        if margin.is_signed() {
            OptionalAttribute::<StSignedTwipsMeasure>::new(margin.attr()).get(pg_mar)
        } else {
            OptionalAttribute::<StTwipsMeasure>::new(margin.attr()).get(pg_mar)
        }
    }

    /// New page unless a `w:type` says otherwise.
    pub fn start_type(&self) -> Result<WdSectionStart> {
        match SECT_TYPE.get(self.element()) {
            Some(el) => Ok(SECT_TYPE_VAL.get(el)?.unwrap_or_default()),
            None => Ok(WdSectionStart::NewPage),
        }
    }

    /// True when the first page has its own header and footer.
    pub fn title_pg(&self) -> Result<bool> {
        match TITLE_PG.get(self.element()) {
            Some(el) => Ok(ON_OFF_VAL.get(el)?.unwrap_or(true)),
            None => Ok(false),
        }
    }

    /// Relationship id of the header or footer reference of type `index`.
    pub fn reference(&self, kind: HdrFtrKind, index: WdHeaderFooter) -> Result<Option<String>> {
        for el in kind.references().all(self.element()) {
            if REF_TYPE.get(el)? == index {
                return REF_ID.get(el).map(Some);
            }
        }
        Ok(None)
    }

    /// Every relationship id referenced by this section's headers and footers.
    pub fn reference_ids(&self) -> Result<Vec<String>> {
        HEADER_REFERENCE
            .all(self.element())
            .chain(FOOTER_REFERENCE.all(self.element()))
            .map(|el| REF_ID.get(el))
            .collect()
    }
}

impl<E: BorrowMut<Element>> SectPr<E> {
    pub fn set_page_width(&mut self, width: Option<Length>) -> Result<()> {
        let pg_sz = PG_SZ.get_or_add(self.element_mut());
        PAGE_WIDTH.set(pg_sz, width.as_ref())
    }

    pub fn set_page_height(&mut self, height: Option<Length>) -> Result<()> {
        let pg_sz = PG_SZ.get_or_add(self.element_mut());
        PAGE_HEIGHT.set(pg_sz, height.as_ref())
    }

    pub fn set_orientation(&mut self, orientation: Option<WdOrientation>) -> Result<()> {
        let pg_sz = PG_SZ.get_or_add(self.element_mut());
        ORIENT.set(pg_sz, orientation.as_ref())
    }

    pub fn set_margin(&mut self, margin: Margin, value: Option<Length>) -> Result<()> {
        let pg_mar = PG_MAR.get_or_add(self.element_mut());
        if margin.is_signed() {
            OptionalAttribute::<StSignedTwipsMeasure>::new(margin.attr()).set(pg_mar, value.as_ref())
        } else {
            OptionalAttribute::<StTwipsMeasure>::new(margin.attr()).set(pg_mar, value.as_ref())
        }
    }

    /// Set how the section starts; `NewPage` is the default and removes `w:type`.
    pub fn set_start_type(&mut self, start: Option<WdSectionStart>) -> Result<()> {
        let sect_pr = self.element_mut();
        match start {
            None | Some(WdSectionStart::NewPage) => {
                SECT_TYPE.remove(sect_pr);
                Ok(())
            },
            Some(start) => SECT_TYPE_VAL.set(SECT_TYPE.get_or_add(sect_pr), Some(&start)),
        }
    }

    pub fn set_title_pg(&mut self, value: bool) -> Result<()> {
        let sect_pr = self.element_mut();
        TITLE_PG.remove(sect_pr);
        if value {
            TITLE_PG.add(sect_pr);
        }
        Ok(())
    }

    /// Add a reference of type `index` pointing at relationship `r_id`.
    pub fn add_reference(
        &mut self,
        kind: HdrFtrKind,
        index: WdHeaderFooter,
        r_id: &str,
    ) -> Result<&mut Element> {
        debug!("add {:?} reference {} -> {}", kind, index, r_id);
        let el = kind.references().add(self.element_mut());
        REF_TYPE.set(el, &index)?;
        REF_ID.set(el, &r_id.to_string())?;
        Ok(el)
    }

    /// Remove the reference of type `index`, returning its relationship id.
    pub fn remove_reference(
        &mut self,
        kind: HdrFtrKind,
        index: WdHeaderFooter,
    ) -> Result<Option<String>> {
        let sect_pr = self.element_mut();
        let mut found = None;
        for (pos, el) in sect_pr.children().iter().enumerate() {
            if el.is(kind.reference_tag()) && REF_TYPE.get(el)? == index {
                found = Some((pos, REF_ID.get(el)?));
                break;
            }
        }
        let Some((pos, r_id)) = found else {
            return Ok(None);
        };
        sect_pr.remove(pos);
        Ok(Some(r_id))
    }
}

macro_rules! hdr_ftr_impl {
    ($view:ident, $tag:literal) => {
        impl $view<Element> {
            /// An empty root with the namespace declarations a part needs and
            /// a single empty paragraph.
            pub fn new_root() -> Self {
                let mut root = Element::with_nsdecls($tag, &["w", "r"]);
                root.append(Element::new("w:p"));
                Self::wrap(root)
            }
        }

        impl<E: Borrow<Element>> $view<E> {
            pub fn paragraphs(&self) -> impl Iterator<Item = &Element> {
                HDR_FTR_P.all(self.element())
            }

            pub fn tables(&self) -> impl Iterator<Item = &Element> {
                HDR_FTR_TBL.all(self.element())
            }
        }

        impl<E: BorrowMut<Element>> $view<E> {
            pub fn add_p(&mut self) -> &mut Element {
                HDR_FTR_P.add(self.element_mut())
            }
        }
    };
}

hdr_ftr_impl!(Hdr, "w:hdr");
hdr_ftr_impl!(Ftr, "w:ftr");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::oxml::ns;
    use crate::ooxml::oxml::parser::parse_xml;

    fn tags(el: &Element) -> Vec<String> {
        el.children().iter().map(Element::tag).collect()
    }

    #[test]
    fn test_page_setup() {
        let mut sect = SectPr::create();
        sect.set_margin(Margin::Gutter, Some(Length::ZERO)).unwrap();
        sect.set_page_width(Some(Length::from_inches(8.5))).unwrap();
        sect.set_page_height(Some(Length::from_inches(11.0))).unwrap();
        sect.set_orientation(Some(WdOrientation::Landscape)).unwrap();
        sect.set_margin(Margin::Top, Some(Length::from_twips(-720))).unwrap();
        sect.set_start_type(Some(WdSectionStart::OddPage)).unwrap();

        assert_eq!(tags(sect.element()), ["w:type", "w:pgSz", "w:pgMar"]);
        assert_eq!(sect.page_width().unwrap(), Some(Length::from_twips(12240)));
        assert_eq!(sect.orientation().unwrap(), WdOrientation::Landscape);
        assert_eq!(sect.margin(Margin::Top).unwrap(), Some(Length::from_twips(-720)));
        assert_eq!(sect.margin(Margin::Gutter).unwrap(), Some(Length::ZERO));
        assert_eq!(sect.margin(Margin::Left).unwrap(), None);
        assert_eq!(sect.start_type().unwrap(), WdSectionStart::OddPage);

        assert!(sect.set_margin(Margin::Left, Some(Length::from_twips(-1))).is_err());

        sect.set_orientation(Some(WdOrientation::Portrait)).unwrap();
        assert_eq!(sect.element().first_child("w:pgSz").unwrap().attr("w:orient"), None);
        sect.set_start_type(Some(WdSectionStart::NewPage)).unwrap();
        assert!(sect.element().first_child("w:type").is_none());
    }

    #[test]
    fn test_defaults_on_bare_section() {
        let sect = SectPr::create();
        assert_eq!(sect.orientation().unwrap(), WdOrientation::Portrait);
        assert_eq!(sect.start_type().unwrap(), WdSectionStart::NewPage);
        assert!(!sect.title_pg().unwrap());
        assert_eq!(sect.page_width().unwrap(), None);
    }

    #[test]
    fn test_references_precede_page_setup() {
        let mut sect = SectPr::create();
        sect.set_page_width(Some(Length::from_inches(8.5))).unwrap();
        sect.set_title_pg(true).unwrap();
        sect.add_reference(HdrFtrKind::Footer, WdHeaderFooter::Primary, "rId9")
            .unwrap();
        sect.add_reference(HdrFtrKind::Header, WdHeaderFooter::FirstPage, "rId8")
            .unwrap();
        assert_eq!(
            tags(sect.element()),
            ["w:footerReference", "w:headerReference", "w:pgSz", "w:titlePg"]
        );
        assert!(sect.title_pg().unwrap());

        assert_eq!(
            sect.reference(HdrFtrKind::Header, WdHeaderFooter::FirstPage)
                .unwrap()
                .as_deref(),
            Some("rId8")
        );
        assert_eq!(
            sect.reference(HdrFtrKind::Header, WdHeaderFooter::Primary).unwrap(),
            None
        );
        assert_eq!(sect.reference_ids().unwrap(), ["rId8", "rId9"]);

        let removed = sect
            .remove_reference(HdrFtrKind::Header, WdHeaderFooter::FirstPage)
            .unwrap();
        assert_eq!(removed.as_deref(), Some("rId8"));
        assert_eq!(
            sect.remove_reference(HdrFtrKind::Header, WdHeaderFooter::FirstPage)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_reference_without_id_is_invalid() {
        let xml = format!(
            r#"<w:sectPr {}><w:headerReference w:type="default"/></w:sectPr>"#,
            ns::nsdecls(&["w", "r"])
        );
        let el = parse_xml(xml.as_bytes()).unwrap();
        let sect = SectPr::new(&el).unwrap();
        assert!(sect.reference(HdrFtrKind::Header, WdHeaderFooter::Primary).is_err());
    }

    #[test]
    fn test_new_header_root() {
        let mut hdr = Hdr::new_root();
        assert_eq!(hdr.paragraphs().count(), 1);
        hdr.add_p();
        assert_eq!(hdr.paragraphs().count(), 2);
        assert_eq!(hdr.tables().count(), 0);
        assert!(Ftr::new_root().element().is("w:ftr"));
    }
}
