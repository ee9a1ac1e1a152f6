//! `w:document` and `w:body`, the root of the main document part.

use std::borrow::{Borrow, BorrowMut};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::section::{Margin, SectPr};
use crate::ooxml::oxml::table::Tbl;
use crate::ooxml::oxml::text::P;
use crate::ooxml::oxml::xmlchemy::{ZeroOrMore, ZeroOrOne, element_view};
use crate::ooxml::shared::Length;

const BODY: ZeroOrOne = ZeroOrOne::new("w:body", &[]);
const BODY_P: ZeroOrMore = ZeroOrMore::new("w:p", &["w:sectPr"]);
const BODY_TBL: ZeroOrMore = ZeroOrMore::new("w:tbl", &["w:sectPr"]);
const BODY_SECT_PR: ZeroOrOne = ZeroOrOne::new("w:sectPr", &[]);

fn paragraph_sect_pr(p: &Element) -> Option<&Element> {
    p.first_child("w:pPr")?.first_child("w:sectPr")
}

fn carries_sect_pr(el: &Element) -> bool {
    el.is("w:p") && paragraph_sect_pr(el).is_some()
}

element_view!(
    /// `<w:document>`, root element of the main document part.
    Document,
    ElementClass::Document,
    "w:document"
);
element_view!(
    /// `<w:body>`, the block content of the document followed by the
    /// properties of its last section.
    Body,
    ElementClass::Body,
    "w:body"
);

impl Document<Element> {
    /// A document holding one empty paragraph and a US Letter section with
    /// one inch margins.
    pub fn new_document() -> Result<Self> {
        let mut root = Element::with_nsdecls("w:document", &["w", "r"]);
        let body = root.append(Element::new("w:body"));
        body.append(Element::new("w:p"));

        let mut sect = SectPr::wrap(body.append(Element::new("w:sectPr")));
        sect.set_page_width(Some(Length::from_twips(12240)))?;
        sect.set_page_height(Some(Length::from_twips(15840)))?;
        for (margin, twips) in [
            (Margin::Top, 1440),
            (Margin::Right, 1440),
            (Margin::Bottom, 1440),
            (Margin::Left, 1440),
            (Margin::Header, 720),
            (Margin::Footer, 720),
            (Margin::Gutter, 0),
        ] {
            sect.set_margin(margin, Some(Length::from_twips(twips)))?;
        }
        Ok(Self::wrap(root))
    }
}

impl<E: Borrow<Element>> Document<E> {
    pub fn body(&self) -> Result<Body<&Element>> {
        Document::wrap(self.element()).into_body()
    }
}

impl<'a> Document<&'a Element> {
    pub fn into_body(self) -> Result<Body<&'a Element>> {
        BODY.get(self.into_inner())
            .map(Body::wrap)
            .ok_or_else(|| OoxmlError::InvalidXml("document has no <w:body>".into()))
    }
}

impl<E: BorrowMut<Element>> Document<E> {
    pub fn body_mut(&mut self) -> Body<&mut Element> {
        Body::wrap(BODY.get_or_add(self.element_mut()))
    }
}

impl<'a> Document<&'a mut Element> {
    /// The body, created when the document has none.
    pub fn into_body_mut(self) -> Body<&'a mut Element> {
        Body::wrap(BODY.get_or_add(self.into_inner()))
    }
}

impl<E: Borrow<Element>> Body<E> {
    pub fn paragraphs(&self) -> impl Iterator<Item = P<&Element>> {
        BODY_P.all(self.element()).map(P::wrap)
    }

    pub fn tables(&self) -> impl Iterator<Item = Tbl<&Element>> {
        BODY_TBL.all(self.element()).map(Tbl::wrap)
    }

    /// Paragraphs and tables in document order.
    pub fn inner_content(&self) -> impl Iterator<Item = &Element> {
        self.element()
            .children()
            .iter()
            .filter(|c| c.is("w:p") || c.is("w:tbl"))
    }

    /// The body-level `w:sectPr`, properties of the last section.
    pub fn sect_pr(&self) -> Option<SectPr<&Element>> {
        BODY_SECT_PR.get(self.element()).map(SectPr::wrap)
    }

    /// Section properties of every section in document order: those carried
    /// by paragraphs, then the body-level one.
    pub fn sect_prs(&self) -> Vec<SectPr<&Element>> {
        Body::wrap(self.element()).into_sect_prs()
    }
}

impl<'a> Body<&'a Element> {
    /// Like [`Body::sect_prs`], borrowing from the underlying element rather
    /// than from the view.
    pub fn into_sect_prs(self) -> Vec<SectPr<&'a Element>> {
        let body = self.into_inner();
        let mut out: Vec<SectPr<&'a Element>> = BODY_P
            .all(body)
            .filter_map(paragraph_sect_pr)
            .map(SectPr::wrap)
            .collect();
        out.extend(BODY_SECT_PR.get(body).map(SectPr::wrap));
        out
    }
}

impl<E: BorrowMut<Element>> Body<E> {
    /// Add an empty paragraph after the existing content, before the
    /// body-level section properties.
    pub fn add_p(&mut self) -> P<&mut Element> {
        P::wrap(BODY_P.add(self.element_mut()))
    }

    pub fn add_tbl(&mut self, rows: usize, cols: usize, width: Length) -> Tbl<&mut Element> {
        let tbl = Tbl::new_tbl(rows, cols, width).into_inner();
        Tbl::wrap(BODY_TBL.insert(self.element_mut(), tbl))
    }

    pub fn get_or_add_sect_pr(&mut self) -> SectPr<&mut Element> {
        SectPr::wrap(BODY_SECT_PR.get_or_add(self.element_mut()))
    }

    /// Section properties of the `n`-th section, counting as [`Body::sect_prs`] does.
    pub fn sect_pr_mut(&mut self, n: usize) -> Option<SectPr<&mut Element>> {
        Body::wrap(self.element_mut()).into_sect_pr(n)
    }

    /// Remove all content except the body-level section properties.
    pub fn clear_content(&mut self) {
        self.element_mut()
            .children_mut()
            .retain(|c| c.is("w:sectPr"));
    }

    /// End the current last section with a new paragraph carrying a copy of
    /// its properties, and return the properties of the new last section.
    ///
    /// The new section starts without header or footer references, so it
    /// inherits those of the section before it.
    pub fn add_section_break(&mut self) -> SectPr<&mut Element> {
        let sentinel = self.get_or_add_sect_pr().element().clone();
        let mut p = self.add_p();
        p.get_or_add_p_pr().set_sect_pr(sentinel);

        let sect_pr = BODY_SECT_PR.get_or_add(self.element_mut());
        sect_pr.remove_children_named(&["w:headerReference", "w:footerReference"]);
        SectPr::wrap(sect_pr)
    }
}

impl<'a> Body<&'a mut Element> {
    /// Like [`Body::sect_pr_mut`], borrowing from the underlying element.
    pub fn into_sect_pr(self, n: usize) -> Option<SectPr<&'a mut Element>> {
        let body = self.into_inner();
        let in_paragraphs = body.children().iter().filter(|c| carries_sect_pr(c)).count();
        if n < in_paragraphs {
            let p = body
                .children_mut()
                .iter_mut()
                .filter(|c| carries_sect_pr(c))
                .nth(n)?;
            return p
                .first_child_mut("w:pPr")?
                .first_child_mut("w:sectPr")
                .map(SectPr::wrap);
        }
        if n == in_paragraphs {
            return BODY_SECT_PR.get_mut(body).map(SectPr::wrap);
        }
        None
    }
}
