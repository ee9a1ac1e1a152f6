//! Paragraph and run elements: `w:p`, `w:pPr`, `w:r`, `w:rPr` and run content.

use std::borrow::{Borrow, BorrowMut};

use crate::ooxml::docx::enums::{WdBreakType, WdParagraphAlignment};
use crate::ooxml::error::Result;
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::simpletypes::{
    Enum, StDecimalNumber, StHexColor, StHpsMeasure, StOnOff, StString, XsdString,
};
use crate::ooxml::oxml::xmlchemy::{
    OptionalAttribute, RequiredAttribute, ZeroOrMore, ZeroOrOne, element_view, successors_of,
};
use crate::ooxml::shared::{ColorValue, Length};

const P_PR_SEQ: &[&str] = &[
    "w:pStyle",
    "w:keepNext",
    "w:keepLines",
    "w:pageBreakBefore",
    "w:framePr",
    "w:widowControl",
    "w:numPr",
    "w:suppressLineNumbers",
    "w:pBdr",
    "w:shd",
    "w:tabs",
    "w:suppressAutoHyphens",
    "w:kinsoku",
    "w:wordWrap",
    "w:overflowPunct",
    "w:topLinePunct",
    "w:autoSpaceDE",
    "w:autoSpaceDN",
    "w:bidi",
    "w:adjustRightInd",
    "w:snapToGrid",
    "w:spacing",
    "w:ind",
    "w:contextualSpacing",
    "w:mirrorIndents",
    "w:suppressOverlap",
    "w:jc",
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

const R_PR_SEQ: &[&str] = &[
    "w:rStyle",
    "w:rFonts",
    "w:b",
    "w:bCs",
    "w:i",
    "w:iCs",
    "w:caps",
    "w:smallCaps",
    "w:strike",
    "w:dstrike",
    "w:outline",
    "w:shadow",
    "w:emboss",
    "w:imprint",
    "w:noProof",
    "w:snapToGrid",
    "w:vanish",
    "w:webHidden",
    "w:color",
    "w:spacing",
    "w:w",
    "w:kern",
    "w:position",
    "w:sz",
    "w:szCs",
    "w:highlight",
    "w:u",
    "w:effect",
    "w:bdr",
    "w:shd",
    "w:fitText",
    "w:vertAlign",
    "w:rtl",
    "w:cs",
    "w:em",
    "w:lang",
    "w:eastAsianLayout",
    "w:specVanish",
    "w:oMath",
];

/// Everything a paragraph may contain after its properties.
const P_CONTENT: &[&str] = &[
    "w:r",
    "w:hyperlink",
    "w:ins",
    "w:del",
    "w:fldSimple",
    "w:smartTag",
    "w:sdt",
    "w:customXml",
    "w:bookmarkStart",
    "w:bookmarkEnd",
    "w:commentRangeStart",
    "w:commentRangeEnd",
    "m:oMath",
    "m:oMathPara",
];

/// Everything a run may contain after its properties.
const R_CONTENT: &[&str] = &[
    "w:t",
    "w:br",
    "w:cr",
    "w:tab",
    "w:ptab",
    "w:noBreakHyphen",
    "w:drawing",
    "w:fldChar",
    "w:instrText",
    "w:sym",
    "w:lastRenderedPageBreak",
];

// w:p
const P_PR: ZeroOrOne = ZeroOrOne::new("w:pPr", P_CONTENT);
const P_R: ZeroOrMore = ZeroOrMore::new("w:r", &[]);

// w:pPr
const P_STYLE: ZeroOrOne = ZeroOrOne::new("w:pStyle", successors_of(P_PR_SEQ, "w:pStyle"));
const NUM_PR: ZeroOrOne = ZeroOrOne::new("w:numPr", successors_of(P_PR_SEQ, "w:numPr"));
const P_JC: ZeroOrOne = ZeroOrOne::new("w:jc", successors_of(P_PR_SEQ, "w:jc"));
const P_SECT_PR: ZeroOrOne = ZeroOrOne::new("w:sectPr", successors_of(P_PR_SEQ, "w:sectPr"));

// w:numPr
const ILVL: ZeroOrOne = ZeroOrOne::new("w:ilvl", &["w:numId", "w:numberingChange", "w:ins"]);
const NUM_ID: ZeroOrOne = ZeroOrOne::new("w:numId", &["w:numberingChange", "w:ins"]);

// w:r
const R_PR: ZeroOrOne = ZeroOrOne::new("w:rPr", R_CONTENT);

// w:rPr
const R_STYLE: ZeroOrOne = ZeroOrOne::new("w:rStyle", successors_of(R_PR_SEQ, "w:rStyle"));
const BOLD: ZeroOrOne = ZeroOrOne::new("w:b", successors_of(R_PR_SEQ, "w:b"));
const ITALIC: ZeroOrOne = ZeroOrOne::new("w:i", successors_of(R_PR_SEQ, "w:i"));
const STRIKE: ZeroOrOne = ZeroOrOne::new("w:strike", successors_of(R_PR_SEQ, "w:strike"));
const COLOR: ZeroOrOne = ZeroOrOne::new("w:color", successors_of(R_PR_SEQ, "w:color"));
const SZ: ZeroOrOne = ZeroOrOne::new("w:sz", successors_of(R_PR_SEQ, "w:sz"));
const UNDERLINE: ZeroOrOne = ZeroOrOne::new("w:u", successors_of(R_PR_SEQ, "w:u"));

// attributes
const STRING_VAL: RequiredAttribute<StString> = RequiredAttribute::new("w:val");
const NUMBER_VAL: RequiredAttribute<StDecimalNumber> = RequiredAttribute::new("w:val");
const ON_OFF_VAL: OptionalAttribute<StOnOff> = OptionalAttribute::with_default("w:val", true);
const P_JC_VAL: RequiredAttribute<Enum<WdParagraphAlignment>> = RequiredAttribute::new("w:val");
const COLOR_VAL: RequiredAttribute<StHexColor> = RequiredAttribute::new("w:val");
const SZ_VAL: RequiredAttribute<StHpsMeasure> = RequiredAttribute::new("w:val");
const UNDERLINE_VAL: OptionalAttribute<XsdString> = OptionalAttribute::new("w:val");
const BR_TYPE: OptionalAttribute<Enum<WdBreakType>> =
    OptionalAttribute::with_default("w:type", WdBreakType::TextWrapping);

element_view!(
    /// `<w:p>`, a paragraph.
    P,
    ElementClass::P,
    "w:p"
);
element_view!(PPr, ElementClass::PPr, "w:pPr");
element_view!(NumPr, ElementClass::NumPr, "w:numPr");
element_view!(
    /// `<w:r>`, a run of text sharing one set of character properties.
    R,
    ElementClass::R,
    "w:r"
);
element_view!(RPr, ElementClass::RPr, "w:rPr");

impl<E: Borrow<Element>> P<E> {
    pub fn p_pr(&self) -> Option<PPr<&Element>> {
        P_PR.get(self.element()).map(PPr::wrap)
    }

    pub fn runs(&self) -> impl Iterator<Item = R<&Element>> {
        P_R.all(self.element()).map(R::wrap)
    }

    /// Paragraph style id, `None` for the default paragraph style.
    pub fn style(&self) -> Result<Option<String>> {
        self.p_pr().map_or(Ok(None), |pr| pr.style())
    }

    pub fn alignment(&self) -> Result<Option<WdParagraphAlignment>> {
        self.p_pr().map_or(Ok(None), |pr| pr.alignment())
    }

    /// Section properties carried by this paragraph, marking the end of a section.
    pub fn sect_pr(&self) -> Option<&Element> {
        P_PR.get(self.element()).and_then(|pr| P_SECT_PR.get(pr))
    }

    /// Text of the runs directly in this paragraph.
    pub fn text(&self) -> String {
        self.runs().map(|r| r.text()).collect()
    }
}

impl<E: BorrowMut<Element>> P<E> {
    pub fn get_or_add_p_pr(&mut self) -> PPr<&mut Element> {
        PPr::wrap(P_PR.get_or_add(self.element_mut()))
    }

    pub fn add_r(&mut self) -> R<&mut Element> {
        R::wrap(P_R.add(self.element_mut()))
    }

    /// Append a run holding `text`.
    pub fn add_run(&mut self, text: &str) -> R<&mut Element> {
        let mut r = self.add_r();
        r.set_text(text);
        r
    }

    pub fn set_style(&mut self, style_id: Option<&str>) -> Result<()> {
        if style_id.is_none() && self.p_pr().is_none() {
            return Ok(());
        }
        self.get_or_add_p_pr().set_style(style_id)
    }

    pub fn set_alignment(&mut self, alignment: Option<WdParagraphAlignment>) -> Result<()> {
        if alignment.is_none() && self.p_pr().is_none() {
            return Ok(());
        }
        self.get_or_add_p_pr().set_alignment(alignment)
    }

    /// Remove all content except the paragraph properties.
    pub fn clear_content(&mut self) {
        self.element_mut().children_mut().retain(|c| c.is("w:pPr"));
    }
}

impl<E: Borrow<Element>> PPr<E> {
    pub fn style(&self) -> Result<Option<String>> {
        P_STYLE
            .get(self.element())
            .map(|el| STRING_VAL.get(el))
            .transpose()
    }

    pub fn alignment(&self) -> Result<Option<WdParagraphAlignment>> {
        P_JC.get(self.element()).map(|el| P_JC_VAL.get(el)).transpose()
    }

    pub fn num_pr(&self) -> Option<NumPr<&Element>> {
        NUM_PR.get(self.element()).map(NumPr::wrap)
    }

    pub fn sect_pr(&self) -> Option<&Element> {
        P_SECT_PR.get(self.element())
    }
}

impl<E: BorrowMut<Element>> PPr<E> {
    pub fn set_style(&mut self, style_id: Option<&str>) -> Result<()> {
        let p_pr = self.element_mut();
        match style_id {
            Some(id) => STRING_VAL.set(P_STYLE.get_or_add(p_pr), &id.to_string()),
            None => {
                P_STYLE.remove(p_pr);
                Ok(())
            },
        }
    }

    pub fn set_alignment(&mut self, alignment: Option<WdParagraphAlignment>) -> Result<()> {
        let p_pr = self.element_mut();
        P_JC.remove(p_pr);
        match alignment {
            Some(alignment) => P_JC_VAL.set(P_JC.add(p_pr), &alignment),
            None => Ok(()),
        }
    }

    pub fn get_or_add_num_pr(&mut self) -> NumPr<&mut Element> {
        NumPr::wrap(NUM_PR.get_or_add(self.element_mut()))
    }

    pub fn remove_num_pr(&mut self) -> bool {
        NUM_PR.remove(self.element_mut())
    }

    pub fn sect_pr_mut(&mut self) -> Option<&mut Element> {
        P_SECT_PR.get_mut(self.element_mut())
    }

    /// Attach section properties, replacing any present.
    pub fn set_sect_pr(&mut self, sect_pr: Element) -> &mut Element {
        let p_pr = self.element_mut();
        P_SECT_PR.remove(p_pr);
        P_SECT_PR.insert(p_pr, sect_pr)
    }
}

impl<E: Borrow<Element>> NumPr<E> {
    pub fn num_id(&self) -> Result<Option<i64>> {
        NUM_ID.get(self.element()).map(|el| NUMBER_VAL.get(el)).transpose()
    }

    pub fn ilvl(&self) -> Result<Option<i64>> {
        ILVL.get(self.element()).map(|el| NUMBER_VAL.get(el)).transpose()
    }
}

impl<E: BorrowMut<Element>> NumPr<E> {
    pub fn set_num_id(&mut self, num_id: i64) -> Result<()> {
        NUMBER_VAL.set(NUM_ID.get_or_add(self.element_mut()), &num_id)
    }

    pub fn set_ilvl(&mut self, ilvl: i64) -> Result<()> {
        NUMBER_VAL.set(ILVL.get_or_add(self.element_mut()), &ilvl)
    }
}

impl<E: Borrow<Element>> R<E> {
    pub fn r_pr(&self) -> Option<RPr<&Element>> {
        R_PR.get(self.element()).map(RPr::wrap)
    }

    pub fn style(&self) -> Result<Option<String>> {
        self.r_pr().map_or(Ok(None), |pr| pr.style())
    }

    /// Text equivalent of the run content.
    ///
    /// Tabs read as `\t`; line breaks and carriage returns as `\n`. Page and
    /// column breaks contribute nothing.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in self.element().children() {
            match child.class() {
                ElementClass::T => out.push_str(child.text().unwrap_or("")),
                ElementClass::Tab => out.push('\t'),
                ElementClass::Cr => out.push('\n'),
                ElementClass::Br => {
                    if matches!(BR_TYPE.get(child), Ok(Some(WdBreakType::TextWrapping))) {
                        out.push('\n');
                    }
                },
                _ if child.is("w:noBreakHyphen") => out.push('-'),
                _ if child.is("w:ptab") => out.push('\t'),
                _ => {},
            }
        }
        out
    }
}

impl<E: BorrowMut<Element>> R<E> {
    pub fn get_or_add_r_pr(&mut self) -> RPr<&mut Element> {
        RPr::wrap(R_PR.get_or_add(self.element_mut()))
    }

    pub fn set_style(&mut self, style_id: Option<&str>) -> Result<()> {
        if style_id.is_none() && self.r_pr().is_none() {
            return Ok(());
        }
        self.get_or_add_r_pr().set_style(style_id)
    }

    /// Append a `w:t`; leading or trailing whitespace is marked as significant.
    pub fn add_t(&mut self, text: &str) -> &mut Element {
        let t = self.element_mut().append(Element::new("w:t"));
        if text.trim() != text {
            t.set_attr("xml:space", "preserve");
        }
        t.set_text(Some(text.to_string()));
        t
    }

    pub fn add_br(&mut self, kind: WdBreakType) -> Result<&mut Element> {
        let br = self.element_mut().append(Element::new("w:br"));
        BR_TYPE.set(br, Some(&kind))?;
        Ok(br)
    }

    pub fn add_tab(&mut self) -> &mut Element {
        self.element_mut().append(Element::new("w:tab"))
    }

    /// Remove all content except the run properties.
    pub fn clear_content(&mut self) {
        self.element_mut().children_mut().retain(|c| c.is("w:rPr"));
    }

    /// Replace the run content with `text`.
    ///
    /// `\t` becomes a `w:tab` and `\n` or `\r` a `w:br`; other characters are
    /// collected into `w:t` elements between them.
    pub fn set_text(&mut self, text: &str) {
        self.clear_content();
        let mut pending = String::new();
        for ch in text.chars() {
            match ch {
                '\t' | '\n' | '\r' => {
                    if !pending.is_empty() {
                        self.add_t(&pending);
                        pending.clear();
                    }
                    if ch == '\t' {
                        self.add_tab();
                    } else {
                        self.element_mut().append(Element::new("w:br"));
                    }
                },
                _ => pending.push(ch),
            }
        }
        if !pending.is_empty() {
            self.add_t(&pending);
        }
    }
}

impl<E: Borrow<Element>> RPr<E> {
    pub fn style(&self) -> Result<Option<String>> {
        R_STYLE
            .get(self.element())
            .map(|el| STRING_VAL.get(el))
            .transpose()
    }

    /// `None` when not set here, so the value is inherited.
    pub fn bold(&self) -> Result<Option<bool>> {
        toggle(self.element(), &BOLD)
    }

    pub fn italic(&self) -> Result<Option<bool>> {
        toggle(self.element(), &ITALIC)
    }

    pub fn strike(&self) -> Result<Option<bool>> {
        toggle(self.element(), &STRIKE)
    }

    pub fn size(&self) -> Result<Option<Length>> {
        SZ.get(self.element()).map(|el| SZ_VAL.get(el)).transpose()
    }

    pub fn color(&self) -> Result<Option<ColorValue>> {
        COLOR.get(self.element()).map(|el| COLOR_VAL.get(el)).transpose()
    }

    /// `Some(false)` for an explicit `none`, `Some(true)` for any other style.
    pub fn underline(&self) -> Result<Option<bool>> {
        let Some(u) = UNDERLINE.get(self.element()) else {
            return Ok(None);
        };
        Ok(Some(UNDERLINE_VAL.get(u)?.is_some_and(|v| v != "none")))
    }
}

impl<E: BorrowMut<Element>> RPr<E> {
    pub fn set_style(&mut self, style_id: Option<&str>) -> Result<()> {
        let r_pr = self.element_mut();
        match style_id {
            Some(id) => STRING_VAL.set(R_STYLE.get_or_add(r_pr), &id.to_string()),
            None => {
                R_STYLE.remove(r_pr);
                Ok(())
            },
        }
    }

    pub fn set_bold(&mut self, value: Option<bool>) -> Result<()> {
        set_toggle(self.element_mut(), &BOLD, value)
    }

    pub fn set_italic(&mut self, value: Option<bool>) -> Result<()> {
        set_toggle(self.element_mut(), &ITALIC, value)
    }

    pub fn set_strike(&mut self, value: Option<bool>) -> Result<()> {
        set_toggle(self.element_mut(), &STRIKE, value)
    }

    pub fn set_size(&mut self, size: Option<Length>) -> Result<()> {
        let r_pr = self.element_mut();
        SZ.remove(r_pr);
        match size {
            Some(size) => SZ_VAL.set(SZ.add(r_pr), &size),
            None => Ok(()),
        }
    }

    pub fn set_color(&mut self, color: Option<ColorValue>) -> Result<()> {
        let r_pr = self.element_mut();
        COLOR.remove(r_pr);
        match color {
            Some(color) => COLOR_VAL.set(COLOR.add(r_pr), &color),
            None => Ok(()),
        }
    }

    pub fn set_underline(&mut self, value: Option<bool>) -> Result<()> {
        let r_pr = self.element_mut();
        UNDERLINE.remove(r_pr);
        if let Some(on) = value {
            let val = if on { "single" } else { "none" };
            UNDERLINE_VAL.set(UNDERLINE.add(r_pr), Some(&val.to_string()))?;
        }
        Ok(())
    }
}

fn toggle(r_pr: &Element, child: &ZeroOrOne) -> Result<Option<bool>> {
    child.get(r_pr).map_or(Ok(None), |el| ON_OFF_VAL.get(el))
}

fn set_toggle(r_pr: &mut Element, child: &ZeroOrOne, value: Option<bool>) -> Result<()> {
    match value {
        Some(on) => ON_OFF_VAL.set(child.get_or_add(r_pr), Some(&on)),
        None => {
            child.remove(r_pr);
            Ok(())
        },
    }
}
