//! Style definitions: `w:styles` and `w:style`.

use std::borrow::{Borrow, BorrowMut};

use crate::ooxml::docx::enums::WdStyleType;
use crate::ooxml::error::Result;
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::simpletypes::{Enum, StDecimalNumber, StOnOff, StString};
use crate::ooxml::oxml::xmlchemy::{
    OptionalAttribute, RequiredAttribute, ZeroOrMore, ZeroOrOne, element_view, successors_of,
};

const STYLES_SEQ: &[&str] = &["w:docDefaults", "w:latentStyles", "w:style"];

const STYLE_SEQ: &[&str] = &[
    "w:name",
    "w:aliases",
    "w:basedOn",
    "w:next",
    "w:link",
    "w:autoRedefine",
    "w:hidden",
    "w:uiPriority",
    "w:semiHidden",
    "w:unhideWhenUsed",
    "w:qFormat",
    "w:locked",
    "w:personal",
    "w:personalCompose",
    "w:personalReply",
    "w:rsid",
    "w:pPr",
    "w:rPr",
    "w:tblPr",
    "w:trPr",
    "w:tcPr",
    "w:tblStylePr",
];

// w:styles
const DOC_DEFAULTS: ZeroOrOne =
    ZeroOrOne::new("w:docDefaults", successors_of(STYLES_SEQ, "w:docDefaults"));
const LATENT_STYLES: ZeroOrOne =
    ZeroOrOne::new("w:latentStyles", successors_of(STYLES_SEQ, "w:latentStyles"));
const STYLE: ZeroOrMore = ZeroOrMore::new("w:style", successors_of(STYLES_SEQ, "w:style"));

// w:style
const NAME: ZeroOrOne = ZeroOrOne::new("w:name", successors_of(STYLE_SEQ, "w:name"));
const BASED_ON: ZeroOrOne = ZeroOrOne::new("w:basedOn", successors_of(STYLE_SEQ, "w:basedOn"));
const NEXT: ZeroOrOne = ZeroOrOne::new("w:next", successors_of(STYLE_SEQ, "w:next"));
const UI_PRIORITY: ZeroOrOne =
    ZeroOrOne::new("w:uiPriority", successors_of(STYLE_SEQ, "w:uiPriority"));
const SEMI_HIDDEN: ZeroOrOne =
    ZeroOrOne::new("w:semiHidden", successors_of(STYLE_SEQ, "w:semiHidden"));
const UNHIDE_WHEN_USED: ZeroOrOne =
    ZeroOrOne::new("w:unhideWhenUsed", successors_of(STYLE_SEQ, "w:unhideWhenUsed"));
const Q_FORMAT: ZeroOrOne = ZeroOrOne::new("w:qFormat", successors_of(STYLE_SEQ, "w:qFormat"));
const STYLE_P_PR: ZeroOrOne = ZeroOrOne::new("w:pPr", successors_of(STYLE_SEQ, "w:pPr"));
const STYLE_R_PR: ZeroOrOne = ZeroOrOne::new("w:rPr", successors_of(STYLE_SEQ, "w:rPr"));

// attributes
const STYLE_TYPE: OptionalAttribute<Enum<WdStyleType>> =
    OptionalAttribute::with_default("w:type", WdStyleType::Paragraph);
const STYLE_ID: OptionalAttribute<StString> = OptionalAttribute::new("w:styleId");
const DEFAULT: OptionalAttribute<StOnOff> = OptionalAttribute::new("w:default");
const CUSTOM_STYLE: OptionalAttribute<StOnOff> = OptionalAttribute::new("w:customStyle");
const STRING_VAL: RequiredAttribute<StString> = RequiredAttribute::new("w:val");
const NUMBER_VAL: RequiredAttribute<StDecimalNumber> = RequiredAttribute::new("w:val");
const ON_OFF_VAL: OptionalAttribute<StOnOff> = OptionalAttribute::with_default("w:val", true);

element_view!(
    /// `<w:styles>`, root element of the styles part.
    Styles,
    ElementClass::Styles,
    "w:styles"
);
element_view!(
    /// `<w:style>`, one style definition.
    Style,
    ElementClass::Style,
    "w:style"
);

/// Style id Word assigns to a style created under `name`.
///
/// The built-in heading and caption styles have fixed ids; any other name
/// has its spaces removed.
pub fn style_id_from_name(name: &str) -> String {
    if name == "caption" {
        return "Caption".to_string();
    }
    if let Some(level) = name.strip_prefix("heading ")
        && level.len() == 1
        && level.as_bytes()[0].is_ascii_digit()
        && level != "0"
    {
        return format!("Heading{}", level);
    }
    name.replace(' ', "")
}

impl<E: Borrow<Element>> Styles<E> {
    pub fn styles(&self) -> impl Iterator<Item = Style<&Element>> {
        STYLE.all(self.element()).map(Style::wrap)
    }

    pub fn style_count(&self) -> usize {
        STYLE.count(self.element())
    }

    pub fn doc_defaults(&self) -> Option<&Element> {
        DOC_DEFAULTS.get(self.element())
    }

    pub fn latent_styles(&self) -> Option<&Element> {
        LATENT_STYLES.get(self.element())
    }

    pub fn style_by_id(&self, style_id: &str) -> Option<Style<&Element>> {
        Styles::wrap(self.element()).into_style_by_id(style_id)
    }

    pub fn style_by_name(&self, name: &str) -> Option<Style<&Element>> {
        STYLE
            .all(self.element())
            .find(|s| {
                NAME.get(s)
                    .and_then(|n| n.attr("w:val"))
                    .is_some_and(|v| v == name)
            })
            .map(Style::wrap)
    }

    /// The default style for `style_type`.
    ///
    /// When more than one style of the type claims to be the default, the
    /// last one in document order wins.
    pub fn default_for(&self, style_type: WdStyleType) -> Result<Option<Style<&Element>>> {
        Styles::wrap(self.element()).into_default_for(style_type)
    }
}

impl<'a> Styles<&'a Element> {
    pub fn into_style_by_id(self, style_id: &str) -> Option<Style<&'a Element>> {
        STYLE
            .all(self.into_inner())
            .find(|s| s.attr("w:styleId") == Some(style_id))
            .map(Style::wrap)
    }

    pub fn into_default_for(self, style_type: WdStyleType) -> Result<Option<Style<&'a Element>>> {
        let mut found = None;
        for style in STYLE.all(self.into_inner()) {
            let view = Style::wrap(style);
            if view.style_type()? == style_type && view.is_default()? {
                found = Some(style);
            }
        }
        Ok(found.map(Style::wrap))
    }
}

impl<E: BorrowMut<Element>> Styles<E> {
    /// Append a new style named `name`. Styles that are not `builtin` are
    /// marked as custom.
    pub fn add_style(
        &mut self,
        name: &str,
        style_type: WdStyleType,
        builtin: bool,
    ) -> Result<Style<&mut Element>> {
        let mut style = Style::wrap(STYLE.add(self.element_mut()));
        style.set_style_type(style_type)?;
        style.set_custom_style(!builtin)?;
        style.set_style_id(Some(&style_id_from_name(name)))?;
        style.set_name(Some(name))?;
        Ok(style)
    }

    pub fn style_by_id_mut(&mut self, style_id: &str) -> Option<Style<&mut Element>> {
        STYLE
            .all_mut(self.element_mut())
            .find(|s| s.attr("w:styleId") == Some(style_id))
            .map(Style::wrap)
    }

    /// Remove the style with `style_id`, returning whether one was present.
    pub fn remove_style(&mut self, style_id: &str) -> bool {
        let children = self.element_mut().children_mut();
        let before = children.len();
        children.retain(|c| !(c.is("w:style") && c.attr("w:styleId") == Some(style_id)));
        children.len() != before
    }
}

impl<E: Borrow<Element>> Style<E> {
    pub fn style_id(&self) -> Result<Option<String>> {
        STYLE_ID.get(self.element())
    }

    /// Style type, paragraph when not given.
    pub fn style_type(&self) -> Result<WdStyleType> {
        Ok(STYLE_TYPE
            .get(self.element())?
            .unwrap_or(WdStyleType::Paragraph))
    }

    pub fn is_default(&self) -> Result<bool> {
        Ok(DEFAULT.get(self.element())?.unwrap_or(false))
    }

    pub fn is_custom(&self) -> Result<bool> {
        Ok(CUSTOM_STYLE.get(self.element())?.unwrap_or(false))
    }

    pub fn name(&self) -> Result<Option<String>> {
        child_string(self.element(), &NAME)
    }

    pub fn based_on(&self) -> Result<Option<String>> {
        child_string(self.element(), &BASED_ON)
    }

    pub fn next_style(&self) -> Result<Option<String>> {
        child_string(self.element(), &NEXT)
    }

    pub fn ui_priority(&self) -> Result<Option<i64>> {
        UI_PRIORITY
            .get(self.element())
            .map_or(Ok(None), |el| NUMBER_VAL.get(el).map(Some))
    }

    pub fn semi_hidden(&self) -> Result<bool> {
        flag(self.element(), &SEMI_HIDDEN)
    }

    pub fn unhide_when_used(&self) -> Result<bool> {
        flag(self.element(), &UNHIDE_WHEN_USED)
    }

    pub fn quick_style(&self) -> Result<bool> {
        flag(self.element(), &Q_FORMAT)
    }

    pub fn p_pr(&self) -> Option<&Element> {
        STYLE_P_PR.get(self.element())
    }

    pub fn r_pr(&self) -> Option<&Element> {
        STYLE_R_PR.get(self.element())
    }
}

impl<E: BorrowMut<Element>> Style<E> {
    pub fn set_style_id(&mut self, style_id: Option<&str>) -> Result<()> {
        STYLE_ID.set(self.element_mut(), style_id.map(str::to_string).as_ref())
    }

    pub fn set_style_type(&mut self, style_type: WdStyleType) -> Result<()> {
        STYLE_TYPE.set(self.element_mut(), Some(&style_type))
    }

    /// Mark this style as the default of its type; `false` removes the marker.
    pub fn set_default(&mut self, value: bool) -> Result<()> {
        DEFAULT.set(self.element_mut(), value.then_some(&true))
    }

    pub fn set_custom_style(&mut self, value: bool) -> Result<()> {
        CUSTOM_STYLE.set(self.element_mut(), value.then_some(&true))
    }

    pub fn set_name(&mut self, name: Option<&str>) -> Result<()> {
        set_child_string(self.element_mut(), &NAME, name)
    }

    pub fn set_based_on(&mut self, style_id: Option<&str>) -> Result<()> {
        set_child_string(self.element_mut(), &BASED_ON, style_id)
    }

    pub fn set_next_style(&mut self, style_id: Option<&str>) -> Result<()> {
        set_child_string(self.element_mut(), &NEXT, style_id)
    }

    pub fn set_ui_priority(&mut self, priority: Option<i64>) -> Result<()> {
        let style = self.element_mut();
        match priority {
            Some(value) => NUMBER_VAL.set(UI_PRIORITY.get_or_add(style), &value),
            None => {
                UI_PRIORITY.remove(style);
                Ok(())
            },
        }
    }

    pub fn set_semi_hidden(&mut self, value: bool) {
        set_flag(self.element_mut(), &SEMI_HIDDEN, value);
    }

    pub fn set_unhide_when_used(&mut self, value: bool) {
        set_flag(self.element_mut(), &UNHIDE_WHEN_USED, value);
    }

    pub fn set_quick_style(&mut self, value: bool) {
        set_flag(self.element_mut(), &Q_FORMAT, value);
    }

    pub fn get_or_add_p_pr(&mut self) -> &mut Element {
        STYLE_P_PR.get_or_add(self.element_mut())
    }

    pub fn get_or_add_r_pr(&mut self) -> &mut Element {
        STYLE_R_PR.get_or_add(self.element_mut())
    }
}

fn child_string(parent: &Element, child: &ZeroOrOne) -> Result<Option<String>> {
    child.get(parent).map_or(Ok(None), |el| STRING_VAL.get(el).map(Some))
}

fn set_child_string(parent: &mut Element, child: &ZeroOrOne, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => STRING_VAL.set(child.get_or_add(parent), &v.to_string()),
        None => {
            child.remove(parent);
            Ok(())
        },
    }
}

/// An on/off child that is off when absent.
fn flag(parent: &Element, child: &ZeroOrOne) -> Result<bool> {
    match child.get(parent) {
        Some(el) => Ok(ON_OFF_VAL.get(el)?.unwrap_or(true)),
        None => Ok(false),
    }
}

fn set_flag(parent: &mut Element, child: &ZeroOrOne, value: bool) {
    child.remove(parent);
    if value {
        child.add(parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::oxml::parser::parse_xml;

    fn tags(el: &Element) -> Vec<String> {
        el.children().iter().map(Element::tag).collect()
    }

    fn styles_xml() -> Element {
        parse_xml(
            br#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
                <w:docDefaults/>
                <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
                <w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/></w:style>
                <w:style w:styleId="Body"><w:name w:val="Body Text"/></w:style>
                <w:style w:type="paragraph" w:default="1" w:styleId="Normal2"><w:name w:val="Normal 2"/></w:style>
                <w:style w:type="table" w:styleId="Grid"><w:name w:val="Table Grid"/></w:style>
            </w:styles>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_style_id_from_name() {
        assert_eq!(style_id_from_name("heading 1"), "Heading1");
        assert_eq!(style_id_from_name("heading 9"), "Heading9");
        assert_eq!(style_id_from_name("caption"), "Caption");
        assert_eq!(style_id_from_name("My Fancy Style"), "MyFancyStyle");
        assert_eq!(style_id_from_name("heading 10"), "heading10");
    }

    #[test]
    fn test_lookups() {
        let root = styles_xml();
        let styles = Styles::new(&root).unwrap();
        assert_eq!(styles.style_count(), 5);
        assert!(styles.doc_defaults().is_some());
        assert!(styles.latent_styles().is_none());

        let body = styles.style_by_id("Body").unwrap();
        assert_eq!(body.name().unwrap().as_deref(), Some("Body Text"));
        assert_eq!(body.style_type().unwrap(), WdStyleType::Paragraph);
        assert!(!body.is_default().unwrap());

        let grid = styles.style_by_name("Table Grid").unwrap();
        assert_eq!(grid.style_id().unwrap().as_deref(), Some("Grid"));
        assert!(styles.style_by_id("Missing").is_none());
        assert!(styles.style_by_name("Missing").is_none());
    }

    #[test]
    fn test_last_default_wins() {
        let root = styles_xml();
        let styles = Styles::new(&root).unwrap();
        let para = styles.default_for(WdStyleType::Paragraph).unwrap().unwrap();
        assert_eq!(para.style_id().unwrap().as_deref(), Some("Normal2"));
        let chr = styles.default_for(WdStyleType::Character).unwrap().unwrap();
        assert_eq!(chr.style_id().unwrap().as_deref(), Some("DefaultParagraphFont"));
        assert!(styles.default_for(WdStyleType::Table).unwrap().is_none());
    }

    #[test]
    fn test_add_style() {
        let mut styles = Styles::create();
        let mut style = styles
            .add_style("heading 2", WdStyleType::Paragraph, true)
            .unwrap();
        style.set_quick_style(true);
        style.set_ui_priority(Some(9)).unwrap();
        style.set_next_style(Some("Normal")).unwrap();
        style.set_based_on(Some("Normal")).unwrap();
        assert_eq!(
            tags(style.element()),
            ["w:name", "w:basedOn", "w:next", "w:uiPriority", "w:qFormat"]
        );
        assert_eq!(style.element().attr("w:styleId"), Some("Heading2"));
        assert_eq!(style.element().attr("w:type"), None);
        assert_eq!(style.element().attr("w:customStyle"), None);

        let custom = styles
            .add_style("Quote Block", WdStyleType::Character, false)
            .unwrap();
        assert_eq!(custom.element().attr("w:type"), Some("character"));
        assert_eq!(custom.element().attr("w:customStyle"), Some("1"));
        assert!(custom.is_custom().unwrap());

        assert!(styles.remove_style("QuoteBlock"));
        assert!(!styles.remove_style("QuoteBlock"));
        assert_eq!(styles.style_count(), 1);
    }

    #[test]
    fn test_flags() {
        let mut style = Style::create();
        assert!(!style.semi_hidden().unwrap());
        style.set_semi_hidden(true);
        style.set_unhide_when_used(true);
        assert!(style.semi_hidden().unwrap());
        assert!(style.unhide_when_used().unwrap());
        assert_eq!(tags(style.element()), ["w:semiHidden", "w:unhideWhenUsed"]);
        style.set_semi_hidden(false);
        assert_eq!(tags(style.element()), ["w:unhideWhenUsed"]);
    }
}
