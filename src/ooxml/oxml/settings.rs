//! `w:settings`, root element of the document settings part.

use std::borrow::{Borrow, BorrowMut};

use crate::ooxml::error::Result;
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::simpletypes::StOnOff;
use crate::ooxml::oxml::xmlchemy::{OptionalAttribute, ZeroOrOne, element_view, successors_of};

const SETTINGS_SEQ: &[&str] = &[
    "w:writeProtection",
    "w:view",
    "w:zoom",
    "w:removePersonalInformation",
    "w:removeDateAndTime",
    "w:doNotDisplayPageBoundaries",
    "w:displayBackgroundShape",
    "w:printPostScriptOverText",
    "w:printFractionalCharacterWidth",
    "w:printFormsData",
    "w:embedTrueTypeFonts",
    "w:embedSystemFonts",
    "w:saveSubsetFonts",
    "w:saveFormsData",
    "w:mirrorMargins",
    "w:alignBordersAndEdges",
    "w:bordersDoNotSurroundHeader",
    "w:bordersDoNotSurroundFooter",
    "w:gutterAtTop",
    "w:hideSpellingErrors",
    "w:hideGrammaticalErrors",
    "w:activeWritingStyle",
    "w:proofState",
    "w:formsDesign",
    "w:attachedTemplate",
    "w:linkStyles",
    "w:stylePaneFormatFilter",
    "w:stylePaneSortMethod",
    "w:documentType",
    "w:mailMerge",
    "w:revisionView",
    "w:trackRevisions",
    "w:doNotTrackMoves",
    "w:doNotTrackFormatting",
    "w:documentProtection",
    "w:autoFormatOverride",
    "w:styleLockTheme",
    "w:styleLockQFSet",
    "w:defaultTabStop",
    "w:autoHyphenation",
    "w:consecutiveHyphenLimit",
    "w:hyphenationZone",
    "w:doNotHyphenateCaps",
    "w:showEnvelope",
    "w:summaryLength",
    "w:clickAndTypeStyle",
    "w:defaultTableStyle",
    "w:evenAndOddHeaders",
    "w:bookFoldRevPrinting",
    "w:bookFoldPrinting",
    "w:bookFoldPrintingSheets",
    "w:drawingGridHorizontalSpacing",
    "w:drawingGridVerticalSpacing",
    "w:displayHorizontalDrawingGridEvery",
    "w:displayVerticalDrawingGridEvery",
    "w:doNotUseMarginsForDrawingGridOrigin",
    "w:drawingGridHorizontalOrigin",
    "w:drawingGridVerticalOrigin",
    "w:doNotShadeFormData",
    "w:noPunctuationKerning",
    "w:characterSpacingControl",
    "w:printTwoOnOne",
    "w:strictFirstAndLastChars",
    "w:noLineBreaksAfter",
    "w:noLineBreaksBefore",
    "w:savePreviewPicture",
    "w:doNotValidateAgainstSchema",
    "w:saveInvalidXml",
    "w:ignoreMixedContent",
    "w:alwaysShowPlaceholderText",
    "w:doNotDemarcateInvalidXml",
    "w:saveXmlDataOnly",
    "w:useXSLTWhenSaving",
    "w:saveThroughXslt",
    "w:showXMLTags",
    "w:alwaysMergeEmptyNamespace",
    "w:updateFields",
    "w:hdrShapeDefaults",
    "w:footnotePr",
    "w:endnotePr",
    "w:compat",
    "w:docVars",
    "w:rsids",
    "m:mathPr",
    "w:attachedSchema",
    "w:themeFontLang",
    "w:clrSchemeMapping",
    "w:doNotIncludeSubdocsInStats",
    "w:doNotAutoCompressPictures",
    "w:forceUpgrade",
    "w:captions",
    "w:readModeInkLockDown",
    "w:smartTagType",
    "sl:schemaLibrary",
    "w:shapeDefaults",
    "w:doNotEmbedSmartTags",
    "w:decimalSymbol",
    "w:listSeparator",
];

const EVEN_AND_ODD_HEADERS: ZeroOrOne = ZeroOrOne::new(
    "w:evenAndOddHeaders",
    successors_of(SETTINGS_SEQ, "w:evenAndOddHeaders"),
);

const ON_OFF_VAL: OptionalAttribute<StOnOff> = OptionalAttribute::with_default("w:val", true);

element_view!(
    /// `<w:settings>`, document-wide settings.
    Settings,
    ElementClass::Settings,
    "w:settings"
);

impl Settings<Element> {
    pub fn new_root() -> Self {
        Self::wrap(Element::with_nsdecls("w:settings", &["w"]))
    }
}

impl<E: Borrow<Element>> Settings<E> {
    /// Whether even and odd pages get distinct headers and footers.
    pub fn even_and_odd_headers(&self) -> Result<bool> {
        match EVEN_AND_ODD_HEADERS.get(self.element()) {
            Some(el) => Ok(ON_OFF_VAL.get(el)?.unwrap_or(true)),
            None => Ok(false),
        }
    }
}

impl<E: BorrowMut<Element>> Settings<E> {
    pub fn set_even_and_odd_headers(&mut self, value: bool) -> Result<()> {
        let settings = self.element_mut();
        if !value {
            EVEN_AND_ODD_HEADERS.remove(settings);
            return Ok(());
        }
        ON_OFF_VAL.set(EVEN_AND_ODD_HEADERS.get_or_add(settings), Some(&true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::oxml::parser::parse_xml;

    #[test]
    fn test_even_and_odd_headers() {
        let mut settings = Settings::new_root();
        assert!(!settings.even_and_odd_headers().unwrap());
        settings.set_even_and_odd_headers(true).unwrap();
        assert!(settings.even_and_odd_headers().unwrap());
        settings.set_even_and_odd_headers(false).unwrap();
        assert!(settings.element().children().is_empty());
    }

    #[test]
    fn test_explicit_off_and_ordering() {
        let mut root = parse_xml(
            br#"<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:zoom w:percent="100"/><w:evenAndOddHeaders w:val="0"/><w:compat/></w:settings>"#,
        )
        .unwrap();
        let mut settings = Settings::new(&mut root).unwrap();
        assert!(!settings.even_and_odd_headers().unwrap());
        settings.set_even_and_odd_headers(false).unwrap();
        settings.set_even_and_odd_headers(true).unwrap();
        let tags: Vec<String> = settings.element().children().iter().map(Element::tag).collect();
        assert_eq!(tags, ["w:zoom", "w:evenAndOddHeaders", "w:compat"]);
    }
}
