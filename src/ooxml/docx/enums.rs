//! Enumerations for Word document elements.
//!
//! Each enumeration maps one-to-one onto the string tokens an attribute
//! accepts, and implements [`XmlEnum`] so it can be read and written through
//! the `Enum<E>` simple type.

use std::fmt;

use crate::ooxml::oxml::simpletypes::XmlEnum;

macro_rules! xml_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $xml:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// The attribute value for this member.
            #[inline]
            pub const fn to_xml(self) -> &'static str {
                match self {
                    $(Self::$variant => $xml,)+
                }
            }

            /// Parse an attribute value; `None` if it is not a member.
            #[inline]
            pub fn from_xml(s: &str) -> Option<Self> {
                match s {
                    $($xml => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl XmlEnum for $name {
            const MEMBERS: &'static [Self] = &[$(Self::$variant,)+];

            fn to_xml(self) -> &'static str {
                $name::to_xml(self)
            }

            fn from_xml(s: &str) -> Option<Self> {
                $name::from_xml(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.to_xml())
            }
        }
    };
}

xml_enum! {
    /// Page orientation, `w:pgSz/@w:orient`.
    pub enum WdOrientation {
        Portrait => "portrait",
        Landscape => "landscape",
    }
}

impl Default for WdOrientation {
    #[inline]
    fn default() -> Self {
        Self::Portrait
    }
}

xml_enum! {
    /// How a section begins relative to the previous one, `w:type/@w:val`.
    pub enum WdSectionStart {
        Continuous => "continuous",
        NewColumn => "nextColumn",
        NewPage => "nextPage",
        EvenPage => "evenPage",
        OddPage => "oddPage",
    }
}

impl Default for WdSectionStart {
    #[inline]
    fn default() -> Self {
        Self::NewPage
    }
}

xml_enum! {
    /// Which pages a header or footer definition applies to.
    pub enum WdHeaderFooter {
        /// Odd pages, or every page when even/odd headers are off.
        Primary => "default",
        /// First page, when the section has a distinct title page.
        FirstPage => "first",
        EvenPage => "even",
    }
}

xml_enum! {
    /// `w:style/@w:type`.
    pub enum WdStyleType {
        Paragraph => "paragraph",
        Character => "character",
        Table => "table",
        List => "numbering",
    }
}

xml_enum! {
    /// Table alignment, `w:tblPr/w:jc/@w:val`.
    pub enum WdTableAlignment {
        Left => "left",
        Center => "center",
        Right => "right",
    }
}

xml_enum! {
    /// Paragraph alignment, `w:pPr/w:jc/@w:val`.
    pub enum WdParagraphAlignment {
        Left => "left",
        Center => "center",
        Right => "right",
        Justify => "both",
        Distribute => "distribute",
        Start => "start",
        End => "end",
    }
}

xml_enum! {
    /// `w:trHeight/@w:hRule`.
    pub enum WdRowHeightRule {
        Auto => "auto",
        AtLeast => "atLeast",
        Exactly => "exact",
    }
}

xml_enum! {
    /// `w:vAlign/@w:val`.
    pub enum WdCellVerticalAlignment {
        Top => "top",
        Center => "center",
        Bottom => "bottom",
        Both => "both",
    }
}

xml_enum! {
    /// `w:vMerge/@w:val`. An absent value means `Continue`.
    pub enum StMerge {
        Restart => "restart",
        Continue => "continue",
    }
}

xml_enum! {
    /// `w:tblLayout/@w:type`.
    pub enum StTblLayoutType {
        Fixed => "fixed",
        Autofit => "autofit",
    }
}

xml_enum! {
    /// Unit of a table or cell width, `w:tblW/@w:type` and `w:tcW/@w:type`.
    pub enum StTblWidth {
        Auto => "auto",
        /// Twentieths of a point.
        Dxa => "dxa",
        Nil => "nil",
        /// Fiftieths of a percent.
        Pct => "pct",
    }
}

xml_enum! {
    /// `w:br/@w:type`.
    pub enum WdBreakType {
        Page => "page",
        Column => "column",
        TextWrapping => "textWrapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::oxml::simpletypes::{Enum, SimpleType};

    #[test]
    fn test_xml_tokens() {
        assert_eq!(WdOrientation::Landscape.to_xml(), "landscape");
        assert_eq!(WdSectionStart::from_xml("oddPage"), Some(WdSectionStart::OddPage));
        assert_eq!(WdHeaderFooter::Primary.to_xml(), "default");
        assert_eq!(WdStyleType::from_xml("numbering"), Some(WdStyleType::List));
        assert_eq!(WdParagraphAlignment::Justify.to_string(), "both");
        assert_eq!(StMerge::from_xml("Restart"), None);
    }

    #[test]
    fn test_members_cover_every_variant() {
        for member in WdSectionStart::MEMBERS {
            assert_eq!(
                <WdSectionStart as XmlEnum>::from_xml(member.to_xml()),
                Some(*member)
            );
        }
        assert_eq!(StTblWidth::MEMBERS.len(), 4);
    }

    #[test]
    fn test_enum_codec_reports_members() {
        let err = Enum::<WdOrientation>::from_xml("sideways").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("portrait"), "{}", msg);
        assert!(msg.contains("landscape"), "{}", msg);
        assert_eq!(
            Enum::<WdOrientation>::to_xml(&WdOrientation::Landscape).unwrap(),
            "landscape"
        );
    }
}
