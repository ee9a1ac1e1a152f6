//! Default content for parts a new or incomplete document needs.
//!
//! The XML lives in `templates/` next to this file and is compiled into the
//! crate.

/// Styles part content: document defaults plus the built-in default styles
/// for each style type and a handful of commonly used ones.
pub fn default_styles_xml() -> &'static [u8] {
    include_bytes!("templates/styles.xml")
}

/// Settings part content.
pub fn default_settings_xml() -> &'static [u8] {
    include_bytes!("templates/settings.xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::enums::WdStyleType;
    use crate::ooxml::oxml::parser::parse_xml;
    use crate::ooxml::oxml::settings::Settings;
    use crate::ooxml::oxml::styles::Styles;

    #[test]
    fn test_default_styles_have_a_default_per_type() {
        let root = parse_xml(default_styles_xml()).unwrap();
        let styles = Styles::new(&root).unwrap();
        for style_type in [
            WdStyleType::Paragraph,
            WdStyleType::Character,
            WdStyleType::Table,
            WdStyleType::List,
        ] {
            assert!(styles.default_for(style_type).unwrap().is_some(), "{}", style_type);
        }
        assert!(styles.style_by_name("heading 1").is_some());
    }

    #[test]
    fn test_default_settings_parse() {
        let root = parse_xml(default_settings_xml()).unwrap();
        let settings = Settings::new(&root).unwrap();
        assert!(!settings.even_and_odd_headers().unwrap());
    }
}
