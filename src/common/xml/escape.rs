use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static ATTR_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "\n", "\r", "\t"])
        .expect("Failed to build XML attribute escaper")
});

static TEXT_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\r"])
        .expect("Failed to build XML text escaper")
});

// Use LeftmostLongest to ensure longer entities are matched first (e.g., &amp; instead of &lt;)
static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
        .expect("Failed to build XML unescaper")
});

/// Escape a string for use inside a double-quoted attribute value.
///
/// Whitespace control characters are written as character references so
/// that attribute-value normalization on re-read gives back the same string.
///
/// # Examples
///
/// ```
/// use docx_opc::common::xml::escape_attr;
/// assert_eq!(escape_attr("a & \"b\""), "a &amp; &quot;b&quot;");
/// assert_eq!(escape_attr("tab\there"), "tab&#9;here");
/// ```
#[inline]
pub fn escape_attr(s: &str) -> String {
    ATTR_ESCAPER.replace_all(
        s,
        &["&amp;", "&lt;", "&gt;", "&quot;", "&#10;", "&#13;", "&#9;"],
    )
}

/// Escape a string for use as element character data.
///
/// # Examples
///
/// ```
/// use docx_opc::common::xml::escape_text;
/// assert_eq!(escape_text("<tag>\"hello\"</tag>"), "&lt;tag&gt;\"hello\"&lt;/tag&gt;");
/// ```
#[inline]
pub fn escape_text(s: &str) -> String {
    TEXT_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&#13;"])
}

/// Unescape the five predefined XML entities.
///
/// Unknown or malformed entities are left unchanged.
///
/// # Examples
///
/// ```
/// use docx_opc::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;"); // &amp; is matched first
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// ```
#[inline]
pub fn unescape_xml(s: &str) -> String {
    XML_UNESCAPER.replace_all(s, &["&", "<", ">", "\"", "'"])
}

/// Resolve the body of a general entity reference (the part between `&` and `;`).
///
/// Only the predefined entities and numeric character references are known.
/// Anything else returns `None`; callers treat that as malformed input rather
/// than trying to expand a DTD-declared entity.
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attr_round_trip() {
        let raw = "x < y && \"z\"\n";
        let escaped = escape_attr(raw);
        assert!(!escaped.contains('"'.to_string().as_str()) || escaped.contains("&quot;"));
        assert_eq!(escaped, "x &lt; y &amp;&amp; &quot;z&quot;&#10;");
    }

    #[test]
    fn test_escape_text_keeps_quotes() {
        assert_eq!(escape_text("it's \"fine\" & ok"), "it's \"fine\" &amp; ok");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp"), Some('&'));
        assert_eq!(resolve_entity("#65"), Some('A'));
        assert_eq!(resolve_entity("#x263A"), Some('\u{263A}'));
        assert_eq!(resolve_entity("nbsp"), None);
        assert_eq!(resolve_entity("#xD800"), None);
        assert_eq!(resolve_entity("#"), None);
    }
}
