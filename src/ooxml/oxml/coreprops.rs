//! `cp:coreProperties`, the Dublin Core document metadata in `docProps/core.xml`.
//!
//! Text properties read as `None` when the element is absent. Dates are
//! stored in W3CDTF and read back as UTC; a date that does not parse reads as
//! `None` rather than failing, so one malformed field does not hide the rest.

use std::borrow::{Borrow, BorrowMut};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::ns;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::xmlchemy::element_view;

/// Longest text value Word accepts for a core property.
pub const MAX_TEXT_LEN: usize = 255;

const W3CDTF_OUT: &str = "%Y-%m-%dT%H:%M:%SZ";

element_view!(
    /// `<cp:coreProperties>`, root element of the core properties part.
    CoreProperties,
    ElementClass::CoreProperties,
    "cp:coreProperties"
);

/// Text-valued core properties and the element each lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextProperty {
    Author,
    Category,
    Comments,
    ContentStatus,
    Identifier,
    Keywords,
    Language,
    LastModifiedBy,
    Subject,
    Title,
    Version,
}

impl TextProperty {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Author => "dc:creator",
            Self::Category => "cp:category",
            Self::Comments => "dc:description",
            Self::ContentStatus => "cp:contentStatus",
            Self::Identifier => "dc:identifier",
            Self::Keywords => "cp:keywords",
            Self::Language => "dc:language",
            Self::LastModifiedBy => "cp:lastModifiedBy",
            Self::Subject => "dc:subject",
            Self::Title => "dc:title",
            Self::Version => "cp:version",
        }
    }
}

/// Date-valued core properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateProperty {
    Created,
    LastPrinted,
    Modified,
}

impl DateProperty {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Created => "dcterms:created",
            Self::LastPrinted => "cp:lastPrinted",
            Self::Modified => "dcterms:modified",
        }
    }

    /// Created and modified carry an explicit `xsi:type` annotation.
    const fn needs_type_annotation(self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}

/// Parse a W3CDTF date: `YYYY`, `YYYY-MM`, `YYYY-MM-DD` or a full
/// `YYYY-MM-DDThh:mm:ss` timestamp, optionally followed by `Z` or a
/// `±hh:mm` offset. Offset times are normalized to UTC.
pub fn parse_w3cdtf(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let (stamp, offset) = match s.split_at_checked(19) {
        Some(parts) => parts,
        None => (s, ""),
    };

    let naive = parse_naive(stamp)?;
    let utc = DateTime::from_naive_utc_and_offset(naive, Utc);
    match offset {
        "" | "Z" => Some(utc),
        _ => apply_offset(utc, offset),
    }
}

fn parse_naive(stamp: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(stamp, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    let mut fields = stamp.splitn(2, '-');
    let year = atoi_simd::parse::<i32>(fields.next()?.as_bytes()).ok()?;
    let month = match fields.next() {
        Some(m) => atoi_simd::parse::<u32>(m.as_bytes()).ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

/// Shift a local time carrying `offset` (`+hh:mm` or `-hh:mm`) to UTC.
fn apply_offset(local: DateTime<Utc>, offset: &str) -> Option<DateTime<Utc>> {
    let bytes = offset.as_bytes();
    if bytes.len() != 6 || bytes[3] != b':' {
        return None;
    }
    let hours = atoi_simd::parse::<i64>(&bytes[1..3]).ok()?;
    let minutes = atoi_simd::parse::<i64>(&bytes[4..6]).ok()?;
    let delta = Duration::hours(hours) + Duration::minutes(minutes);
    match bytes[0] {
        b'+' => Some(local - delta),
        b'-' => Some(local + delta),
        _ => None,
    }
}

impl CoreProperties<Element> {
    /// An empty `cp:coreProperties` root with the namespaces its children use.
    pub fn new_root() -> Self {
        Self::wrap(Element::with_nsdecls(
            "cp:coreProperties",
            &["cp", "dc", "dcmitype", "dcterms", "xsi"],
        ))
    }
}

impl<E: Borrow<Element>> CoreProperties<E> {
    pub fn text(&self, prop: TextProperty) -> Option<&str> {
        self.element()
            .first_child(prop.tag())
            .map(|el| el.text().unwrap_or(""))
    }

    pub fn date(&self, prop: DateProperty) -> Option<DateTime<Utc>> {
        self.element()
            .first_child(prop.tag())
            .and_then(Element::text)
            .and_then(parse_w3cdtf)
    }

    /// Revision number; zero when absent or not a positive integer.
    pub fn revision(&self) -> u32 {
        self.element()
            .first_child("cp:revision")
            .and_then(Element::text)
            .and_then(|t| atoi_simd::parse::<u32>(t.trim().as_bytes()).ok())
            .unwrap_or(0)
    }

    pub fn author(&self) -> Option<&str> {
        self.text(TextProperty::Author)
    }

    pub fn title(&self) -> Option<&str> {
        self.text(TextProperty::Title)
    }

    pub fn last_modified_by(&self) -> Option<&str> {
        self.text(TextProperty::LastModifiedBy)
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.date(DateProperty::Created)
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.date(DateProperty::Modified)
    }
}

impl<E: BorrowMut<Element>> CoreProperties<E> {
    pub fn set_text(&mut self, prop: TextProperty, value: &str) -> Result<()> {
        let len = value.chars().count();
        if len > MAX_TEXT_LEN {
            return Err(OoxmlError::InvalidValue(format!(
                "exceeded {} char limit for property {}, got {} chars",
                MAX_TEXT_LEN,
                prop.tag(),
                len
            )));
        }
        self.get_or_add(prop.tag())
            .set_text(Some(value.to_string()));
        Ok(())
    }

    pub fn set_date(&mut self, prop: DateProperty, value: DateTime<Utc>) {
        if prop.needs_type_annotation() {
            self.element_mut().declare_namespace(Some("xsi"), ns::XSI);
        }
        let el = self.get_or_add(prop.tag());
        el.set_text(Some(value.format(W3CDTF_OUT).to_string()));
        if prop.needs_type_annotation() {
            el.set_attr("xsi:type", "dcterms:W3CDTF");
        }
    }

    /// Set the revision number, which must be positive.
    pub fn set_revision(&mut self, revision: u32) -> Result<()> {
        if revision < 1 {
            return Err(OoxmlError::InvalidValue(format!(
                "revision property requires positive int, got {}",
                revision
            )));
        }
        let mut buf = itoa::Buffer::new();
        let text = buf.format(revision).to_string();
        self.get_or_add("cp:revision").set_text(Some(text));
        Ok(())
    }

    pub fn set_author(&mut self, value: &str) -> Result<()> {
        self.set_text(TextProperty::Author, value)
    }

    pub fn set_title(&mut self, value: &str) -> Result<()> {
        self.set_text(TextProperty::Title, value)
    }

    pub fn set_last_modified_by(&mut self, value: &str) -> Result<()> {
        self.set_text(TextProperty::LastModifiedBy, value)
    }

    pub fn set_created(&mut self, value: DateTime<Utc>) {
        self.set_date(DateProperty::Created, value);
    }

    pub fn set_modified(&mut self, value: DateTime<Utc>) {
        self.set_date(DateProperty::Modified, value);
    }

    /// Properties have no fixed order, so new ones are appended.
    fn get_or_add(&mut self, tag: &str) -> &mut Element {
        let root = self.element_mut();
        match root.children().iter().position(|c| c.is(tag)) {
            Some(idx) => &mut root.children_mut()[idx],
            None => root.append(Element::new(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    use crate::ooxml::oxml::parser::parse_xml;
    use crate::ooxml::oxml::serialize::to_xml_string;

    #[test]
    fn test_parse_w3cdtf() {
        let dt = parse_w3cdtf("2023-10-10T14:30:00Z").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2023, 10, 10, 14));

        let dt = parse_w3cdtf("2023-10-10T14:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 12);
        let dt = parse_w3cdtf("2023-10-10T14:30:00-01:30").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (16, 0));

        assert_eq!(
            parse_w3cdtf("2003-12-31").unwrap(),
            Utc.with_ymd_and_hms(2003, 12, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_w3cdtf("2003-12").unwrap(),
            Utc.with_ymd_and_hms(2003, 12, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_w3cdtf("2003").unwrap(),
            Utc.with_ymd_and_hms(2003, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_w3cdtf("yesterday").is_none());
        assert!(parse_w3cdtf("2003-13").is_none());
    }

    #[test]
    fn test_read_properties() {
        let root = parse_xml(
            br#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/"><dc:title>Report</dc:title><dc:creator/><cp:revision>abc</cp:revision><dcterms:modified>2023-10-10T15:30:00Z</dcterms:modified><dcterms:created>garbage</dcterms:created></cp:coreProperties>"#,
        )
        .unwrap();
        let props = CoreProperties::new(&root).unwrap();
        assert_eq!(props.title(), Some("Report"));
        assert_eq!(props.author(), Some(""));
        assert_eq!(props.text(TextProperty::Keywords), None);
        assert_eq!(props.revision(), 0);
        assert_eq!(props.modified().unwrap().hour(), 15);
        assert!(props.created().is_none());
    }

    #[test]
    fn test_write_properties() {
        let mut props = CoreProperties::new_root();
        props.set_title("Quarterly").unwrap();
        props.set_title("Annual").unwrap();
        props.set_revision(3).unwrap();
        props.set_created(Utc.with_ymd_and_hms(2024, 2, 29, 8, 5, 0).unwrap());

        assert_eq!(props.title(), Some("Annual"));
        assert_eq!(props.revision(), 3);
        let xml = to_xml_string(props.element());
        assert!(
            xml.contains(r#"<dcterms:created xsi:type="dcterms:W3CDTF">2024-02-29T08:05:00Z</dcterms:created>"#),
            "{}",
            xml
        );
        assert_eq!(props.element().children().len(), 3);
    }

    #[test]
    fn test_domain_errors() {
        let mut props = CoreProperties::new_root();
        let long = "x".repeat(256);
        assert!(matches!(
            props.set_text(TextProperty::Subject, &long),
            Err(OoxmlError::InvalidValue(_))
        ));
        props.set_text(TextProperty::Subject, &long[..255]).unwrap();
        assert!(matches!(props.set_revision(0), Err(OoxmlError::InvalidValue(_))));
    }
}
