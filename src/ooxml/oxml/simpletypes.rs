//! Codecs between XML attribute strings and typed values.
//!
//! Each schema simple type is a zero-sized marker implementing [`SimpleType`].
//! Reading is strict: a string the type does not accept is an
//! [`OoxmlError::InvalidXml`]. Writing first validates the value and reports
//! anything out of range as [`OoxmlError::InvalidValue`].

use std::fmt;
use std::marker::PhantomData;

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::shared::{ColorValue, Length, RGBColor};

pub trait SimpleType {
    type Value: Clone + PartialEq + fmt::Debug;

    fn from_xml(s: &str) -> Result<Self::Value>;

    fn to_xml(value: &Self::Value) -> Result<String> {
        Self::validate(value)?;
        Ok(Self::render(value))
    }

    fn validate(_value: &Self::Value) -> Result<()> {
        Ok(())
    }

    fn render(value: &Self::Value) -> String;
}

/// A closed set of string tokens, such as `w:orient` or `w:vMerge/@w:val`.
pub trait XmlEnum: Copy + PartialEq + fmt::Debug + 'static {
    const MEMBERS: &'static [Self];

    fn to_xml(self) -> &'static str;

    fn from_xml(s: &str) -> Option<Self> {
        Self::MEMBERS.iter().copied().find(|m| m.to_xml() == s)
    }
}

fn invalid(type_name: &str, s: &str) -> OoxmlError {
    OoxmlError::InvalidXml(format!("'{}' is not a valid {} value", s, type_name))
}

fn parse_integer(type_name: &str, s: &str) -> Result<i64> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    atoi_simd::parse::<i64>(digits.as_bytes()).map_err(|_| invalid(type_name, s))
}

fn check_range(type_name: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(OoxmlError::InvalidValue(format!(
            "{} value must be in range {} to {} inclusive, got {}",
            type_name, min, max, value
        )));
    }
    Ok(())
}

fn render_int(value: i64) -> String {
    let mut buf = itoa::Buffer::new();
    buf.format(value).to_string()
}

macro_rules! bounded_int {
    ($(#[$meta:meta])* $name:ident, $xsd:literal, $min:expr, $max:expr) => {
        $(#[$meta])*
        pub struct $name;

        impl SimpleType for $name {
            type Value = i64;

            fn from_xml(s: &str) -> Result<i64> {
                let value = parse_integer($xsd, s)?;
                if value < $min || value > $max {
                    return Err(invalid($xsd, s));
                }
                Ok(value)
            }

            fn validate(value: &i64) -> Result<()> {
                check_range($xsd, *value, $min, $max)
            }

            fn render(value: &i64) -> String {
                render_int(*value)
            }
        }
    };
}

bounded_int!(XsdInt, "xsd:int", i32::MIN as i64, i32::MAX as i64);
bounded_int!(XsdLong, "xsd:long", i64::MIN, i64::MAX);
bounded_int!(XsdUnsignedInt, "xsd:unsignedInt", 0, u32::MAX as i64);

/// `ST_DecimalNumber` is an `xsd:int`.
pub type StDecimalNumber = XsdInt;

pub struct XsdUnsignedLong;

impl SimpleType for XsdUnsignedLong {
    type Value = u64;

    fn from_xml(s: &str) -> Result<u64> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        atoi_simd::parse::<u64>(digits.as_bytes()).map_err(|_| invalid("xsd:unsignedLong", s))
    }

    fn render(value: &u64) -> String {
        let mut buf = itoa::Buffer::new();
        buf.format(*value).to_string()
    }
}

/// `xsd:boolean`: accepts `1`/`0`/`true`/`false`, writes `1`/`0`.
pub struct XsdBoolean;

impl SimpleType for XsdBoolean {
    type Value = bool;

    fn from_xml(s: &str) -> Result<bool> {
        match s {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(OoxmlError::InvalidXml(format!(
                "value must be one of '1', '0', 'true' or 'false', got '{}'",
                s
            ))),
        }
    }

    fn render(value: &bool) -> String {
        if *value { "1" } else { "0" }.to_string()
    }
}

/// `ST_OnOff`: like `xsd:boolean` but also accepts `on`/`off`.
pub struct StOnOff;

impl SimpleType for StOnOff {
    type Value = bool;

    fn from_xml(s: &str) -> Result<bool> {
        match s {
            "on" => Ok(true),
            "off" => Ok(false),
            _ => XsdBoolean::from_xml(s),
        }
    }

    fn render(value: &bool) -> String {
        XsdBoolean::render(value)
    }
}

/// Any string, written unchanged. Serves `xsd:string`, `xsd:token`,
/// `ST_String` and `ST_RelationshipId`.
pub struct XsdString;

impl SimpleType for XsdString {
    type Value = String;

    fn from_xml(s: &str) -> Result<String> {
        Ok(s.to_string())
    }

    fn render(value: &String) -> String {
        value.clone()
    }
}

pub type StString = XsdString;
pub type StRelationshipId = XsdString;

/// `ST_HexColor`: six hex digits or `auto`.
pub struct StHexColor;

impl SimpleType for StHexColor {
    type Value = ColorValue;

    fn from_xml(s: &str) -> Result<ColorValue> {
        if s == "auto" {
            return Ok(ColorValue::Auto);
        }
        RGBColor::from_hex(s)
            .map(ColorValue::Rgb)
            .map_err(|_| invalid("ST_HexColor", s))
    }

    fn render(value: &ColorValue) -> String {
        match value {
            ColorValue::Auto => "auto".to_string(),
            ColorValue::Rgb(rgb) => rgb.to_hex(),
        }
    }
}

/// `ST_UniversalMeasure`: a decimal number with a two-letter unit suffix,
/// `-?[0-9]+(\.[0-9]+)?(mm|cm|in|pt|pc|pi)`.
pub struct StUniversalMeasure;

impl StUniversalMeasure {
    fn emus_per_unit(unit: &str) -> Option<i64> {
        match unit {
            "mm" => Some(Length::EMUS_PER_MM),
            "cm" => Some(Length::EMUS_PER_CM),
            "in" => Some(Length::EMUS_PER_INCH),
            "pt" => Some(Length::EMUS_PER_PT),
            "pc" | "pi" => Some(Length::EMUS_PER_PT * 12),
            _ => None,
        }
    }

    fn is_decimal(s: &str) -> bool {
        let unsigned = s.strip_prefix('-').unwrap_or(s);
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (unsigned, None),
        };
        !int_part.is_empty()
            && int_part.bytes().all(|b| b.is_ascii_digit())
            && frac_part.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
    }

    /// True when `s` carries a unit suffix and should be read as a universal measure.
    fn has_unit(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'i' | b'm' | b'p' | b'c'))
    }
}

impl SimpleType for StUniversalMeasure {
    type Value = Length;

    fn from_xml(s: &str) -> Result<Length> {
        if s.len() < 3 || !s.is_char_boundary(s.len() - 2) {
            return Err(invalid("ST_UniversalMeasure", s));
        }
        let (quantity, unit) = s.split_at(s.len() - 2);
        let emus_per_unit =
            Self::emus_per_unit(unit).ok_or_else(|| invalid("ST_UniversalMeasure", s))?;
        if !Self::is_decimal(quantity) {
            return Err(invalid("ST_UniversalMeasure", s));
        }
        let quantity: f64 =
            fast_float2::parse(quantity).map_err(|_| invalid("ST_UniversalMeasure", s))?;
        Ok(Length::from_emu((quantity * emus_per_unit as f64).round() as i64))
    }

    fn render(value: &Length) -> String {
        format!("{}pt", value.pt())
    }
}

/// `ST_TwipsMeasure`: non-negative twips, or a universal measure.
pub struct StTwipsMeasure;

impl SimpleType for StTwipsMeasure {
    type Value = Length;

    fn from_xml(s: &str) -> Result<Length> {
        if StUniversalMeasure::has_unit(s) {
            return StUniversalMeasure::from_xml(s);
        }
        let twips = parse_integer("ST_TwipsMeasure", s)?;
        if twips < 0 {
            return Err(invalid("ST_TwipsMeasure", s));
        }
        Ok(Length::from_twips(twips))
    }

    fn validate(value: &Length) -> Result<()> {
        check_range("ST_TwipsMeasure", value.twips(), 0, u32::MAX as i64)
    }

    fn render(value: &Length) -> String {
        render_int(value.twips())
    }
}

/// `ST_SignedTwipsMeasure`: twips that may be negative, or a universal measure.
pub struct StSignedTwipsMeasure;

impl SimpleType for StSignedTwipsMeasure {
    type Value = Length;

    fn from_xml(s: &str) -> Result<Length> {
        if StUniversalMeasure::has_unit(s) {
            return StUniversalMeasure::from_xml(s);
        }
        Ok(Length::from_twips(parse_integer("ST_SignedTwipsMeasure", s)?))
    }

    fn validate(value: &Length) -> Result<()> {
        check_range(
            "ST_SignedTwipsMeasure",
            value.twips(),
            i32::MIN as i64,
            i32::MAX as i64,
        )
    }

    fn render(value: &Length) -> String {
        render_int(value.twips())
    }
}

/// `ST_HpsMeasure`: font sizes in half-points, or a universal measure.
pub struct StHpsMeasure;

impl SimpleType for StHpsMeasure {
    type Value = Length;

    fn from_xml(s: &str) -> Result<Length> {
        if StUniversalMeasure::has_unit(s) {
            return StUniversalMeasure::from_xml(s);
        }
        let half_points = parse_integer("ST_HpsMeasure", s)?;
        if half_points < 0 {
            return Err(invalid("ST_HpsMeasure", s));
        }
        Ok(Length::from_half_points(half_points))
    }

    fn validate(value: &Length) -> Result<()> {
        check_range("ST_HpsMeasure", value.half_points(), 0, u32::MAX as i64)
    }

    fn render(value: &Length) -> String {
        render_int(value.half_points())
    }
}

const COORDINATE_MIN: i64 = -27_273_042_329_600;
const COORDINATE_MAX: i64 = 27_273_042_316_900;

/// `ST_Coordinate`: EMU, or a universal measure.
pub struct StCoordinate;

impl SimpleType for StCoordinate {
    type Value = Length;

    fn from_xml(s: &str) -> Result<Length> {
        if StUniversalMeasure::has_unit(s) {
            return StUniversalMeasure::from_xml(s);
        }
        let emu = parse_integer("ST_Coordinate", s)?;
        if !(COORDINATE_MIN..=COORDINATE_MAX).contains(&emu) {
            return Err(invalid("ST_Coordinate", s));
        }
        Ok(Length::from_emu(emu))
    }

    fn validate(value: &Length) -> Result<()> {
        check_range("ST_Coordinate", value.emu(), COORDINATE_MIN, COORDINATE_MAX)
    }

    fn render(value: &Length) -> String {
        render_int(value.emu())
    }
}

/// `ST_PositiveCoordinate`: non-negative EMU.
pub struct StPositiveCoordinate;

impl SimpleType for StPositiveCoordinate {
    type Value = Length;

    fn from_xml(s: &str) -> Result<Length> {
        let emu = parse_integer("ST_PositiveCoordinate", s)?;
        if !(0..=COORDINATE_MAX).contains(&emu) {
            return Err(invalid("ST_PositiveCoordinate", s));
        }
        Ok(Length::from_emu(emu))
    }

    fn validate(value: &Length) -> Result<()> {
        check_range("ST_PositiveCoordinate", value.emu(), 0, COORDINATE_MAX)
    }

    fn render(value: &Length) -> String {
        render_int(value.emu())
    }
}

/// `ST_MeasurementOrPercent`: a decimal number, a percentage or a universal measure,
/// kept as the original string.
pub struct StMeasurementOrPercent;

impl SimpleType for StMeasurementOrPercent {
    type Value = String;

    fn from_xml(s: &str) -> Result<String> {
        Self::validate(&s.to_string()).map_err(|_| invalid("ST_MeasurementOrPercent", s))?;
        Ok(s.to_string())
    }

    fn validate(value: &String) -> Result<()> {
        let number = value.strip_suffix('%').unwrap_or(value);
        if StUniversalMeasure::is_decimal(number) || StUniversalMeasure::from_xml(value).is_ok() {
            return Ok(());
        }
        Err(OoxmlError::InvalidValue(format!(
            "'{}' is not a measurement or percentage",
            value
        )))
    }

    fn render(value: &String) -> String {
        value.clone()
    }
}

/// Codec for any [`XmlEnum`].
pub struct Enum<E>(PhantomData<E>);

impl<E: XmlEnum> SimpleType for Enum<E> {
    type Value = E;

    fn from_xml(s: &str) -> Result<E> {
        E::from_xml(s).ok_or_else(|| {
            let members: Vec<&str> = E::MEMBERS.iter().map(|m| m.to_xml()).collect();
            OoxmlError::InvalidXml(format!(
                "'{}' is not a valid value; expected one of: {}",
                s,
                members.join(", ")
            ))
        })
    }

    fn render(value: &E) -> String {
        value.to_xml().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_integers() {
        assert_eq!(XsdInt::from_xml("42").unwrap(), 42);
        assert_eq!(XsdInt::from_xml("-7").unwrap(), -7);
        assert_eq!(XsdInt::from_xml("+7").unwrap(), 7);
        assert!(XsdInt::from_xml("4.2").is_err());
        assert!(XsdInt::from_xml("2147483648").is_err());
        assert!(XsdUnsignedInt::from_xml("-1").is_err());
        assert_eq!(XsdUnsignedLong::from_xml("18446744073709551615").unwrap(), u64::MAX);

        let err = XsdInt::to_xml(&(i32::MAX as i64 + 1)).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidValue(_)));
        assert_eq!(XsdInt::to_xml(&-3).unwrap(), "-3");
    }

    #[test]
    fn test_booleans() {
        assert!(XsdBoolean::from_xml("true").unwrap());
        assert!(!XsdBoolean::from_xml("0").unwrap());
        assert_eq!(XsdBoolean::to_xml(&true).unwrap(), "1");
        assert!(StOnOff::from_xml("on").unwrap());
        assert!(!StOnOff::from_xml("off").unwrap());
        assert_eq!(StOnOff::to_xml(&false).unwrap(), "0");

        let err = XsdBoolean::from_xml("yes").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidXml);
        assert!(XsdBoolean::from_xml("on").is_err());
        assert!(StOnOff::from_xml("yes").is_err());
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(StHexColor::from_xml("auto").unwrap(), ColorValue::Auto);
        assert_eq!(
            StHexColor::from_xml("3c2f80").unwrap(),
            ColorValue::Rgb(RGBColor::new(0x3C, 0x2F, 0x80))
        );
        assert_eq!(
            StHexColor::to_xml(&ColorValue::Rgb(RGBColor::new(0xAB, 0, 0x1))).unwrap(),
            "AB0001"
        );
        assert!(StHexColor::from_xml("red").is_err());
    }

    #[test]
    fn test_measures() {
        assert_eq!(StTwipsMeasure::from_xml("1440").unwrap(), Length::from_inches(1.0));
        assert_eq!(StTwipsMeasure::from_xml("1in").unwrap().emu(), 914_400);
        assert_eq!(StTwipsMeasure::from_xml("2.54cm").unwrap().emu(), 914_400);
        assert_eq!(StTwipsMeasure::from_xml("12pt").unwrap().emu(), 152_400);
        assert_eq!(StTwipsMeasure::from_xml("1pc").unwrap().emu(), 152_400);
        assert!(StTwipsMeasure::from_xml("-20").is_err());
        assert_eq!(StSignedTwipsMeasure::from_xml("-20").unwrap(), Length::from_twips(-20));
        assert_eq!(StTwipsMeasure::to_xml(&Length::from_inches(1.0)).unwrap(), "1440");
        assert!(StTwipsMeasure::to_xml(&Length::from_twips(-1)).is_err());

        assert_eq!(StHpsMeasure::from_xml("24").unwrap(), Length::from_pt(12.0));
        assert_eq!(StHpsMeasure::to_xml(&Length::from_pt(10.5)).unwrap(), "21");

        assert!(StUniversalMeasure::from_xml("1.in").is_err());
        assert!(StUniversalMeasure::from_xml("in").is_err());
        assert!(StUniversalMeasure::from_xml("3px").is_err());
        assert_eq!(StUniversalMeasure::from_xml("-0.5in").unwrap().emu(), -457_200);
    }

    #[test]
    fn test_coordinates() {
        assert_eq!(StCoordinate::from_xml("914400").unwrap(), Length::from_inches(1.0));
        assert_eq!(StCoordinate::from_xml("1in").unwrap(), Length::from_inches(1.0));
        assert!(StPositiveCoordinate::from_xml("-1").is_err());
        assert!(StPositiveCoordinate::to_xml(&Length::from_emu(-1)).is_err());
    }

    #[test]
    fn test_measurement_or_percent() {
        assert_eq!(StMeasurementOrPercent::from_xml("5000").unwrap(), "5000");
        assert_eq!(StMeasurementOrPercent::from_xml("50%").unwrap(), "50%");
        assert_eq!(StMeasurementOrPercent::from_xml("2in").unwrap(), "2in");
        assert!(StMeasurementOrPercent::from_xml("wide").is_err());
    }

    proptest! {
        #[test]
        fn twips_round_trip_is_exact(twips in 0i64..=u32::MAX as i64) {
            let length = StTwipsMeasure::from_xml(&twips.to_string()).unwrap();
            prop_assert_eq!(length.emu(), twips * Length::EMUS_PER_TWIP);
            prop_assert_eq!(StTwipsMeasure::to_xml(&length).unwrap(), twips.to_string());
        }

        #[test]
        fn emu_to_twips_rounds_to_nearest(emu in 0i64..1_000_000_000) {
            let twips = Length::from_emu(emu).twips();
            let back = Length::from_twips(twips).emu();
            prop_assert!((back - emu).abs() * 2 <= Length::EMUS_PER_TWIP);
        }
    }
}
