//! Shared value types used by the element layer and the document API.
//!
//! Lengths are carried as an integer count of English Metric Units so that
//! conversions between the several units WordprocessingML mixes (twips,
//! half-points, EMU, universal measures) never accumulate float error.

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use crate::ooxml::error::{OoxmlError, Result};

/// Length in English Metric Units (EMU).
///
/// - 914,400 EMU = 1 inch
/// - 360,000 EMU = 1 centimeter
/// - 36,000 EMU = 1 millimeter
/// - 12,700 EMU = 1 point
/// - 6,350 EMU = 1 half-point
/// - 635 EMU = 1 twip (1/20 of a point)
///
/// # Examples
///
/// ```rust
/// use docx_opc::ooxml::shared::Length;
///
/// assert_eq!(Length::from_twips(1440), Length::from_inches(1.0));
/// assert_eq!(Length::from_pt(12.0).emu(), 152_400);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Length(i64);

impl Length {
    pub const EMUS_PER_INCH: i64 = 914_400;
    pub const EMUS_PER_CM: i64 = 360_000;
    pub const EMUS_PER_MM: i64 = 36_000;
    pub const EMUS_PER_PT: i64 = 12_700;
    pub const EMUS_PER_HALF_PT: i64 = 6_350;
    pub const EMUS_PER_TWIP: i64 = 635;

    pub const ZERO: Length = Length(0);

    #[inline]
    pub const fn from_emu(emu: i64) -> Self {
        Self(emu)
    }

    /// Exact conversion; every twip is a whole number of EMU.
    #[inline]
    pub const fn from_twips(twips: i64) -> Self {
        Self(twips.saturating_mul(Self::EMUS_PER_TWIP))
    }

    #[inline]
    pub const fn from_half_points(half_points: i64) -> Self {
        Self(half_points.saturating_mul(Self::EMUS_PER_HALF_PT))
    }

    #[inline]
    pub fn from_inches(inches: f64) -> Self {
        Self::from_scaled(inches, Self::EMUS_PER_INCH)
    }

    #[inline]
    pub fn from_cm(cm: f64) -> Self {
        Self::from_scaled(cm, Self::EMUS_PER_CM)
    }

    #[inline]
    pub fn from_mm(mm: f64) -> Self {
        Self::from_scaled(mm, Self::EMUS_PER_MM)
    }

    #[inline]
    pub fn from_pt(pt: f64) -> Self {
        Self::from_scaled(pt, Self::EMUS_PER_PT)
    }

    #[inline]
    fn from_scaled(quantity: f64, emus_per_unit: i64) -> Self {
        Self((quantity * emus_per_unit as f64).round() as i64)
    }

    #[inline]
    pub const fn emu(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn inches(self) -> f64 {
        self.0 as f64 / Self::EMUS_PER_INCH as f64
    }

    #[inline]
    pub fn cm(self) -> f64 {
        self.0 as f64 / Self::EMUS_PER_CM as f64
    }

    #[inline]
    pub fn mm(self) -> f64 {
        self.0 as f64 / Self::EMUS_PER_MM as f64
    }

    #[inline]
    pub fn pt(self) -> f64 {
        self.0 as f64 / Self::EMUS_PER_PT as f64
    }

    /// Whole twips, rounding half away from zero.
    #[inline]
    pub fn twips(self) -> i64 {
        Self::div_round(self.0, Self::EMUS_PER_TWIP)
    }

    /// Whole half-points, rounding half away from zero.
    #[inline]
    pub fn half_points(self) -> i64 {
        Self::div_round(self.0, Self::EMUS_PER_HALF_PT)
    }

    #[inline]
    fn div_round(value: i64, divisor: i64) -> i64 {
        let quotient = value / divisor;
        let remainder = value % divisor;
        if remainder.abs() * 2 >= divisor {
            quotient + value.signum()
        } else {
            quotient
        }
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Length {
        Length(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, rhs: Length) -> Length {
        Length(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Length {
    type Output = Length;

    fn neg(self) -> Length {
        Length(self.0.saturating_neg())
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}emu", self.0)
    }
}

/// RGB color value.
///
/// # Examples
///
/// ```rust
/// use docx_opc::ooxml::shared::RGBColor;
///
/// let color: RGBColor = "3C2F80".parse().unwrap();
/// assert_eq!(color, RGBColor::new(0x3C, 0x2F, 0x80));
/// assert_eq!(color.to_string(), "3C2F80");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RGBColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RGBColor {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse six hex digits, no leading `#`. Case is not significant.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(OoxmlError::InvalidValue(format!(
                "RGB color must be six hex digits, got '{}'",
                hex
            )));
        }
        let component = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| OoxmlError::InvalidValue(format!("{}: '{}'", e, hex)))
        };
        Ok(Self {
            r: component(0..2)?,
            g: component(2..4)?,
            b: component(4..6)?,
        })
    }

    /// Upper-case hex form used in `w:val` and `w:color` attributes.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for RGBColor {
    type Err = OoxmlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for RGBColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A hex color attribute value, which may also be the keyword `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorValue {
    Auto,
    Rgb(RGBColor),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        assert_eq!(Length::from_inches(1.0).emu(), 914_400);
        assert_eq!(Length::from_cm(1.0).emu(), 360_000);
        assert_eq!(Length::from_mm(2.5).emu(), 90_000);
        assert_eq!(Length::from_pt(12.0).emu(), 152_400);
        assert_eq!(Length::from_twips(1440).emu(), 914_400);
        assert_eq!(Length::from_half_points(24), Length::from_pt(12.0));
        assert!((Length::from_pt(72.0).inches() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_twips_rounding() {
        assert_eq!(Length::from_emu(635).twips(), 1);
        assert_eq!(Length::from_emu(317).twips(), 0);
        assert_eq!(Length::from_emu(318).twips(), 1);
        assert_eq!(Length::from_emu(-318).twips(), -1);
        assert_eq!(Length::from_emu(-317).twips(), 0);
    }

    #[test]
    fn test_length_arithmetic() {
        let a = Length::from_twips(100);
        let b = Length::from_twips(40);
        assert_eq!((a + b).twips(), 140);
        assert_eq!((a - b).twips(), 60);
        assert_eq!((-a).twips(), -100);
    }

    #[test]
    fn test_rgb_color() {
        let color = RGBColor::new(60, 47, 128);
        assert_eq!(color.to_hex(), "3C2F80");
        assert_eq!(RGBColor::from_hex("3c2f80").unwrap(), color);
        assert!(RGBColor::from_hex("GGGGGG").is_err());
        assert!(RGBColor::from_hex("FF00").is_err());
        assert!(RGBColor::from_hex("+F00FF").is_err());
    }
}
