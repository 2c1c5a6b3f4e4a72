//! Numeric coercion and unit conversion.
//!
//! Lengths and angles carry their unit until they are converted. Physical
//! length units (inches, centimetres, millimetres, points, picas) need the
//! process-wide DPI, which is installed once with [`set_dpi`] and read
//! everywhere afterwards.

use crate::error::{Result, RvgError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

static DPI: OnceLock<f64> = OnceLock::new();

/// Install the process-wide DPI.
///
/// Calling it again with the same value is a no-op; a different value is
/// rejected so the setting never changes under already-built scenes.
pub fn set_dpi(dpi: f64) -> Result<()> {
    let dpi = finite("dpi", dpi)?;
    if dpi <= 0.0 {
        return Err(RvgError::validation(format!("dpi must be > 0 ({dpi} given)")));
    }
    let installed = *DPI.get_or_init(|| dpi);
    if (installed - dpi).abs() > f64::EPSILON {
        return Err(RvgError::validation(format!(
            "dpi is already set to {installed}, cannot change it to {dpi}"
        )));
    }
    log::debug!("dpi set to {}", dpi);
    Ok(())
}

/// The configured DPI, if any.
pub fn dpi() -> Option<f64> {
    DPI.get().copied()
}

/// Reject NaN and infinities for a named argument.
pub fn finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RvgError::validation(format!("{what} must be a finite Float ({value} given)")))
    }
}

/// Reject non-finite or negative values for a named argument.
pub fn non_negative(what: &str, value: f64) -> Result<f64> {
    let value = finite(what, value)?;
    if value < 0.0 {
        return Err(RvgError::validation(format!("{what} must be >= 0 ({value} given)")));
    }
    Ok(value)
}

/// Strictly parse a Float out of a string; the error names both types.
pub fn parse_float(what: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| RvgError::validation(format!("{what}: can't convert String {text:?} into Float")))
        .and_then(|v| finite(what, v))
}

/// Unit of a [`Length`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    Px,
    In,
    Cm,
    Mm,
    Pt,
    Pc,
    Percent,
}

impl LengthUnit {
    fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::Pt => "pt",
            LengthUnit::Pc => "pc",
            LengthUnit::Percent => "%",
        }
    }

    /// Pixels per unit at the given DPI (None for relative units).
    fn pixels_per_unit(self, dpi: f64) -> Option<f64> {
        match self {
            LengthUnit::Px => Some(1.0),
            LengthUnit::In => Some(dpi),
            LengthUnit::Cm => Some(dpi / 2.54),
            LengthUnit::Mm => Some(dpi / 25.4),
            LengthUnit::Pt => Some(dpi / 72.0),
            LengthUnit::Pc => Some(dpi / 6.0),
            LengthUnit::Percent => None,
        }
    }
}

/// A length with a unit tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub const fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub const fn px(value: f64) -> Self {
        Self::new(value, LengthUnit::Px)
    }

    pub const fn inches(value: f64) -> Self {
        Self::new(value, LengthUnit::In)
    }

    pub const fn cm(value: f64) -> Self {
        Self::new(value, LengthUnit::Cm)
    }

    pub const fn mm(value: f64) -> Self {
        Self::new(value, LengthUnit::Mm)
    }

    pub const fn pt(value: f64) -> Self {
        Self::new(value, LengthUnit::Pt)
    }

    pub const fn pc(value: f64) -> Self {
        Self::new(value, LengthUnit::Pc)
    }

    pub const fn percent(value: f64) -> Self {
        Self::new(value, LengthUnit::Percent)
    }

    /// Convert to user-space pixels using the process-wide DPI.
    pub fn to_px(self) -> Result<f64> {
        let value = finite("length", self.value)?;
        if self.unit == LengthUnit::Px {
            return Ok(value);
        }
        if self.unit == LengthUnit::Percent {
            return Err(RvgError::validation(
                "a percentage length needs a reference size (use to_px_of)",
            ));
        }
        let dpi = dpi().ok_or_else(|| {
            RvgError::validation(format!(
                "dpi must be set before converting {}{}",
                value,
                self.unit.suffix()
            ))
        })?;
        // pixels_per_unit only returns None for Percent, handled above.
        Ok(value * self.unit.pixels_per_unit(dpi).unwrap_or(1.0))
    }

    /// Convert to pixels, resolving percentages against `reference`.
    pub fn to_px_of(self, reference: f64) -> Result<f64> {
        match self.unit {
            LengthUnit::Percent => Ok(finite("length", self.value)? / 100.0 * reference),
            _ => self.to_px(),
        }
    }
}

impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Length::px(value)
    }
}

impl From<i32> for Length {
    fn from(value: i32) -> Self {
        Length::px(f64::from(value))
    }
}

impl From<u32> for Length {
    fn from(value: u32) -> Self {
        Length::px(f64::from(value))
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Length {
    type Err = RvgError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        const UNITS: [(&str, LengthUnit); 7] = [
            ("px", LengthUnit::Px),
            ("in", LengthUnit::In),
            ("cm", LengthUnit::Cm),
            ("mm", LengthUnit::Mm),
            ("pt", LengthUnit::Pt),
            ("pc", LengthUnit::Pc),
            ("%", LengthUnit::Percent),
        ];
        for (suffix, unit) in UNITS {
            if let Some(number) = s.strip_suffix(suffix) {
                return Ok(Length::new(parse_float("length", number)?, unit));
            }
        }
        Ok(Length::px(parse_float("length", s)?))
    }
}

/// Unit of an [`Angle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AngleUnit {
    Deg,
    Rad,
    Grad,
}

/// An angle with a unit tag. Transforms consume degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Angle {
    pub value: f64,
    pub unit: AngleUnit,
}

impl Angle {
    pub const fn deg(value: f64) -> Self {
        Self { value, unit: AngleUnit::Deg }
    }

    pub const fn rad(value: f64) -> Self {
        Self { value, unit: AngleUnit::Rad }
    }

    pub const fn grad(value: f64) -> Self {
        Self { value, unit: AngleUnit::Grad }
    }

    pub fn to_degrees(self) -> f64 {
        match self.unit {
            AngleUnit::Deg => self.value,
            AngleUnit::Rad => self.value.to_degrees(),
            AngleUnit::Grad => self.value * 0.9,
        }
    }
}

impl From<f64> for Angle {
    fn from(value: f64) -> Self {
        Angle::deg(value)
    }
}

impl FromStr for Angle {
    type Err = RvgError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(number) = s.strip_suffix("grad") {
            return Ok(Angle::grad(parse_float("angle", number)?));
        }
        if let Some(number) = s.strip_suffix("rad") {
            return Ok(Angle::rad(parse_float("angle", number)?));
        }
        if let Some(number) = s.strip_suffix("deg") {
            return Ok(Angle::deg(parse_float("angle", number)?));
        }
        Ok(Angle::deg(parse_float("angle", s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Every test that installs a DPI uses the same value, so test order
    // cannot make set_dpi fail.
    const TEST_DPI: f64 = 90.0;

    #[test]
    fn test_px_needs_no_dpi() {
        assert!((Length::px(12.5).to_px().unwrap() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_physical_units() {
        set_dpi(TEST_DPI).unwrap();
        assert!((Length::inches(2.0).to_px().unwrap() - 180.0).abs() < 1e-9);
        assert!((Length::pt(72.0).to_px().unwrap() - 90.0).abs() < 1e-9);
        assert!((Length::pc(6.0).to_px().unwrap() - 90.0).abs() < 1e-9);
        assert!((Length::mm(25.4).to_px().unwrap() - 90.0).abs() < 1e-9);
        assert!((Length::cm(2.54).to_px().unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_dpi_cannot_change() {
        set_dpi(TEST_DPI).unwrap();
        assert!(set_dpi(TEST_DPI).is_ok());
        assert!(set_dpi(72.0).unwrap_err().is_validation());
        assert!(set_dpi(-1.0).is_err());
    }

    #[test]
    fn test_percent_needs_reference() {
        assert!(Length::percent(50.0).to_px().is_err());
        assert!((Length::percent(50.0).to_px_of(300.0).unwrap() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_length() {
        assert_eq!("10mm".parse::<Length>().unwrap(), Length::mm(10.0));
        assert_eq!(" 7 ".parse::<Length>().unwrap(), Length::px(7.0));
        assert_eq!("25%".parse::<Length>().unwrap(), Length::percent(25.0));
        let err = "tall".parse::<Length>().unwrap_err();
        assert!(err.to_string().contains("String"));
        assert!(err.to_string().contains("Float"));
    }

    #[test]
    fn test_angles() {
        assert!((Angle::rad(std::f64::consts::PI).to_degrees() - 180.0).abs() < 1e-9);
        assert!((Angle::grad(100.0).to_degrees() - 90.0).abs() < 1e-9);
        assert_eq!("1.5rad".parse::<Angle>().unwrap(), Angle::rad(1.5));
        assert_eq!("200grad".parse::<Angle>().unwrap(), Angle::grad(200.0));
        assert_eq!("45".parse::<Angle>().unwrap(), Angle::deg(45.0));
    }

    #[test]
    fn test_finite_rejects_nan() {
        assert!(finite("x", f64::NAN).is_err());
        assert!(non_negative("r", -1.0).is_err());
        assert!(non_negative("r", 0.0).is_ok());
    }
}
