//! Physical units and unit-tagged quantities.
//!
//! Only the handful of units needed to describe image cubes are provided:
//! pixels, lengths (wavelengths), angles, times and dimensionless values.
//! Conversion is a pure rescaling between units of the same [`PhysicalKind`].

use std::fmt;
use std::ops::{Mul, Range};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors raised by unit lookup and conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// Units measure different physical kinds.
    #[error("cannot convert from '{from}' to '{to}'")]
    Incompatible {
        /// Source unit symbol.
        from: &'static str,
        /// Target unit symbol.
        to: &'static str,
    },

    /// Symbol does not name a known unit.
    #[error("unknown unit: {0}")]
    Unknown(String),
}

/// The physical kind a unit measures. Only units of equal kind convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalKind {
    /// Array pixel index.
    Pixel,
    /// Distance or wavelength.
    Length,
    /// Plane angle.
    Angle,
    /// Duration.
    Time,
    /// Pure number.
    Dimensionless,
}

/// A unit of measure: a symbol, its kind and its size relative to the
/// kind's base unit (m, rad, s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    symbol: &'static str,
    kind: PhysicalKind,
    scale: f64,
}

pub const PIXEL: Unit = Unit::new("pix", PhysicalKind::Pixel, 1.0);
pub const METER: Unit = Unit::new("m", PhysicalKind::Length, 1.0);
pub const NANOMETER: Unit = Unit::new("nm", PhysicalKind::Length, 1e-9);
pub const ANGSTROM: Unit = Unit::new("Angstrom", PhysicalKind::Length, 1e-10);
pub const RADIAN: Unit = Unit::new("rad", PhysicalKind::Angle, 1.0);
pub const DEGREE: Unit = Unit::new("deg", PhysicalKind::Angle, std::f64::consts::PI / 180.0);
pub const ARCSEC: Unit = Unit::new("arcsec", PhysicalKind::Angle, std::f64::consts::PI / 648_000.0);
pub const SECOND: Unit = Unit::new("s", PhysicalKind::Time, 1.0);
pub const MINUTE: Unit = Unit::new("min", PhysicalKind::Time, 60.0);
pub const HOUR: Unit = Unit::new("h", PhysicalKind::Time, 3600.0);
pub const DIMENSIONLESS: Unit = Unit::new("", PhysicalKind::Dimensionless, 1.0);

const KNOWN_UNITS: [Unit; 11] = [
    PIXEL,
    METER,
    NANOMETER,
    ANGSTROM,
    RADIAN,
    DEGREE,
    ARCSEC,
    SECOND,
    MINUTE,
    HOUR,
    DIMENSIONLESS,
];

impl Unit {
    const fn new(symbol: &'static str, kind: PhysicalKind, scale: f64) -> Self {
        Self {
            symbol,
            kind,
            scale,
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn kind(&self) -> PhysicalKind {
        self.kind
    }

    /// Check whether values in this unit can be converted to `other`.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.kind == other.kind
    }

    /// Convert a raw value expressed in `self` into `target`.
    ///
    /// Converting to the same unit returns the value untouched, so repeated
    /// conversions never accumulate rounding error.
    pub fn convert(&self, value: f64, target: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(target) {
            return Err(UnitError::Incompatible {
                from: self.symbol,
                to: target.symbol,
            });
        }
        if self == target {
            return Ok(value);
        }
        Ok(value * self.scale / target.scale)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = match s.trim() {
            "pixel" | "pixels" => "pix",
            "meter" | "meters" => "m",
            "angstrom" | "AA" => "Angstrom",
            "degree" | "degrees" => "deg",
            "second" | "seconds" => "s",
            other => other,
        };
        KNOWN_UNITS
            .iter()
            .find(|unit| unit.symbol == canonical)
            .copied()
            .ok_or_else(|| UnitError::Unknown(s.to_string()))
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.symbol)
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(d)?;
        symbol.parse().map_err(serde::de::Error::custom)
    }
}

/// A scalar value tagged with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Express this quantity in another unit.
    pub fn to(&self, unit: &Unit) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(self.unit.convert(self.value, unit)?, *unit))
    }

    /// The raw value of this quantity expressed in `unit`.
    pub fn value_in(&self, unit: &Unit) -> Result<f64, UnitError> {
        self.unit.convert(self.value, unit)
    }

    /// Add two quantities, returning the sum in `self`'s unit.
    pub fn try_add(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(
            self.value + other.value_in(&self.unit)?,
            self.unit,
        ))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.symbol.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

impl Mul<Unit> for f64 {
    type Output = Quantity;

    fn mul(self, unit: Unit) -> Quantity {
        Quantity::new(self, unit)
    }
}

/// Values of an extra coordinate: either unit-tagged or plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValues {
    /// A sequence of values sharing one unit.
    Quantity { values: Vec<f64>, unit: Unit },
    /// A sequence of unitless values.
    Plain(Vec<f64>),
}

impl CoordinateValues {
    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// The raw numbers, without their unit.
    pub fn values(&self) -> &[f64] {
        match self {
            CoordinateValues::Quantity { values, .. } => values,
            CoordinateValues::Plain(values) => values,
        }
    }

    pub fn unit(&self) -> Option<Unit> {
        match self {
            CoordinateValues::Quantity { unit, .. } => Some(*unit),
            CoordinateValues::Plain(_) => None,
        }
    }

    /// A contiguous sub-sequence, clamped to the available values.
    pub fn slice(&self, range: Range<usize>) -> CoordinateValues {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.with_values(self.values()[start..end].to_vec())
    }

    /// The values at the given positions, in order.
    pub(crate) fn take(&self, indices: &[usize]) -> CoordinateValues {
        let values = self.values();
        self.with_values(indices.iter().map(|&i| values[i]).collect())
    }

    fn with_values(&self, values: Vec<f64>) -> CoordinateValues {
        match self {
            CoordinateValues::Quantity { unit, .. } => CoordinateValues::Quantity {
                values,
                unit: *unit,
            },
            CoordinateValues::Plain(_) => CoordinateValues::Plain(values),
        }
    }
}

impl From<Vec<f64>> for CoordinateValues {
    fn from(values: Vec<f64>) -> Self {
        CoordinateValues::Plain(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_same_unit_is_exact() {
        let v = 0.1 + 0.2;
        assert_eq!(DEGREE.convert(v, &DEGREE).unwrap(), v);
    }

    #[test]
    fn test_convert_angles() {
        let deg = ARCSEC.convert(3600.0, &DEGREE).unwrap();
        assert!((deg - 1.0).abs() < 1e-12);

        let rad = DEGREE.convert(180.0, &RADIAN).unwrap();
        assert!((rad - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_convert_wavelengths() {
        let nm = ANGSTROM.convert(6563.0, &NANOMETER).unwrap();
        assert!((nm - 656.3).abs() < 1e-9);
    }

    #[test]
    fn test_incompatible_units() {
        let err = SECOND.convert(1.0, &METER).unwrap_err();
        assert_eq!(err, UnitError::Incompatible { from: "s", to: "m" });
        assert_eq!(err.to_string(), "cannot convert from 's' to 'm'");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("deg".parse::<Unit>().unwrap(), DEGREE);
        assert_eq!("pixel".parse::<Unit>().unwrap(), PIXEL);
        assert_eq!("Angstrom".parse::<Unit>().unwrap(), ANGSTROM);
        assert_eq!("".parse::<Unit>().unwrap(), DIMENSIONLESS);
        assert!(matches!("parsec".parse::<Unit>(), Err(UnitError::Unknown(_))));
    }

    #[test]
    fn test_quantity_add_converts_rhs() {
        let a = 1.0 * DEGREE;
        let b = 1800.0 * ARCSEC;
        let sum = a.try_add(&b).unwrap();
        assert_eq!(sum.unit, DEGREE);
        assert!((sum.value - 1.5).abs() < 1e-12);

        assert!(a.try_add(&(1.0 * SECOND)).is_err());
    }

    #[test]
    fn test_quantity_display() {
        assert_eq!((2.5 * NANOMETER).to_string(), "2.5 nm");
        assert_eq!((3.0 * DIMENSIONLESS).to_string(), "3");
    }

    #[test]
    fn test_coordinate_values_slice() {
        let values = CoordinateValues::Quantity {
            values: vec![0.0, 1.0, 2.0, 3.0],
            unit: SECOND,
        };
        let sliced = values.slice(1..3);
        assert_eq!(sliced.values(), &[1.0, 2.0]);
        assert_eq!(sliced.unit(), Some(SECOND));

        // Out-of-range ends clamp instead of panicking
        assert_eq!(values.slice(3..10).values(), &[3.0]);
        assert!(values.slice(5..2).is_empty());
    }

    #[test]
    fn test_plain_values_have_no_unit() {
        let values = CoordinateValues::from(vec![1.0, 2.0]);
        assert_eq!(values.unit(), None);
        assert_eq!(values.len(), 2);
    }
}
