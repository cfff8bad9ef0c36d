//! Exact resource quantities
//!
//! Quantities follow the Kubernetes resource quantity grammar
//! (`500m`, `4Gi`, `2k`, `1e3`) and are stored as a signed count of
//! nano-units, so arithmetic is exact for every suffix the grammar allows.

use crate::error::QuantityError;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as K8sQuantity;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// Nano-units per whole unit
const NANOS_PER_UNIT: i128 = 1_000_000_000;

/// Largest accepted decimal exponent (`1e30`) in either direction
const MAX_EXPONENT: i32 = 30;

const BINARY_SUFFIXES: &[(u32, &str)] = &[
    (60, "Ei"),
    (50, "Pi"),
    (40, "Ti"),
    (30, "Gi"),
    (20, "Mi"),
    (10, "Ki"),
];

const DECIMAL_SUFFIXES: &[(i32, &str)] = &[
    (18, "E"),
    (15, "P"),
    (12, "T"),
    (9, "G"),
    (6, "M"),
    (3, "k"),
    (0, ""),
    (-3, "m"),
    (-6, "u"),
    (-9, "n"),
];

/// Notation a quantity was written in, kept for canonical display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantityFormat {
    /// `k`, `M`, `G`, `m`, ... or no suffix
    #[default]
    DecimalSI,
    /// `Ki`, `Mi`, `Gi`, ...
    BinarySI,
    /// `1e3`, `5E-3`
    DecimalExponent,
}

/// An exact, arbitrary-suffix resource quantity
///
/// Equality, ordering and hashing look at the value only, so `1Gi` and
/// `1073741824` compare equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quantity {
    nanos: i128,
    format: QuantityFormat,
}

impl Quantity {
    /// The zero quantity
    pub const fn zero() -> Self {
        Self {
            nanos: 0,
            format: QuantityFormat::DecimalSI,
        }
    }

    /// Whole units in decimal notation (`4` cpus, `2` devices)
    pub const fn from_units(units: i64) -> Self {
        Self {
            nanos: units as i128 * NANOS_PER_UNIT,
            format: QuantityFormat::DecimalSI,
        }
    }

    /// Thousandths of a unit (`500m`)
    pub const fn from_millis(millis: i64) -> Self {
        Self {
            nanos: millis as i128 * 1_000_000,
            format: QuantityFormat::DecimalSI,
        }
    }

    /// Whole units rendered with binary suffixes (bytes of memory)
    pub const fn from_bytes(bytes: i64) -> Self {
        Self {
            nanos: bytes as i128 * NANOS_PER_UNIT,
            format: QuantityFormat::BinarySI,
        }
    }

    /// Raw value in nano-units
    pub fn nanos(&self) -> i128 {
        self.nanos
    }

    pub fn format(&self) -> QuantityFormat {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    pub fn is_negative(&self) -> bool {
        self.nanos < 0
    }

    /// Value in thousandths of a unit, rounded up
    pub fn milli_value(&self) -> i128 {
        let per_milli = 1_000_000;
        if self.nanos >= 0 {
            (self.nanos + per_milli - 1) / per_milli
        } else {
            self.nanos / per_milli
        }
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nanos.cmp(&other.nanos)
    }
}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nanos.hash(state);
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        if self.nanos == 0 {
            self.format = rhs.format;
        }
        self.nanos = self.nanos.saturating_add(rhs.nanos);
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Quantity) {
        if self.nanos == 0 {
            self.format = rhs.format;
        }
        self.nanos = self.nanos.saturating_sub(rhs.nanos);
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(mut self, rhs: Quantity) -> Quantity {
        self += rhs;
        self
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(mut self, rhs: Quantity) -> Quantity {
        self -= rhs;
        self
    }
}

/// Decimal exponent, binary exponent and notation for a suffix
fn parse_suffix(suffix: &str) -> Option<(i32, u32, QuantityFormat)> {
    use QuantityFormat::*;

    let parsed = match suffix {
        "" => (0, 0, DecimalSI),
        "n" => (-9, 0, DecimalSI),
        "u" => (-6, 0, DecimalSI),
        "m" => (-3, 0, DecimalSI),
        "k" => (3, 0, DecimalSI),
        "M" => (6, 0, DecimalSI),
        "G" => (9, 0, DecimalSI),
        "T" => (12, 0, DecimalSI),
        "P" => (15, 0, DecimalSI),
        "E" => (18, 0, DecimalSI),
        "Ki" => (0, 10, BinarySI),
        "Mi" => (0, 20, BinarySI),
        "Gi" => (0, 30, BinarySI),
        "Ti" => (0, 40, BinarySI),
        "Pi" => (0, 50, BinarySI),
        "Ei" => (0, 60, BinarySI),
        _ => {
            let exponent = suffix.strip_prefix(|c: char| c == 'e' || c == 'E')?;
            let value: i32 = exponent.parse().ok()?;
            if value.abs() > MAX_EXPONENT {
                return None;
            }
            (value, 0, DecimalExponent)
        }
    };

    Some(parsed)
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }
        let invalid = || QuantityError::Invalid(s.to_string());
        let out_of_range = || QuantityError::OutOfRange(s.to_string());

        let (negative, unsigned) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let number_end = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(number_end);
        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
            return Err(invalid());
        }

        let (exp10, exp2, format) = parse_suffix(suffix).ok_or_else(invalid)?;

        let mut mantissa: i128 = 0;
        for digit in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(digit - b'0')))
                .ok_or_else(out_of_range)?;
        }

        let numerator = mantissa
            .checked_mul(1i128 << exp2)
            .ok_or_else(out_of_range)?;

        // shift the mantissa into nano-units, accounting for the fractional digits
        let shift = 9 + exp10 - frac_part.len() as i32;
        let magnitude = if shift >= 0 {
            10i128
                .checked_pow(shift as u32)
                .and_then(|scale| numerator.checked_mul(scale))
                .ok_or_else(out_of_range)?
        } else {
            let divisor = 10i128
                .checked_pow(shift.unsigned_abs())
                .ok_or_else(out_of_range)?;
            // sub-nano precision rounds up
            numerator / divisor + i128::from(numerator % divisor != 0)
        };

        Ok(Self {
            nanos: if negative { -magnitude } else { magnitude },
            format,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return f.write_str("0");
        }
        let sign = if self.nanos < 0 { "-" } else { "" };
        let magnitude = self.nanos.unsigned_abs();
        let per_unit = NANOS_PER_UNIT as u128;

        if self.format == QuantityFormat::BinarySI && magnitude % per_unit == 0 {
            let units = magnitude / per_unit;
            for &(shift, suffix) in BINARY_SUFFIXES {
                if units % (1u128 << shift) == 0 {
                    return write!(f, "{}{}{}", sign, units >> shift, suffix);
                }
            }
        }

        for &(exp, suffix) in DECIMAL_SUFFIXES {
            let divisor = 10u128.pow((9 + exp) as u32);
            if magnitude % divisor != 0 {
                continue;
            }
            let value = magnitude / divisor;
            return match self.format {
                QuantityFormat::DecimalExponent if exp != 0 => {
                    write!(f, "{}{}e{}", sign, value, exp)
                }
                _ => write!(f, "{}{}{}", sign, value, suffix),
            };
        }

        write!(f, "{}{}n", sign, magnitude)
    }
}

impl TryFrom<&K8sQuantity> for Quantity {
    type Error = QuantityError;

    fn try_from(value: &K8sQuantity) -> Result<Self, Self::Error> {
        value.0.parse()
    }
}

impl From<Quantity> for K8sQuantity {
    fn from(value: Quantity) -> Self {
        K8sQuantity(value.to_string())
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl<'de> Visitor<'de> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a resource quantity string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                Ok(Quantity::from_units(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                i64::try_from(v)
                    .map(Quantity::from_units)
                    .map_err(|_| E::custom(format!("quantity {} is out of range", v)))
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}
