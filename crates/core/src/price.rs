//! Fixed-point price value object.
//!
//! Prices are stored in minor units (cents) with exactly two fractional
//! digits of precision. Compared by value; immutable once constructed.

use core::fmt;
use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// A non-negative amount of money with two fractional digits.
///
/// Serialized as a decimal string (`"9.99"`); accepts either a string or a
/// JSON number on input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Build a price from minor units (cents).
    pub fn from_cents(cents: i64) -> Result<Self, DomainError> {
        if cents < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::validation("price cannot be empty"));
        }
        if s.starts_with('-') {
            return Err(DomainError::validation("price cannot be negative"));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(DomainError::validation("price must be a decimal number"));
        }
        if frac.len() > 2 {
            return Err(DomainError::validation(
                "price supports at most 2 decimal places",
            ));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation("price must be a decimal number"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| DomainError::validation("price out of range"))?
        };

        let mut frac_cents: i64 = 0;
        if !frac.is_empty() {
            frac_cents = frac
                .parse()
                .map_err(|_| DomainError::validation("price out of range"))?;
            if frac.len() == 1 {
                frac_cents *= 10;
            }
        }

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .map(Price)
            .ok_or_else(|| DomainError::validation("price out of range"))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct PriceVisitor;

impl<'de> Visitor<'de> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or number with at most 2 decimal places")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        v.parse().map_err(de::Error::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Price)
            .ok_or_else(|| de::Error::custom("price out of range"))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        if v < 0 {
            return Err(de::Error::custom("price cannot be negative"));
        }
        v.checked_mul(100)
            .map(Price)
            .ok_or_else(|| de::Error::custom("price out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        if !v.is_finite() || v < 0.0 {
            return Err(de::Error::custom("price cannot be negative"));
        }
        let cents = (v * 100.0).round();
        if cents > i64::MAX as f64 {
            return Err(de::Error::custom("price out of range"));
        }
        if ((cents / 100.0) - v).abs() > 1e-9 {
            return Err(de::Error::custom(
                "price supports at most 2 decimal places",
            ));
        }
        Ok(Price(cents as i64))
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimals() {
        assert_eq!("9.99".parse::<Price>().unwrap().cents(), 999);
        assert_eq!("10".parse::<Price>().unwrap().cents(), 1000);
        assert_eq!("0.5".parse::<Price>().unwrap().cents(), 50);
        assert_eq!(".99".parse::<Price>().unwrap().cents(), 99);
    }

    #[test]
    fn rejects_negative_and_malformed() {
        assert!("-1.00".parse::<Price>().is_err());
        assert!("1.999".parse::<Price>().is_err());
        assert!("abc".parse::<Price>().is_err());
        assert!("".parse::<Price>().is_err());
        assert!(".".parse::<Price>().is_err());
    }

    #[test]
    fn displays_two_fraction_digits() {
        assert_eq!("9.99".parse::<Price>().unwrap().to_string(), "9.99");
        assert_eq!("7".parse::<Price>().unwrap().to_string(), "7.00");
        assert_eq!("0.05".parse::<Price>().unwrap().to_string(), "0.05");
    }

    #[test]
    fn deserializes_string_or_number() {
        let from_str: Price = serde_json::from_str("\"12.34\"").unwrap();
        assert_eq!(from_str.cents(), 1234);

        let from_float: Price = serde_json::from_str("12.34").unwrap();
        assert_eq!(from_float.cents(), 1234);

        let from_int: Price = serde_json::from_str("12").unwrap();
        assert_eq!(from_int.cents(), 1200);

        assert!(serde_json::from_str::<Price>("12.345").is_err());
        assert!(serde_json::from_str::<Price>("-3").is_err());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let price: Price = "12.30".parse().unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"12.30\"");
    }
}
