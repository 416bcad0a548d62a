//! Value objects: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity**; they are defined entirely
//! by their attribute values. Two quantities of `5` are the same quantity.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// ```ignore
/// let a = Quantity::new(5)?;
/// let b = Quantity::new(5)?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A non-negative number of vaccine units.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn new(units: i64) -> DomainResult<Self> {
        if units < 0 {
            return Err(DomainError::validation(format!(
                "quantity cannot be negative (got {units})"
            )));
        }
        Ok(Self(units))
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// `self - other`, refusing to go below zero.
    pub fn checked_sub(self, other: Quantity) -> DomainResult<Quantity> {
        if other.0 > self.0 {
            return Err(DomainError::invariant(format!(
                "cannot take {} units from {}",
                other.0, self.0
            )));
        }
        Ok(Quantity(self.0 - other.0))
    }

    pub fn checked_add(self, other: Quantity) -> DomainResult<Quantity> {
        self.0
            .checked_add(other.0)
            .map(Quantity)
            .ok_or_else(|| DomainError::invariant("quantity overflow"))
    }
}

impl ValueObject for Quantity {}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quantity::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let units = s
            .trim()
            .parse::<i64>()
            .map_err(|e| DomainError::validation(format!("quantity {s:?}: {e}")))?;
        Quantity::new(units)
    }
}

/// Date a lot was received.
///
/// Kept as the literal text from the input. It is only ever compared and stored,
/// never interpreted, so ISO `YYYY-MM-DD` strings give chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceivedDate(String);

impl ReceivedDate {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for ReceivedDate {}

impl core::fmt::Display for ReceivedDate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReceivedDate {
    fn from(value: &str) -> Self {
        ReceivedDate::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_rejects_negative_units() {
        assert!(Quantity::new(-1).is_err());
        assert_eq!(Quantity::new(0).unwrap(), Quantity::ZERO);
        assert_eq!("  12\n".parse::<Quantity>().unwrap().get(), 12);
    }

    #[test]
    fn checked_sub_never_goes_negative() {
        let five = Quantity::new(5).unwrap();
        let three = Quantity::new(3).unwrap();
        assert_eq!(five.checked_sub(three).unwrap().get(), 2);
        assert!(three.checked_sub(five).is_err());
    }

    #[test]
    fn received_dates_order_lexically() {
        let older = ReceivedDate::new("2021-01-01");
        let newer = ReceivedDate::new(" 2021-02-01\n");
        assert!(older < newer);
        assert_eq!(newer.as_str(), "2021-02-01");
    }
}
