//! # Money
//!
//! Exact decimal monetary values for checkout pricing.
//!
//! Line-item arithmetic is never rounded. Only figures that leave the pricing
//! engine (shipping, discount, taxes, subtotal, total) go through
//! [`Money::round2`], which rounds half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// Number of decimal places for presented amounts
pub const PRESENTATION_SCALE: u32 = 2;

/// A monetary amount in the store currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wrap a decimal amount
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build from an integer number of cents (e.g. `1099` is 10.99)
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, PRESENTATION_SCALE))
    }

    /// Build from whole currency units
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Round to two decimal places, half away from zero
    pub fn round2(self) -> Self {
        let mut rounded = self
            .0
            .round_dp_with_strategy(PRESENTATION_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(PRESENTATION_SCALE);
        Self(rounded)
    }

    /// Multiply by a fractional rate (tax rates, percentage discounts)
    pub fn scale(self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }

    /// Clamp negative amounts to zero
    pub fn non_negative(self) -> Self {
        if self.is_negative() {
            Self::ZERO
        } else {
            self
        }
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str_exact(s.trim()).map(Self)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.round2().0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

/// Unit price times quantity
impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, qty: i64) -> Money {
        Money(self.0 * Decimal::from(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}
