//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
use rust_decimal::{Decimal, RoundingStrategy};

/// Non-negative amount of money, kept with a cent precision.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "postgres",
    derive(postgres_types::FromSql, postgres_types::ToSql),
    postgres(transparent)
)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount of [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Money`] out of the provided `amount`.
    ///
    /// [`None`] is returned if the `amount` is negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (!amount.is_sign_negative() || amount.is_zero()).then_some(Self(amount))
    }

    /// Returns the raw amount of this [`Money`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Rounds this [`Money`] to cents, with midpoints going away from zero.
    #[must_use]
    pub fn round(self) -> Self {
        Self(self.0.round_dp_with_strategy(
            2,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    /// Multiplies this [`Money`] by the provided number of `units` and rounds
    /// the result to cents.
    #[must_use]
    pub fn times(self, units: i64) -> Self {
        Self(self.0.saturating_mul(Decimal::from(units))).round()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|_| ParseError::Amount)?;
        Self::new(amount).ok_or(ParseError::Negative)
    }
}

/// Error of parsing [`Money`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseError {
    /// The string is not a decimal number.
    #[display("invalid amount")]
    Amount,

    /// The amount is negative.
    #[display("negative amount")]
    Negative,
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Non-negative amount of money in a `{major}.{minor}` format, where
    /// `minor` always has two digits on output.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Money;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(money("123.45").amount().to_string(), "123.45");
        assert_eq!(money("0").amount().to_string(), "0");
        assert_eq!(money(" 10.5 ").amount().to_string(), "10.5");

        assert!(Money::from_str("-1.00").is_err());
        assert!(Money::from_str("12,50").is_err());
        assert!(Money::from_str("").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45").to_string(), "123.45");
        assert_eq!(money("123").to_string(), "123.00");
        assert_eq!(money("123.4").to_string(), "123.40");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(money("10.005").round(), money("10.01"));
        assert_eq!(money("10.004").round(), money("10.00"));
        assert_eq!(money("0.125").round(), money("0.13"));
    }

    #[test]
    fn rounding_is_idempotent() {
        let once = money("33.335").round();

        assert_eq!(once.round(), once);
    }

    #[test]
    fn multiplies_and_rounds() {
        assert_eq!(money("45.50").times(3), money("136.50"));
        assert_eq!(money("33.333").times(3), money("100.00"));
        assert_eq!(money("19.99").times(1), money("19.99"));
        assert_eq!(money("19.99").times(0), Money::ZERO);
    }
}
