//! Calendar [`Date`] and [`Clock`] definitions.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::DateTime;

/// `YYYY-MM-DD` representation of a [`Date`].
const FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Calendar day without a time component.
///
/// Formatted and parsed strictly as `YYYY-MM-DD`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "postgres",
    derive(postgres_types::FromSql, postgres_types::ToSql),
    postgres(transparent)
)]
pub struct Date(time::Date);

impl Date {
    /// The earliest representable [`Date`].
    pub const MIN: Self = Self(time::Date::MIN);

    /// The latest representable [`Date`].
    pub const MAX: Self = Self(time::Date::MAX);

    /// Creates a new [`Date`] out of the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Returns this [`Date`] shifted by the provided number of `days`.
    ///
    /// Saturates at [`Date::MIN`] and [`Date::MAX`].
    #[must_use]
    pub fn add_days(self, days: i64) -> Self {
        self.0
            .checked_add(time::Duration::days(days))
            .map_or(if days < 0 { Self::MIN } else { Self::MAX }, Self)
    }

    /// Returns the number of whole days from this [`Date`] until the `other`
    /// one (negative if `other` is earlier).
    #[must_use]
    pub fn days_until(self, other: Self) -> i64 {
        (other.0 - self.0).whole_days()
    }

    /// Returns the midnight [`DateTime`] (UTC) this [`Date`] starts at.
    #[must_use]
    pub fn start_of_day(self) -> DateTime {
        DateTime::from_utc(self.0.midnight().assume_utc())
    }
}

/// Returns the number of days between `start` and `end` used for pricing.
///
/// Never less than `1`: a rental is always charged for at least one day.
#[must_use]
pub fn days_between(start: Date, end: Date) -> i64 {
    start.days_until(end).max(1)
}

impl From<time::Date> for Date {
    fn from(date: time::Date) -> Self {
        Self(date)
    }
}

impl From<Date> for time::Date {
    fn from(date: Date) -> Self {
        date.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.0.format(FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl FromStr for Date {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, FORMAT).map(Self).map_err(ParseError)
    }
}

/// Error of parsing a [`Date`] from a string in a `YYYY-MM-DD` format.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid `YYYY-MM-DD` date: {_0}")]
pub struct ParseError(time::error::Parse);

/// Source of the current calendar [`Date`].
pub trait Clock {
    /// Returns today's [`Date`].
    fn today(&self) -> Date;
}

/// [`Clock`] reading the system wall clock (UTC).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        DateTime::now().date()
    }
}

/// [`Clock`] always returning the same [`Date`].
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Calendar date in a `YYYY-MM-DD` format.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = crate::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    s.parse().map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{days_between, Clock as _, Date, FixedClock};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(date("2024-03-09"), Date::from_ymd(2024, 3, 9).unwrap());
        assert_eq!(date("2024-02-29"), Date::from_ymd(2024, 2, 29).unwrap());

        assert!("2023-02-29".parse::<Date>().is_err());
        assert!("2024-3-9".parse::<Date>().is_err());
        assert!("2024/03/09".parse::<Date>().is_err());
        assert!("2024-03-09T00:00:00Z".parse::<Date>().is_err());
        assert!("".parse::<Date>().is_err());
        assert!("+202-03-09".parse::<Date>().is_err());
        assert!("2024-13-01".parse::<Date>().is_err());
        assert!("2024-04-31".parse::<Date>().is_err());
    }

    #[test]
    fn formats_as_iso() {
        assert_eq!(date("2024-03-09").to_string(), "2024-03-09");
        assert_eq!(
            Date::from_ymd(987, 1, 2).unwrap().to_string(),
            "0987-01-02",
        );
    }

    #[test]
    fn shifts_by_days() {
        assert_eq!(date("2024-02-27").add_days(3), date("2024-03-01"));
        assert_eq!(date("2024-01-02").add_days(-3), date("2023-12-30"));
        assert_eq!(Date::MAX.add_days(1), Date::MAX);
        assert_eq!(Date::MIN.add_days(-1), Date::MIN);
    }

    #[test]
    fn counts_days_between() {
        assert_eq!(days_between(date("2024-01-01"), date("2024-01-04")), 3);
        assert_eq!(days_between(date("2024-02-28"), date("2024-03-01")), 2);
        assert_eq!(days_between(date("2024-01-01"), date("2024-01-02")), 1);
    }

    #[test]
    fn days_between_is_at_least_one() {
        assert_eq!(days_between(date("2024-01-01"), date("2024-01-01")), 1);
        assert_eq!(days_between(date("2024-01-05"), date("2024-01-01")), 1);
    }

    #[test]
    fn starts_day_at_utc_midnight() {
        assert_eq!(
            date("2024-03-09").start_of_day().to_rfc3339(),
            "2024-03-09T00:00:00Z",
        );
        assert_eq!(
            date("2024-03-09").start_of_day().date(),
            date("2024-03-09"),
        );
    }

    #[test]
    fn fixed_clock_returns_its_date() {
        let clock = FixedClock(date("2030-06-15"));

        assert_eq!(clock.today(), date("2030-06-15"));
        assert_eq!(clock.today(), clock.today());
    }
}
