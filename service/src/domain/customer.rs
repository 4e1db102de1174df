//! [`Customer`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer renting vehicles.
#[derive(Clone, Debug)]
pub struct Customer {
    /// ID of this [`Customer`].
    pub id: Id,

    /// First [`Name`]s of this [`Customer`].
    pub first_names: Name,

    /// Last [`Name`]s of this [`Customer`].
    pub last_names: Name,

    /// [`DocumentKind`] identifying this [`Customer`].
    pub document_kind: DocumentKind,

    /// [`DocumentNumber`] identifying this [`Customer`].
    pub document_number: DocumentNumber,

    /// [`Email`] of this [`Customer`].
    pub email: Email,

    /// [`Phone`] of this [`Customer`].
    pub phone: Phone,

    /// [`DateTime`] when this [`Customer`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Customer`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Personal name of a [`Customer`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.chars().count() <= 120
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

define_kind! {
    #[doc = "Kind of an identity document of a [`Customer`]."]
    enum DocumentKind {
        #[doc = "National citizenship ID."]
        CitizenId = 1,

        #[doc = "ID card of an underage citizen."]
        IdentityCard = 2,

        #[doc = "Passport."]
        Passport = 3,

        #[doc = "ID of a foreign resident."]
        ForeignerId = 4,
    }
}

/// Number of an identity document of a [`Customer`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct DocumentNumber(String);

impl DocumentNumber {
    /// Creates a new [`DocumentNumber`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`DocumentNumber`].
    fn check(number: impl AsRef<str>) -> bool {
        let number = number.as_ref();
        number.trim() == number && (4..=30).contains(&number.chars().count())
    }
}

impl FromStr for DocumentNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `DocumentNumber`")
    }
}

/// Email address of a [`Customer`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 160 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Phone number of a [`Customer`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Phone`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?[0-9][0-9\s-]{5,28}[0-9]$").expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// [`DateTime`] when a [`Customer`] was created.
pub type CreationDateTime = DateTimeOf<(Customer, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{DocumentNumber, Email, Name, Phone};

    #[test]
    fn name_is_trimmed_and_bounded() {
        assert!(Name::new("Ana María").is_some());
        assert!(Name::new(" Ana").is_none());
        assert!(Name::new("").is_none());
        assert!(Name::new("a".repeat(121)).is_none());
    }

    #[test]
    fn document_number_length() {
        assert!(DocumentNumber::new("1234").is_some());
        assert!(DocumentNumber::new("123").is_none());
        assert!(DocumentNumber::new("1".repeat(31)).is_none());
    }

    #[test]
    fn email_format() {
        assert!(Email::new("ana@example.com").is_some());
        assert!(Email::new("ana@example").is_none());
        assert!(Email::new("ana example@x.com").is_none());
    }

    #[test]
    fn phone_format() {
        assert!(Phone::new("+57 300 123 4567").is_some());
        assert!(Phone::new("3001234").is_some());
        assert!(Phone::new("12345").is_none());
        assert!(Phone::new("call me").is_none());
    }
}
