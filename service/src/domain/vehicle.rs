//! [`Vehicle`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vehicle available for rent.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// ID of this [`Vehicle`].
    pub id: Id,

    /// [`Plate`] of this [`Vehicle`].
    pub plate: Plate,

    /// [`Brand`] of this [`Vehicle`].
    pub brand: Brand,

    /// [`Model`] of this [`Vehicle`].
    pub model: Model,

    /// Manufacturing year of this [`Vehicle`].
    pub year: u16,

    /// [`Fuel`] this [`Vehicle`] runs on, if known.
    pub fuel: Option<Fuel>,

    /// Current [`Status`] of this [`Vehicle`].
    pub status: Status,

    /// Price of renting this [`Vehicle`] for a single day.
    ///
    /// [`None`] means the price was never configured, which is a data
    /// integrity problem rather than a free rent.
    pub daily_price: Option<Money>,

    /// [`DateTime`] when this [`Vehicle`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Vehicle`] was updated last time.
    pub updated_at: UpdateDateTime,
}

/// ID of a [`Vehicle`].
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

/// License plate of a [`Vehicle`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Plate(String);

impl Plate {
    /// Creates a new [`Plate`] if the given `plate` is valid.
    #[must_use]
    pub fn new(plate: impl Into<String>) -> Option<Self> {
        let plate = plate.into();
        Self::check(&plate).then_some(Self(plate))
    }

    /// Checks whether the given `plate` is a valid [`Plate`].
    fn check(plate: impl AsRef<str>) -> bool {
        let plate = plate.as_ref();
        !plate.is_empty()
            && plate.len() <= 10
            && plate.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    }
}

impl FromStr for Plate {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Plate`")
    }
}

/// Brand of a [`Vehicle`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Brand(String);

impl Brand {
    /// Creates a new [`Brand`] if the given `brand` is valid.
    #[must_use]
    pub fn new(brand: impl Into<String>) -> Option<Self> {
        let brand = brand.into();
        is_valid_label(&brand).then_some(Self(brand))
    }
}

impl FromStr for Brand {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Brand`")
    }
}

/// Model of a [`Vehicle`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Model(String);

impl Model {
    /// Creates a new [`Model`] if the given `model` is valid.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Option<Self> {
        let model = model.into();
        is_valid_label(&model).then_some(Self(model))
    }
}

impl FromStr for Model {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Model`")
    }
}

/// Checks whether the given `label` is a valid [`Brand`] or [`Model`].
fn is_valid_label(label: &str) -> bool {
    label.trim() == label && !label.is_empty() && label.chars().count() <= 80
}

define_kind! {
    #[doc = "Fuel a [`Vehicle`] runs on."]
    enum Fuel {
        #[doc = "Gasoline engine."]
        Gasoline = 1,

        #[doc = "Diesel engine."]
        Diesel = 2,

        #[doc = "Hybrid powertrain."]
        Hybrid = 3,

        #[doc = "Electric motor."]
        Electric = 4,
    }
}

define_kind! {
    #[doc = "Status of a [`Vehicle`]."]
    enum Status {
        #[doc = "[`Vehicle`] can be rented."]
        Available = 1,

        #[doc = "[`Vehicle`] is held by a rental in progress."]
        Unavailable = 2,

        #[doc = "[`Vehicle`] is being serviced."]
        InMaintenance = 3,

        #[doc = "[`Vehicle`] is taken out of the fleet."]
        Decommissioned = 4,
    }
}

impl Status {
    /// Indicates whether this [`Status`] is managed outside of rentals, so no
    /// rental transition may overwrite it.
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::InMaintenance | Self::Decommissioned)
    }

    /// Returns the [`Status`] resulting from a rental transition requiring the
    /// provided `target` one.
    ///
    /// [locked] [`Status`]es are kept untouched.
    ///
    /// [locked]: Status::is_locked
    #[must_use]
    pub const fn apply(self, target: Self) -> Self {
        if self.is_locked() {
            self
        } else {
            target
        }
    }
}

/// [`DateTime`] when a [`Vehicle`] was created.
pub type CreationDateTime = DateTimeOf<(Vehicle, unit::Creation)>;

/// [`DateTime`] when a [`Vehicle`] was updated last time.
pub type UpdateDateTime = DateTimeOf<(Vehicle, unit::Update)>;

#[cfg(test)]
mod spec {
    use super::{Plate, Status};

    #[test]
    fn locked_statuses_are_never_overwritten() {
        for target in Status::ALL {
            assert_eq!(
                Status::InMaintenance.apply(*target),
                Status::InMaintenance,
            );
            assert_eq!(
                Status::Decommissioned.apply(*target),
                Status::Decommissioned,
            );
        }
    }

    #[test]
    fn unlocked_statuses_follow_target() {
        assert_eq!(
            Status::Available.apply(Status::Unavailable),
            Status::Unavailable,
        );
        assert_eq!(
            Status::Unavailable.apply(Status::Available),
            Status::Available,
        );
        assert_eq!(
            Status::Available.apply(Status::Available),
            Status::Available,
        );
    }

    #[test]
    fn status_as_screaming_snake_case() {
        assert_eq!(Status::InMaintenance.to_string(), "IN_MAINTENANCE");
        assert_eq!(
            "DECOMMISSIONED".parse::<Status>().unwrap(),
            Status::Decommissioned,
        );
        assert!("Available".parse::<Status>().is_err());
    }

    #[test]
    fn plate_format() {
        assert!(Plate::new("ABC-123").is_some());
        assert!(Plate::new("").is_none());
        assert!(Plate::new("ABC 123").is_none());
        assert!(Plate::new("ABCDEFGHIJK").is_none());
    }
}
