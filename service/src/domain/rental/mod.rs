//! [`Rental`] definitions.

pub mod availability;

use common::{
    days_between, define_kind, unit, Date, DateTime, DateTimeOf, Money,
};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{customer, vehicle};
#[cfg(doc)]
use crate::domain::{Customer, Vehicle};

/// Contract binding a [`Customer`] to a [`Vehicle`] for a range of dates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rental {
    /// ID of this [`Rental`].
    pub id: Id,

    /// ID of the [`Customer`] renting the [`Vehicle`].
    pub customer_id: customer::Id,

    /// ID of the rented [`Vehicle`].
    pub vehicle_id: vehicle::Id,

    /// First day of this [`Rental`].
    pub start_date: Date,

    /// Day this [`Rental`] is expected to end.
    pub estimated_end_date: Date,

    /// Day this [`Rental`] actually ended.
    ///
    /// Set only once [`Status::Completed`].
    pub actual_end_date: Option<Date>,

    /// Day this [`Rental`] was cancelled.
    ///
    /// Set only once [`Status::Cancelled`].
    pub cancellation_date: Option<Date>,

    /// [`CancellationReason`] of this [`Rental`].
    ///
    /// Set only once [`Status::Cancelled`].
    pub cancellation_reason: Option<CancellationReason>,

    /// Daily price of the [`Vehicle`] at the moment this [`Rental`] was
    /// created.
    pub reserved_daily_price: Money,

    /// Total expected to be paid for the estimated dates.
    pub estimated_total: Money,

    /// Total paid for the actual dates.
    ///
    /// Set only once [`Status::Completed`].
    pub final_total: Option<Money>,

    /// [`Status`] of this [`Rental`].
    pub status: Status,

    /// [`DateTime`] when this [`Rental`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Rental`] was updated last time.
    pub updated_at: UpdateDateTime,
}

impl Rental {
    /// Opens a new [`Rental`] of a [`Vehicle`] costing the provided
    /// `daily_price`.
    ///
    /// The new [`Rental`] is [`Status::Reserved`] if it starts after `today`,
    /// or [`Status::InProgress`] otherwise. Along with it, the
    /// [`vehicle::Status`] required by the new [`Rental`] is returned, if any.
    ///
    /// # Errors
    ///
    /// If the `estimated_end_date` is not after the `start_date`.
    pub fn open(
        customer_id: customer::Id,
        vehicle_id: vehicle::Id,
        start_date: Date,
        estimated_end_date: Date,
        daily_price: Money,
        today: Date,
    ) -> Result<(Self, Option<vehicle::Status>), TransitionError> {
        if estimated_end_date <= start_date {
            return Err(TransitionError::EndNotAfterStart {
                start: start_date,
                end: estimated_end_date,
            });
        }

        let status = Status::scheduled(start_date, today);
        let now = DateTime::now();
        let rental = Self {
            id: Id::new(),
            customer_id,
            vehicle_id,
            start_date,
            estimated_end_date,
            actual_end_date: None,
            cancellation_date: None,
            cancellation_reason: None,
            reserved_daily_price: daily_price.round(),
            estimated_total: daily_price
                .times(days_between(start_date, estimated_end_date)),
            final_total: None,
            status,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let vehicle_status = (status == Status::InProgress)
            .then_some(vehicle::Status::Unavailable);
        Ok((rental, vehicle_status))
    }

    /// Returns the day this [`Rental`] ends: the actual one, if it has ended,
    /// or the estimated one otherwise.
    #[must_use]
    pub fn effective_end_date(&self) -> Date {
        self.actual_end_date.unwrap_or(self.estimated_end_date)
    }

    /// Completes this [`Rental`] on the provided `actual_end_date`, charging
    /// the [`Rental::reserved_daily_price`] for every day used.
    ///
    /// Returns the [`vehicle::Status`] the [`Vehicle`] is released to.
    ///
    /// # Errors
    ///
    /// If this [`Rental`] is not [`Status::InProgress`], or the
    /// `actual_end_date` is not after the [`Rental::start_date`]. This
    /// [`Rental`] is left untouched then.
    pub fn finalize(
        &mut self,
        actual_end_date: Date,
    ) -> Result<vehicle::Status, TransitionError> {
        use TransitionError as E;

        if self.status != Status::InProgress {
            return Err(E::NotInProgress(self.status));
        }
        if actual_end_date <= self.start_date {
            return Err(E::EndNotAfterStart {
                start: self.start_date,
                end: actual_end_date,
            });
        }

        self.status = Status::Completed;
        self.actual_end_date = Some(actual_end_date);
        self.final_total = Some(
            self.reserved_daily_price
                .times(days_between(self.start_date, actual_end_date)),
        );
        self.cancellation_date = None;
        self.cancellation_reason = None;
        self.updated_at = DateTime::now().coerce();

        Ok(vehicle::Status::Available)
    }

    /// Cancels this [`Rental`] on the provided `cancellation_date` for the
    /// provided `reason`.
    ///
    /// The [`Vehicle`] is not affected, as a [`Status::Reserved`] [`Rental`]
    /// never holds it.
    ///
    /// # Errors
    ///
    /// Checked in order: this [`Rental`] is not [`Status::Reserved`], the
    /// `cancellation_date` is not before the [`Rental::start_date`], the
    /// `reason` is missing. This [`Rental`] is left untouched then.
    pub fn cancel(
        &mut self,
        cancellation_date: Date,
        reason: Option<CancellationReason>,
    ) -> Result<(), TransitionError> {
        use TransitionError as E;

        if self.status != Status::Reserved {
            return Err(E::NotReserved(self.status));
        }
        if cancellation_date >= self.start_date {
            return Err(E::AlreadyStarted {
                start: self.start_date,
                cancellation: cancellation_date,
            });
        }
        let reason = reason.ok_or(E::ReasonRequired)?;

        self.status = Status::Cancelled;
        self.cancellation_date = Some(cancellation_date);
        self.cancellation_reason = Some(reason);
        self.actual_end_date = None;
        self.final_total = None;
        self.updated_at = DateTime::now().coerce();

        Ok(())
    }

    /// Brings the [`Status`] of this non-terminal [`Rental`] in line with the
    /// `today` date.
    ///
    /// Returns the [`vehicle::Status`] required by the corrected [`Rental`],
    /// or [`None`] if nothing was corrected.
    pub fn normalize(&mut self, today: Date) -> Option<vehicle::Status> {
        if self.status.is_terminal() {
            return None;
        }

        let expected = Status::scheduled(self.start_date, today);
        if self.status == expected {
            return None;
        }

        self.status = expected;
        self.updated_at = DateTime::now().coerce();

        Some(match expected {
            Status::InProgress => vehicle::Status::Unavailable,
            Status::Reserved | Status::Completed | Status::Cancelled => {
                vehicle::Status::Available
            }
        })
    }
}

/// Error of a [`Rental`] transition.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum TransitionError {
    /// [`Rental`] end date is not after its start date.
    #[display("end date {end} must be after start date {start}")]
    EndNotAfterStart {
        /// Start date of the [`Rental`].
        start: Date,

        /// Requested end date.
        end: Date,
    },

    /// [`Rental`] is expected to be [`Status::InProgress`].
    #[display("`Rental` is {_0}, not IN_PROGRESS")]
    NotInProgress(#[error(not(source))] Status),

    /// [`Rental`] is expected to be [`Status::Reserved`].
    #[display("`Rental` is {_0}, not RESERVED")]
    NotReserved(#[error(not(source))] Status),

    /// [`Rental`] cannot be cancelled on or after its start date.
    #[display(
        "`Rental` starting on {start} cannot be cancelled on {cancellation}"
    )]
    AlreadyStarted {
        /// Start date of the [`Rental`].
        start: Date,

        /// Requested cancellation date.
        cancellation: Date,
    },

    /// [`CancellationReason`] is required to cancel a [`Rental`].
    #[display("cancellation reason is required")]
    ReasonRequired,
}

/// ID of a [`Rental`].
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

define_kind! {
    #[doc = "Status of a [`Rental`]."]
    enum Status {
        #[doc = "[`Rental`] awaits its start date."]
        Reserved = 1,

        #[doc = "[`Rental`] has started and holds its [`Vehicle`]."]
        InProgress = 2,

        #[doc = "[`Rental`] has ended and was charged."]
        Completed = 3,

        #[doc = "[`Rental`] was cancelled before its start."]
        Cancelled = 4,
    }
}

impl Status {
    /// Returns the [`Status`] a non-terminal [`Rental`] starting on the
    /// `start_date` has on the `today` date.
    #[must_use]
    pub fn scheduled(start_date: Date, today: Date) -> Self {
        if start_date > today {
            Self::Reserved
        } else {
            Self::InProgress
        }
    }

    /// Indicates whether a [`Rental`] in this [`Status`] can never change
    /// anymore.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Reason of a [`Rental`] cancellation.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct CancellationReason(String);

impl CancellationReason {
    /// Maximum number of characters in a [`CancellationReason`].
    pub const MAX_LEN: usize = 250;

    /// Creates a new [`CancellationReason`] out of the given `reason`, trimming
    /// it.
    ///
    /// [`None`] is returned if the trimmed `reason` is empty or longer than
    /// [`CancellationReason::MAX_LEN`].
    #[must_use]
    pub fn new(reason: impl AsRef<str>) -> Option<Self> {
        let reason = reason.as_ref().trim();
        Self::check(reason).then(|| Self(reason.to_owned()))
    }

    /// Checks whether the given trimmed `reason` is a valid
    /// [`CancellationReason`].
    fn check(reason: &str) -> bool {
        !reason.is_empty() && reason.chars().count() <= Self::MAX_LEN
    }
}

impl FromStr for CancellationReason {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `CancellationReason`")
    }
}

/// [`DateTime`] when a [`Rental`] was created.
pub type CreationDateTime = DateTimeOf<(Rental, unit::Creation)>;

/// [`DateTime`] when a [`Rental`] was updated last time.
pub type UpdateDateTime = DateTimeOf<(Rental, unit::Update)>;

#[cfg(test)]
mod spec {
    use common::{Date, Money};

    use crate::domain::{customer, vehicle};

    use super::{CancellationReason, Rental, Status, TransitionError};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn open(start: &str, end: &str, today: &str) -> Rental {
        Rental::open(
            customer::Id::new(),
            vehicle::Id::new(),
            date(start),
            date(end),
            money("50"),
            date(today),
        )
        .unwrap()
        .0
    }

    fn reason(s: &str) -> Option<CancellationReason> {
        CancellationReason::new(s)
    }

    mod open {
        use super::{date, money, open, Rental, Status, TransitionError};
        use crate::domain::{customer, vehicle};

        #[test]
        fn reserves_future_rental() {
            let (rental, vehicle_status) = Rental::open(
                customer::Id::new(),
                vehicle::Id::new(),
                date("2024-06-06"),
                date("2024-06-09"),
                money("50"),
                date("2024-06-01"),
            )
            .unwrap();

            assert_eq!(rental.status, Status::Reserved);
            assert_eq!(vehicle_status, None);
            assert_eq!(rental.estimated_total, money("150.00"));
            assert_eq!(rental.reserved_daily_price, money("50.00"));
            assert_eq!(rental.final_total, None);
            assert_eq!(rental.created_at, rental.updated_at.coerce());
        }

        #[test]
        fn starts_rental_from_today_or_past() {
            for start in ["2024-06-01", "2024-05-20"] {
                let (rental, vehicle_status) = Rental::open(
                    customer::Id::new(),
                    vehicle::Id::new(),
                    date(start),
                    date("2024-06-04"),
                    money("50"),
                    date("2024-06-01"),
                )
                .unwrap();

                assert_eq!(rental.status, Status::InProgress);
                assert_eq!(vehicle_status, Some(vehicle::Status::Unavailable));
            }
        }

        #[test]
        fn rounds_price_snapshot_and_total() {
            let (rental, _) = Rental::open(
                customer::Id::new(),
                vehicle::Id::new(),
                date("2024-06-10"),
                date("2024-06-13"),
                money("33.335"),
                date("2024-06-01"),
            )
            .unwrap();

            assert_eq!(rental.reserved_daily_price, money("33.34"));
            assert_eq!(rental.estimated_total, money("100.01"));
        }

        #[test]
        fn rejects_non_increasing_dates() {
            for end in ["2024-06-10", "2024-06-09"] {
                let err = Rental::open(
                    customer::Id::new(),
                    vehicle::Id::new(),
                    date("2024-06-10"),
                    date(end),
                    money("50"),
                    date("2024-06-01"),
                )
                .unwrap_err();

                assert_eq!(
                    err,
                    TransitionError::EndNotAfterStart {
                        start: date("2024-06-10"),
                        end: date(end),
                    },
                );
            }
        }

        #[test]
        fn effective_end_is_estimate_until_finalized() {
            let rental = open("2024-06-10", "2024-06-13", "2024-06-01");

            assert_eq!(rental.effective_end_date(), date("2024-06-13"));
        }
    }

    mod finalize {
        use super::{date, money, open, vehicle, Status, TransitionError};

        #[test]
        fn completes_in_progress_rental() {
            let mut rental = open("2024-06-01", "2024-06-04", "2024-06-01");

            let released = rental.finalize(date("2024-06-06")).unwrap();

            assert_eq!(released, vehicle::Status::Available);
            assert_eq!(rental.status, Status::Completed);
            assert_eq!(rental.actual_end_date, Some(date("2024-06-06")));
            assert_eq!(rental.final_total, Some(money("250.00")));
            assert_eq!(rental.effective_end_date(), date("2024-06-06"));
            assert_eq!(rental.cancellation_date, None);
            assert_eq!(rental.cancellation_reason, None);
        }

        #[test]
        fn charges_at_least_one_day() {
            let mut rental = open("2024-06-01", "2024-06-04", "2024-06-01");

            _ = rental.finalize(date("2024-06-02")).unwrap();

            assert_eq!(rental.final_total, Some(money("50.00")));
        }

        #[test]
        fn fails_unless_in_progress() {
            let reserved = open("2024-06-10", "2024-06-13", "2024-06-01");

            let mut completed = open("2024-06-01", "2024-06-04", "2024-06-01");
            _ = completed.finalize(date("2024-06-04")).unwrap();

            let mut cancelled = reserved.clone();
            cancelled
                .cancel(date("2024-06-02"), super::reason("no longer needed"))
                .unwrap();

            for rental in [reserved, completed, cancelled] {
                let mut attempted = rental.clone();

                assert_eq!(
                    attempted.finalize(date("2024-06-20")),
                    Err(TransitionError::NotInProgress(rental.status)),
                );
                assert_eq!(attempted, rental);
            }
        }

        #[test]
        fn fails_if_end_not_after_start() {
            let rental = open("2024-06-01", "2024-06-04", "2024-06-01");
            let mut attempted = rental.clone();

            assert!(matches!(
                attempted.finalize(date("2024-06-01")),
                Err(TransitionError::EndNotAfterStart { .. }),
            ));
            assert_eq!(attempted, rental);
        }
    }

    mod cancel {
        use super::{date, open, reason, Status, TransitionError};

        #[test]
        fn cancels_reserved_rental() {
            let mut rental = open("2024-06-10", "2024-06-13", "2024-06-01");

            rental
                .cancel(date("2024-06-03"), reason("  customer request "))
                .unwrap();

            assert_eq!(rental.status, Status::Cancelled);
            assert_eq!(rental.cancellation_date, Some(date("2024-06-03")));
            assert_eq!(
                rental.cancellation_reason.as_ref().map(AsRef::as_ref),
                Some("customer request"),
            );
            assert_eq!(rental.final_total, None);
            assert_eq!(rental.actual_end_date, None);
        }

        #[test]
        fn fails_unless_reserved() {
            let in_progress = open("2024-06-01", "2024-06-04", "2024-06-01");
            let mut attempted = in_progress.clone();

            assert_eq!(
                attempted.cancel(date("2024-05-01"), reason("late")),
                Err(TransitionError::NotReserved(Status::InProgress)),
            );
            assert_eq!(attempted, in_progress);
        }

        #[test]
        fn fails_on_or_after_start() {
            let rental = open("2024-06-10", "2024-06-13", "2024-06-01");

            for on in ["2024-06-10", "2024-06-11"] {
                let mut attempted = rental.clone();

                assert_eq!(
                    attempted.cancel(date(on), reason("too late")),
                    Err(TransitionError::AlreadyStarted {
                        start: date("2024-06-10"),
                        cancellation: date(on),
                    }),
                );
                assert_eq!(attempted, rental);
            }
        }

        #[test]
        fn requires_reason_after_other_checks() {
            let rental = open("2024-06-10", "2024-06-13", "2024-06-01");
            let mut attempted = rental.clone();

            assert_eq!(
                attempted.cancel(date("2024-06-02"), reason("   ")),
                Err(TransitionError::ReasonRequired),
            );
            assert_eq!(
                attempted.cancel(date("2024-06-12"), None),
                Err(TransitionError::AlreadyStarted {
                    start: date("2024-06-10"),
                    cancellation: date("2024-06-12"),
                }),
            );
            assert_eq!(attempted, rental);
        }
    }

    mod normalize {
        use super::{date, open, reason, vehicle, Status};

        #[test]
        fn starts_reserved_rental_once_due() {
            let mut rental = open("2024-06-10", "2024-06-13", "2024-06-01");

            assert_eq!(
                rental.normalize(date("2024-06-10")),
                Some(vehicle::Status::Unavailable),
            );
            assert_eq!(rental.status, Status::InProgress);
        }

        #[test]
        fn reserves_again_rental_not_yet_due() {
            let mut rental = open("2024-06-10", "2024-06-13", "2024-06-10");
            assert_eq!(rental.status, Status::InProgress);

            assert_eq!(
                rental.normalize(date("2024-06-09")),
                Some(vehicle::Status::Available),
            );
            assert_eq!(rental.status, Status::Reserved);
        }

        #[test]
        fn is_idempotent() {
            let mut rental = open("2024-06-10", "2024-06-13", "2024-06-01");

            _ = rental.normalize(date("2024-06-11"));
            let once = rental.clone();

            assert_eq!(rental.normalize(date("2024-06-11")), None);
            assert_eq!(rental, once);
        }

        #[test]
        fn keeps_terminal_rentals() {
            let mut completed = open("2024-06-01", "2024-06-04", "2024-06-01");
            _ = completed.finalize(date("2024-06-04")).unwrap();
            let mut cancelled = open("2024-06-10", "2024-06-13", "2024-06-01");
            cancelled
                .cancel(date("2024-06-02"), reason("duplicate"))
                .unwrap();

            for mut rental in [completed, cancelled] {
                let before = rental.clone();

                assert_eq!(rental.normalize(date("2023-01-01")), None);
                assert_eq!(rental.normalize(date("2030-01-01")), None);
                assert_eq!(rental, before);
            }
        }
    }

    #[test]
    fn cancellation_reason_is_trimmed_and_bounded() {
        assert_eq!(
            CancellationReason::new("  ok ").map(|r| r.to_string()),
            Some("ok".to_owned()),
        );
        assert!(CancellationReason::new("").is_none());
        assert!(CancellationReason::new(" \t ").is_none());
        assert!(CancellationReason::new("a".repeat(250)).is_some());
        assert!(CancellationReason::new("a".repeat(251)).is_none());
    }
}
