//! [`Rental`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, api::scalar, Context};

/// A rental of a `Vehicle` by a `Customer`.
#[derive(Clone, Debug, From)]
pub struct Rental(domain::Rental);

/// A rental of a `Vehicle` by a `Customer`.
#[graphql_object(context = Context)]
impl Rental {
    /// Unique identifier of this `Rental`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Status of this `Rental` as of today.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `Customer` renting the `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.customer",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn customer(&self) -> api::Customer {
        api::Customer::lazy(self.0.customer_id)
    }

    /// Rented `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.vehicle",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn vehicle(&self) -> api::Vehicle {
        api::Vehicle::lazy(self.0.vehicle_id)
    }

    /// First day of this `Rental`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.startDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn start_date(&self) -> Date {
        self.0.start_date
    }

    /// Day this `Rental` is expected to end.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.estimatedEndDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn estimated_end_date(&self) -> Date {
        self.0.estimated_end_date
    }

    /// Day this `Rental` actually ended, once `COMPLETED`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.actualEndDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn actual_end_date(&self) -> Option<Date> {
        self.0.actual_end_date
    }

    /// Day this `Rental` was cancelled on, once `CANCELLED`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.cancellationDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn cancellation_date(&self) -> Option<Date> {
        self.0.cancellation_date
    }

    /// Reason this `Rental` was cancelled for, once `CANCELLED`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.cancellationReason",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn cancellation_reason(&self) -> Option<CancellationReason> {
        self.0.cancellation_reason.clone().map(Into::into)
    }

    /// Daily price of the `Vehicle` at the moment this `Rental` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.reservedDailyPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn reserved_daily_price(&self) -> Money {
        self.0.reserved_daily_price
    }

    /// Total expected to be paid for the estimated dates.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.estimatedTotal",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn estimated_total(&self) -> Money {
        self.0.estimated_total
    }

    /// Total paid for the actual dates, once `COMPLETED`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.finalTotal",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn final_total(&self) -> Option<Money> {
        self.0.final_total
    }

    /// `DateTime` when this `Rental` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Rental` was updated last time.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of a `Rental`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::rental::Id)]
#[into(domain::rental::Id)]
#[graphql(name = "RentalId", transparent)]
pub struct Id(Uuid);

/// Reason of a `Rental` cancellation.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "RentalCancellationReason",
    with = scalar::Via::<domain::rental::CancellationReason>,
)]
pub struct CancellationReason(domain::rental::CancellationReason);

/// Status of a `Rental`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "RentalStatus")]
pub enum Status {
    /// Booked for future dates, the `Vehicle` is not held yet.
    Reserved,

    /// Running, the `Vehicle` is held.
    InProgress,

    /// Finished, the final total is charged.
    Completed,

    /// Called off before it started.
    Cancelled,
}

impl From<domain::rental::Status> for Status {
    fn from(status: domain::rental::Status) -> Self {
        use domain::rental::Status as S;
        match status {
            S::Reserved => Self::Reserved,
            S::InProgress => Self::InProgress,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Status> for domain::rental::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Reserved => Self::Reserved,
            Status::InProgress => Self::InProgress,
            Status::Completed => Self::Completed,
            Status::Cancelled => Self::Cancelled,
        }
    }
}

pub mod history {
    //! Definitions related to the rental history of a `Vehicle`.

    use common::{Date, Money};
    use derive_more::From;
    use juniper::graphql_object;
    use service::read::rental::history;

    use super::{CancellationReason, Id, Status};
    use crate::{api, Context};

    /// Entry of a `Vehicle` rental history.
    #[derive(Clone, Debug, From)]
    pub struct Item(history::Item);

    /// Entry of a `Vehicle` rental history.
    #[graphql_object(name = "RentalHistoryItem", context = Context)]
    impl Item {
        /// Unique identifier of the `Rental`.
        pub fn id(&self) -> Id {
            self.0.id.into()
        }

        /// Status of the `Rental` as of today.
        pub fn status(&self) -> Status {
            self.0.status.into()
        }

        /// First day of the `Rental`.
        pub fn start_date(&self) -> Date {
            self.0.start_date
        }

        /// Day the `Rental` is expected to end.
        pub fn estimated_end_date(&self) -> Date {
            self.0.estimated_end_date
        }

        /// Day the `Rental` actually ended, if it has.
        pub fn actual_end_date(&self) -> Option<Date> {
            self.0.actual_end_date
        }

        /// Total expected to be paid for the estimated dates.
        pub fn estimated_total(&self) -> Money {
            self.0.estimated_total
        }

        /// Total paid for the actual dates, if the `Rental` has ended.
        pub fn final_total(&self) -> Option<Money> {
            self.0.final_total
        }

        /// Identity of the renting `Customer`.
        pub fn customer(&self) -> CustomerSummary {
            CustomerSummary(self.0.customer.clone())
        }

        /// Cancellation details, if the `Rental` was cancelled.
        pub fn cancellation(&self) -> Option<Cancellation> {
            self.0.cancellation.clone().map(Cancellation)
        }
    }

    /// Identity of a `Customer` in a rental history.
    #[derive(Clone, Debug)]
    pub struct CustomerSummary(history::CustomerSummary);

    /// Identity of a `Customer` in a rental history.
    #[graphql_object(name = "RentalHistoryCustomer", context = Context)]
    impl CustomerSummary {
        /// Unique identifier of the `Customer`.
        pub fn id(&self) -> api::customer::Id {
            self.0.id.into()
        }

        /// First names of the `Customer`.
        pub fn first_names(&self) -> api::customer::Name {
            self.0.first_names.clone().into()
        }

        /// Last names of the `Customer`.
        pub fn last_names(&self) -> api::customer::Name {
            self.0.last_names.clone().into()
        }

        /// Number of the identity document of the `Customer`.
        pub fn document_number(&self) -> api::customer::DocumentNumber {
            self.0.document_number.clone().into()
        }

        /// Email of the `Customer`.
        pub fn email(&self) -> api::customer::Email {
            self.0.email.clone().into()
        }
    }

    /// Cancellation details of a `Rental`.
    #[derive(Clone, Debug)]
    pub struct Cancellation(history::Cancellation);

    /// Cancellation details of a `Rental`.
    #[graphql_object(name = "RentalHistoryCancellation", context = Context)]
    impl Cancellation {
        /// Day the `Rental` was cancelled on.
        pub fn date(&self) -> Option<Date> {
            self.0.date
        }

        /// Reason the `Rental` was cancelled for.
        pub fn reason(&self) -> Option<CancellationReason> {
            self.0.reason.clone().map(Into::into)
        }
    }
}
