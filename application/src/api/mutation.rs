//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{command, domain::rental, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `Rental` of the specified `Vehicle` by the specified
    /// `Customer`.
    ///
    /// The `Rental` is `RESERVED` if it starts after today, or `IN_PROGRESS`
    /// (holding the `Vehicle`) otherwise.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_DATE_RANGE` - `estimatedEndDate` is not after `startDate`;
    /// - `VEHICLE_NOT_EXISTS` - the specified `Vehicle` does not exist;
    /// - `VEHICLE_DECOMMISSIONED` - the `Vehicle` is taken out of the fleet;
    /// - `VEHICLE_IN_MAINTENANCE` - the `Vehicle` is being serviced;
    /// - `VEHICLE_PRICE_MISSING` - the `Vehicle` has no daily price;
    /// - `CUSTOMER_NOT_EXISTS` - the specified `Customer` does not exist;
    /// - `DATES_OVERLAP` - the dates are too close to another `Rental` of the
    ///                     `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            customer_id = %customer_id,
            estimated_end_date = %estimated_end_date,
            gql.name = "createRental",
            otel.name = Self::SPAN_NAME,
            start_date = %start_date,
            vehicle_id = %vehicle_id,
        ),
    )]
    pub async fn create_rental(
        customer_id: api::customer::Id,
        vehicle_id: api::vehicle::Id,
        start_date: Date,
        estimated_end_date: Date,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(command::CreateRental {
                customer_id: customer_id.into(),
                vehicle_id: vehicle_id.into(),
                start_date,
                estimated_end_date,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Finalizes the specified `IN_PROGRESS` `Rental`, charging the actual
    /// days and releasing its `Vehicle`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the specified `Rental` does not exist;
    /// - `RENTAL_NOT_IN_PROGRESS` - the `Rental` is not `IN_PROGRESS`;
    /// - `ACTUAL_END_NOT_AFTER_START` - `actualEndDate` is not after the
    ///                                  start date of the `Rental`.
    #[tracing::instrument(
        skip_all,
        fields(
            actual_end_date = %actual_end_date,
            gql.name = "finalizeRental",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn finalize_rental(
        id: api::rental::Id,
        actual_end_date: Date,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(command::FinalizeRental {
                rental_id: id.into(),
                actual_end_date,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the specified `RESERVED` `Rental` before it starts.
    ///
    /// `cancellationDate` defaults to today.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CANCELLATION_REASON_TOO_LONG` - `reason` exceeds 250 characters;
    /// - `RENTAL_NOT_EXISTS` - the specified `Rental` does not exist;
    /// - `RENTAL_NOT_RESERVED` - the `Rental` is not `RESERVED`;
    /// - `RENTAL_ALREADY_STARTED` - `cancellationDate` is not before the
    ///                              start date of the `Rental`;
    /// - `CANCELLATION_REASON_REQUIRED` - `reason` is missing or blank.
    #[tracing::instrument(
        skip_all,
        fields(
            cancellation_date = ?cancellation_date,
            gql.name = "cancelRental",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_rental(
        id: api::rental::Id,
        reason: Option<String>,
        cancellation_date: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        let reason = match reason.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(r) => Some(
                rental::CancellationReason::new(r)
                    .ok_or_else(|| CancellationError::ReasonTooLong.into())
                    .map_err(ctx.error())?,
            ),
        };

        ctx.service()
            .execute(command::CancelRental {
                rental_id: id.into(),
                reason,
                cancellation_date,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum CancellationError {
        #[code = "CANCELLATION_REASON_TOO_LONG"]
        #[status = BAD_REQUEST]
        #[message = "Cancellation reason must not exceed 250 characters"]
        ReasonTooLong,
    }
}

define_error! {
    enum TransitionError {
        #[code = "INVALID_DATE_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "End date must be after start date"]
        InvalidDateRange,

        #[code = "ACTUAL_END_NOT_AFTER_START"]
        #[status = CONFLICT]
        #[message = "Actual end date must be after the `Rental` start date"]
        ActualEndNotAfterStart,

        #[code = "RENTAL_NOT_IN_PROGRESS"]
        #[status = CONFLICT]
        #[message = "Only an `IN_PROGRESS` `Rental` can be finalized"]
        NotInProgress,

        #[code = "RENTAL_NOT_RESERVED"]
        #[status = CONFLICT]
        #[message = "Only a `RESERVED` `Rental` can be cancelled"]
        NotReserved,

        #[code = "RENTAL_ALREADY_STARTED"]
        #[status = CONFLICT]
        #[message = "`Rental` cannot be cancelled on or after its start \
                     date"]
        AlreadyStarted,

        #[code = "CANCELLATION_REASON_REQUIRED"]
        #[status = BAD_REQUEST]
        #[message = "Cancellation reason is required"]
        ReasonRequired,
    }
}

impl AsError for rental::TransitionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(
            match self {
                Self::EndNotAfterStart { .. } => {
                    TransitionError::InvalidDateRange
                }
                Self::NotInProgress(_) => TransitionError::NotInProgress,
                Self::NotReserved(_) => TransitionError::NotReserved,
                Self::AlreadyStarted { .. } => TransitionError::AlreadyStarted,
                Self::ReasonRequired => TransitionError::ReasonRequired,
            }
            .into(),
        )
    }
}

impl AsError for command::create_rental::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "VEHICLE_DECOMMISSIONED"]
                #[status = CONFLICT]
                #[message = "`Vehicle` is taken out of the fleet"]
                VehicleDecommissioned,

                #[code = "VEHICLE_IN_MAINTENANCE"]
                #[status = CONFLICT]
                #[message = "`Vehicle` is being serviced"]
                VehicleInMaintenance,

                #[code = "VEHICLE_PRICE_MISSING"]
                #[status = UNPROCESSABLE_ENTITY]
                #[message = "`Vehicle` has no daily price configured"]
                VehiclePriceMissing,

                #[code = "DATES_OVERLAP"]
                #[status = CONFLICT]
                #[message = "Dates overlap another `Rental` of the `Vehicle`"]
                DatesOverlap,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::CustomerNotExists(_) => Some(api::NotFound::Customer.into()),
            Self::VehicleNotExists(_) => Some(api::NotFound::Vehicle.into()),
            Self::VehicleDecommissioned(_) => {
                Some(Error::VehicleDecommissioned.into())
            }
            Self::VehicleInMaintenance(_) => {
                Some(Error::VehicleInMaintenance.into())
            }
            Self::VehiclePriceMissing(_) => {
                Some(Error::VehiclePriceMissing.into())
            }
            Self::Overlap(conflict) => {
                let mut err = crate::Error::from(Error::DatesOverlap);
                err.message = format!("{}: {conflict}", err.message);
                Some(err)
            }
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::finalize_rental::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::RentalNotExists(_) => Some(api::NotFound::Rental.into()),
            Self::Transition(rental::TransitionError::EndNotAfterStart {
                ..
            }) => Some(TransitionError::ActualEndNotAfterStart.into()),
            Self::Transition(e) => e.try_as_error(),
            Self::VehicleNotExists(_) => None,
        }
    }
}

impl AsError for command::cancel_rental::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::RentalNotExists(_) => Some(api::NotFound::Rental.into()),
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Date;
    use service::{
        command::{cancel_rental, create_rental, finalize_rental},
        domain::{rental, vehicle},
    };

    use crate::AsError as _;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn maps_create_errors() {
        use create_rental::ExecutionError as E;

        let id = vehicle::Id::new();
        let cases = [
            (E::VehicleNotExists(id), "VEHICLE_NOT_EXISTS", 404),
            (E::VehicleDecommissioned(id), "VEHICLE_DECOMMISSIONED", 409),
            (E::VehicleInMaintenance(id), "VEHICLE_IN_MAINTENANCE", 409),
            (E::VehiclePriceMissing(id), "VEHICLE_PRICE_MISSING", 422),
            (
                E::Transition(rental::TransitionError::EndNotAfterStart {
                    start: date("2024-05-02"),
                    end: date("2024-05-01"),
                }),
                "INVALID_DATE_RANGE",
                400,
            ),
        ];
        for (err, code, status) in cases {
            let err = err.as_error();
            assert_eq!(err.code, code);
            assert_eq!(err.status_code.as_u16(), status, "{code}");
        }
    }

    #[test]
    fn maps_finalize_date_order_to_conflict() {
        let err = finalize_rental::ExecutionError::Transition(
            rental::TransitionError::EndNotAfterStart {
                start: date("2024-05-02"),
                end: date("2024-05-02"),
            },
        )
        .as_error();

        assert_eq!(err.code, "ACTUAL_END_NOT_AFTER_START");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }

    #[test]
    fn maps_cancel_errors() {
        use cancel_rental::ExecutionError as E;

        let cases = [
            (
                E::RentalNotExists(rental::Id::new()),
                "RENTAL_NOT_EXISTS",
                404,
            ),
            (
                E::Transition(rental::TransitionError::NotReserved(
                    rental::Status::Completed,
                )),
                "RENTAL_NOT_RESERVED",
                409,
            ),
            (
                E::Transition(rental::TransitionError::ReasonRequired),
                "CANCELLATION_REASON_REQUIRED",
                400,
            ),
        ];
        for (err, code, status) in cases {
            let err = err.as_error();
            assert_eq!(err.code, code);
            assert_eq!(err.status_code.as_u16(), status, "{code}");
        }
    }
}
