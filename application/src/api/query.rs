//! GraphQL [`Query`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns all the `Rental`s, the most recently created first.
    ///
    /// Statuses are brought in line with the current day before returning.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rentals",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rentals(ctx: &Context) -> Result<Vec<api::Rental>, Error> {
        ctx.service()
            .execute(query::rentals::All)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|rentals| rentals.into_iter().map(Into::into).collect())
    }

    /// Returns the `Rental` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the `Rental` with the specified ID does not
    ///                         exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "rental",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rental(
        id: api::rental::Id,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(query::rental::ById(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::NotFound::Rental.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Vehicle` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VEHICLE_NOT_EXISTS` - the `Vehicle` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "vehicle",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn vehicle(
        id: api::vehicle::Id,
        ctx: &Context,
    ) -> Result<api::Vehicle, Error> {
        ctx.service()
            .execute(query::vehicle::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::NotFound::Vehicle.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Customer` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CUSTOMER_NOT_EXISTS` - the `Customer` with the specified ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "customer",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn customer(
        id: api::customer::Id,
        ctx: &Context,
    ) -> Result<api::Customer, Error> {
        ctx.service()
            .execute(query::customer::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::NotFound::Customer.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the rental history of the `Vehicle` with the specified ID, the
    /// latest starting `Rental` first.
    ///
    /// `from` bounds the start date of a `Rental` from below, while `to`
    /// bounds its actual end date (or the estimated one, if it has not ended)
    /// from above. Both bounds are inclusive.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VEHICLE_NOT_EXISTS` - the `Vehicle` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            from = ?from,
            gql.name = "vehicleHistory",
            otel.name = Self::SPAN_NAME,
            status = ?status,
            to = ?to,
            vehicle_id = %vehicle_id,
        ),
    )]
    pub async fn vehicle_history(
        vehicle_id: api::vehicle::Id,
        status: Option<api::rental::Status>,
        from: Option<Date>,
        to: Option<Date>,
        ctx: &Context,
    ) -> Result<Vec<api::rental::history::Item>, Error> {
        ctx.service()
            .execute(query::vehicle::History {
                vehicle_id: vehicle_id.into(),
                filter: read::rental::history::Filter {
                    status: status.map(Into::into),
                    from,
                    to,
                },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|items| items.into_iter().map(Into::into).collect())
    }
}

impl AsError for query::vehicle::HistoryError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::VehicleNotExists(_) => Some(api::NotFound::Vehicle.into()),
            Self::CustomerNotExists(_) => None,
        }
    }
}
