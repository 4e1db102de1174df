//! [`Vehicle`]-related definitions.

use std::future;

use common::{DateTime, Handler as _, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A vehicle of the fleet.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// ID of this [`Vehicle`].
    id: Id,

    /// Underlying [`domain::Vehicle`].
    vehicle: OnceCell<domain::Vehicle>,
}

impl From<domain::Vehicle> for Vehicle {
    fn from(vehicle: domain::Vehicle) -> Self {
        Self {
            id: vehicle.id.into(),
            vehicle: OnceCell::new_with(Some(vehicle)),
        }
    }
}

impl Vehicle {
    /// Creates a new [`Vehicle`] loading its data lazily by the provided ID.
    ///
    /// Resolving fields of a non-existent [`Vehicle`] fails with
    /// `VEHICLE_NOT_EXISTS` error.
    #[must_use]
    pub fn lazy(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            vehicle: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Vehicle`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Vehicle`] doesn't exist.
    async fn vehicle(&self, ctx: &Context) -> Result<&domain::Vehicle, Error> {
        let id = self.id.into();
        self.vehicle
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::vehicle::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|v| {
                        future::ready(
                            v.ok_or_else(|| api::NotFound::Vehicle.into())
                                .map_err(ctx.error()),
                        )
                    })
            })
            .await
    }
}

/// A vehicle of the fleet.
#[graphql_object(context = Context)]
impl Vehicle {
    /// Unique identifier of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// License plate of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.plate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn plate(&self, ctx: &Context) -> Result<Plate, Error> {
        Ok(self.vehicle(ctx).await?.plate.clone().into())
    }

    /// Brand of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.brand",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn brand(&self, ctx: &Context) -> Result<Brand, Error> {
        Ok(self.vehicle(ctx).await?.brand.clone().into())
    }

    /// Model of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.model",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn model(&self, ctx: &Context) -> Result<Model, Error> {
        Ok(self.vehicle(ctx).await?.model.clone().into())
    }

    /// Manufacturing year of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.year",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn year(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.vehicle(ctx).await?.year.into())
    }

    /// Fuel this `Vehicle` runs on, if known.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.fuel",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn fuel(&self, ctx: &Context) -> Result<Option<Fuel>, Error> {
        Ok(self.vehicle(ctx).await?.fuel.map(Into::into))
    }

    /// Current status of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.vehicle(ctx).await?.status.into())
    }

    /// Price of renting this `Vehicle` for a day, if configured.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.dailyPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn daily_price(
        &self,
        ctx: &Context,
    ) -> Result<Option<Money>, Error> {
        Ok(self.vehicle(ctx).await?.daily_price)
    }

    /// `DateTime` when this `Vehicle` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.vehicle(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Vehicle` was updated last time.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.vehicle(ctx).await?.updated_at.coerce())
    }
}

/// Unique identifier of a `Vehicle`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::vehicle::Id)]
#[into(domain::vehicle::Id)]
#[graphql(name = "VehicleId", transparent)]
pub struct Id(Uuid);

/// License plate of a `Vehicle`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "VehiclePlate",
    with = scalar::Via::<domain::vehicle::Plate>,
)]
pub struct Plate(domain::vehicle::Plate);

/// Brand of a `Vehicle`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "VehicleBrand",
    with = scalar::Via::<domain::vehicle::Brand>,
)]
pub struct Brand(domain::vehicle::Brand);

/// Model of a `Vehicle`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "VehicleModel",
    with = scalar::Via::<domain::vehicle::Model>,
)]
pub struct Model(domain::vehicle::Model);

/// Fuel a `Vehicle` runs on.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "VehicleFuel")]
pub enum Fuel {
    /// Gasoline engine.
    Gasoline,

    /// Diesel engine.
    Diesel,

    /// Hybrid powertrain.
    Hybrid,

    /// Electric motor.
    Electric,
}

impl From<domain::vehicle::Fuel> for Fuel {
    fn from(fuel: domain::vehicle::Fuel) -> Self {
        use domain::vehicle::Fuel as F;
        match fuel {
            F::Gasoline => Self::Gasoline,
            F::Diesel => Self::Diesel,
            F::Hybrid => Self::Hybrid,
            F::Electric => Self::Electric,
        }
    }
}

/// Status of a `Vehicle`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "VehicleStatus")]
pub enum Status {
    /// `Vehicle` can be rented.
    Available,

    /// `Vehicle` is held by a rental in progress.
    Unavailable,

    /// `Vehicle` is being serviced.
    InMaintenance,

    /// `Vehicle` is taken out of the fleet.
    Decommissioned,
}

impl From<domain::vehicle::Status> for Status {
    fn from(status: domain::vehicle::Status) -> Self {
        use domain::vehicle::Status as S;
        match status {
            S::Available => Self::Available,
            S::Unavailable => Self::Unavailable,
            S::InMaintenance => Self::InMaintenance,
            S::Decommissioned => Self::Decommissioned,
        }
    }
}
