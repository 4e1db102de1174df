//! [`Customer`]-related definitions.

use std::future;

use common::{DateTime, Handler as _};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A customer renting vehicles.
#[derive(Clone, Debug)]
pub struct Customer {
    /// ID of this [`Customer`].
    id: Id,

    /// Underlying [`domain::Customer`].
    customer: OnceCell<domain::Customer>,
}

impl From<domain::Customer> for Customer {
    fn from(customer: domain::Customer) -> Self {
        Self {
            id: customer.id.into(),
            customer: OnceCell::new_with(Some(customer)),
        }
    }
}

impl Customer {
    /// Creates a new [`Customer`] loading its data lazily by the provided ID.
    ///
    /// Resolving fields of a non-existent [`Customer`] fails with
    /// `CUSTOMER_NOT_EXISTS` error.
    #[must_use]
    pub fn lazy(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            customer: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Customer`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Customer`] doesn't exist.
    async fn customer(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Customer, Error> {
        let id = self.id.into();
        self.customer
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::customer::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|c| {
                        future::ready(
                            c.ok_or_else(|| api::NotFound::Customer.into())
                                .map_err(ctx.error()),
                        )
                    })
            })
            .await
    }
}

/// A customer renting vehicles.
#[graphql_object(context = Context)]
impl Customer {
    /// Unique identifier of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// First names of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.firstNames",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn first_names(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.customer(ctx).await?.first_names.clone().into())
    }

    /// Last names of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.lastNames",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn last_names(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.customer(ctx).await?.last_names.clone().into())
    }

    /// Kind of the identity document of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.documentKind",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn document_kind(
        &self,
        ctx: &Context,
    ) -> Result<DocumentKind, Error> {
        Ok(self.customer(ctx).await?.document_kind.into())
    }

    /// Number of the identity document of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.documentNumber",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn document_number(
        &self,
        ctx: &Context,
    ) -> Result<DocumentNumber, Error> {
        Ok(self.customer(ctx).await?.document_number.clone().into())
    }

    /// Email of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.email",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn email(&self, ctx: &Context) -> Result<Email, Error> {
        Ok(self.customer(ctx).await?.email.clone().into())
    }

    /// Phone of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.phone",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn phone(&self, ctx: &Context) -> Result<Phone, Error> {
        Ok(self.customer(ctx).await?.phone.clone().into())
    }

    /// `DateTime` when this `Customer` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.customer(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Customer`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::customer::Id)]
#[into(domain::customer::Id)]
#[graphql(name = "CustomerId", transparent)]
pub struct Id(Uuid);

/// First or last names of a `Customer`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CustomerName",
    with = scalar::Via::<domain::customer::Name>,
)]
pub struct Name(domain::customer::Name);

/// Number of an identity document of a `Customer`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CustomerDocumentNumber",
    with = scalar::Via::<domain::customer::DocumentNumber>,
)]
pub struct DocumentNumber(domain::customer::DocumentNumber);

/// Email of a `Customer`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CustomerEmail",
    with = scalar::Via::<domain::customer::Email>,
)]
pub struct Email(domain::customer::Email);

/// Phone of a `Customer`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CustomerPhone",
    with = scalar::Via::<domain::customer::Phone>,
)]
pub struct Phone(domain::customer::Phone);

/// Kind of an identity document of a `Customer`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "CustomerDocumentKind")]
pub enum DocumentKind {
    /// National citizenship ID.
    CitizenId,

    /// ID card of an underage citizen.
    IdentityCard,

    /// Passport.
    Passport,

    /// ID of a foreign resident.
    ForeignerId,
}

impl From<domain::customer::DocumentKind> for DocumentKind {
    fn from(kind: domain::customer::DocumentKind) -> Self {
        use domain::customer::DocumentKind as K;
        match kind {
            K::CitizenId => Self::CitizenId,
            K::IdentityCard => Self::IdentityCard,
            K::Passport => Self::Passport,
            K::ForeignerId => Self::ForeignerId,
        }
    }
}
