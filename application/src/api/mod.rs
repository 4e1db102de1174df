//! GraphQL API definitions.

pub mod customer;
mod mutation;
mod query;
pub mod rental;
pub mod scalar;
pub mod vehicle;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    customer::Customer, mutation::Mutation, query::Query, rental::Rental,
    vehicle::Vehicle,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

/// Creates a new [`Schema`].
#[must_use]
pub fn schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}

define_error! {
    enum NotFound {
        #[code = "RENTAL_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Rental` with the provided ID does not exist"]
        Rental,

        #[code = "VEHICLE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Vehicle` with the provided ID does not exist"]
        Vehicle,

        #[code = "CUSTOMER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Customer` with the provided ID does not exist"]
        Customer,
    }
}
