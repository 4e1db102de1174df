//! Background [`Task`]s definitions.

mod background;
pub mod reconcile_rentals;

pub use common::Handler as Task;

pub use self::{
    background::{Background, TaskError},
    reconcile_rentals::ReconcileRentals,
};
