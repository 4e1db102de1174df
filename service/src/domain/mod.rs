//! Domain definitions.

pub mod customer;
pub mod rental;
pub mod vehicle;

pub use self::{customer::Customer, rental::Rental, vehicle::Vehicle};
