//! [`Command`] definition.

pub mod cancel_rental;
pub mod create_rental;
pub mod finalize_rental;
pub mod normalize_rental;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    cancel_rental::CancelRental, create_rental::CreateRental,
    finalize_rental::FinalizeRental, normalize_rental::NormalizeRental,
};
