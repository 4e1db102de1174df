//! Availability of a [`Vehicle`] for a new [`Rental`].

use common::Date;
use derive_more::{Display, Error};

#[cfg(doc)]
use crate::domain::Vehicle;

use super::{Id, Rental, Status};

/// Number of days a [`Vehicle`] stays unbookable around each of its
/// [`Rental`]s, for turnaround (cleaning, inspection).
pub const BUFFER_DAYS: i64 = 3;

/// Checks whether the `[start, end]` range can be booked without conflicting
/// with any of the provided `rentals` of the same [`Vehicle`].
///
/// [`Status::Cancelled`] [`Rental`]s are ignored. The [`BUFFER_DAYS`] widen
/// every existing [`Rental`] on both sides, while the requested range is taken
/// as is.
///
/// # Errors
///
/// With the first conflicting [`Rental`] found.
pub fn check<'r>(
    start: Date,
    end: Date,
    rentals: impl IntoIterator<Item = &'r Rental>,
) -> Result<(), Conflict> {
    rentals
        .into_iter()
        .filter(|r| r.status != Status::Cancelled)
        .find(|r| {
            let busy_from = r.start_date.add_days(-BUFFER_DAYS);
            let busy_until = r.effective_end_date().add_days(BUFFER_DAYS);
            start <= busy_until && end >= busy_from
        })
        .map_or(Ok(()), |r| {
            Err(Conflict {
                rental_id: r.id,
                start_date: r.start_date,
                end_date: r.effective_end_date(),
            })
        })
}

/// Existing [`Rental`] overlapping the requested dates.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display(
    "dates overlap `Rental(id: {rental_id})` booked from {start_date} to \
     {end_date}"
)]
pub struct Conflict {
    /// ID of the conflicting [`Rental`].
    pub rental_id: Id,

    /// Start date of the conflicting [`Rental`].
    pub start_date: Date,

    /// Effective end date of the conflicting [`Rental`].
    pub end_date: Date,
}
