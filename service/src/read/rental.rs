//! [`Rental`] read model definitions.

#[cfg(doc)]
use crate::domain::Rental;

/// Selector of all the [`Rental`]s, the most recently created first.
#[derive(Clone, Copy, Debug, Default)]
pub struct All;

/// Selector of all the [`Rental`]s not in a terminal [`Status`].
///
/// [`Status`]: crate::domain::rental::Status
#[derive(Clone, Copy, Debug, Default)]
pub struct NonTerminal;

pub mod history {
    //! Rental history of a [`Vehicle`] definitions.

    use common::{Date, Money};

    use crate::domain::{customer, rental, vehicle, Customer, Rental};
    #[cfg(doc)]
    use crate::domain::Vehicle;

    /// Selector of the [`Rental`]s of a [`Vehicle`] matching a [`Filter`],
    /// the latest starting first.
    #[derive(Clone, Copy, Debug)]
    pub struct Selector {
        /// ID of the [`Vehicle`] to select the [`Rental`]s of.
        pub vehicle_id: vehicle::Id,

        /// [`Filter`] to apply.
        pub filter: Filter,
    }

    /// Filter of a [`Vehicle`] rental history.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// Exact [`rental::Status`] to match.
        pub status: Option<rental::Status>,

        /// Earliest start date to match, inclusive.
        pub from: Option<Date>,

        /// Latest effective end date to match, inclusive.
        pub to: Option<Date>,
    }

    impl Filter {
        /// Checks whether the provided [`Rental`] matches this [`Filter`].
        #[must_use]
        pub fn matches(&self, rental: &Rental) -> bool {
            self.status.map_or(true, |s| rental.status == s)
                && self.from.map_or(true, |from| rental.start_date >= from)
                && self
                    .to
                    .map_or(true, |to| rental.effective_end_date() <= to)
        }
    }

    /// Entry of a [`Vehicle`] rental history.
    #[derive(Clone, Debug)]
    pub struct Item {
        /// ID of the [`Rental`].
        pub id: rental::Id,

        /// [`rental::Status`] of the [`Rental`].
        pub status: rental::Status,

        /// Start date of the [`Rental`].
        pub start_date: Date,

        /// Estimated end date of the [`Rental`].
        pub estimated_end_date: Date,

        /// Actual end date of the [`Rental`], if it has ended.
        pub actual_end_date: Option<Date>,

        /// Estimated total of the [`Rental`].
        pub estimated_total: Money,

        /// Final total of the [`Rental`], if it has ended.
        pub final_total: Option<Money>,

        /// [`CustomerSummary`] of the renting [`Customer`].
        pub customer: CustomerSummary,

        /// [`Cancellation`] details, if the [`Rental`] was cancelled.
        pub cancellation: Option<Cancellation>,
    }

    impl Item {
        /// Projects the provided [`Rental`] of the provided [`Customer`] into
        /// an [`Item`].
        #[must_use]
        pub fn new(rental: Rental, customer: &Customer) -> Self {
            let cancellation = (rental.cancellation_date.is_some()
                || rental.cancellation_reason.is_some())
            .then(|| Cancellation {
                date: rental.cancellation_date,
                reason: rental.cancellation_reason.clone(),
            });
            Self {
                id: rental.id,
                status: rental.status,
                start_date: rental.start_date,
                estimated_end_date: rental.estimated_end_date,
                actual_end_date: rental.actual_end_date,
                estimated_total: rental.estimated_total,
                final_total: rental.final_total,
                customer: CustomerSummary::from(customer),
                cancellation,
            }
        }
    }

    /// Identity of a [`Customer`] in a rental history.
    #[derive(Clone, Debug)]
    pub struct CustomerSummary {
        /// ID of the [`Customer`].
        pub id: customer::Id,

        /// First names of the [`Customer`].
        pub first_names: customer::Name,

        /// Last names of the [`Customer`].
        pub last_names: customer::Name,

        /// Document number of the [`Customer`].
        pub document_number: customer::DocumentNumber,

        /// Email of the [`Customer`].
        pub email: customer::Email,
    }

    impl From<&Customer> for CustomerSummary {
        fn from(customer: &Customer) -> Self {
            Self {
                id: customer.id,
                first_names: customer.first_names.clone(),
                last_names: customer.last_names.clone(),
                document_number: customer.document_number.clone(),
                email: customer.email.clone(),
            }
        }
    }

    /// Cancellation details of a [`Rental`].
    #[derive(Clone, Debug)]
    pub struct Cancellation {
        /// Day the [`Rental`] was cancelled.
        pub date: Option<Date>,

        /// Reason the [`Rental`] was cancelled for.
        pub reason: Option<rental::CancellationReason>,
    }
}
