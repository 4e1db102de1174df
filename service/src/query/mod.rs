//! [`Query`] definition.

pub mod customer;
pub mod rental;
pub mod rentals;
pub mod vehicle;

use common::operations::{By, Select};
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{normalize_rental, NormalizeRental},
    domain::Rental,
    infra::{database, Database},
    Command, Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, Clk, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db, Clk>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<Db, Clk> Service<Db, Clk>
where
    Self: Command<
        NormalizeRental,
        Ok = Rental,
        Err = Traced<normalize_rental::ExecutionError>,
    >,
{
    /// Normalizes the provided [`Rental`] before returning it to a reader.
    ///
    /// Failed normalization is not fatal for reading: the persisted
    /// [`Rental`] is returned as is, and gets corrected by the next read.
    async fn normalized(&self, rental: Rental) -> Rental {
        self.execute(NormalizeRental(rental.clone()))
            .await
            .unwrap_or_else(|e| {
                log::warn!(
                    "failed to normalize `Rental(id: {})`: {e}",
                    rental.id,
                );
                rental
            })
    }
}
