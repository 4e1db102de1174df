//! [`Command`] for cancelling a [`Rental`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Clock, Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{rental, vehicle, Rental, Vehicle},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling a [`rental::Status::Reserved`] [`Rental`]
/// before it starts.
#[derive(Clone, Debug)]
pub struct CancelRental {
    /// ID of the [`Rental`] to be cancelled.
    pub rental_id: rental::Id,

    /// Reason the [`Rental`] is cancelled for.
    pub reason: Option<rental::CancellationReason>,

    /// Day the [`Rental`] is cancelled on.
    ///
    /// Today, if [`None`].
    pub cancellation_date: Option<Date>,
}

impl<Db, Clk> Command<CancelRental> for Service<Db, Clk>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        > + Database<Update<Rental>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Clk: Clock,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelRental {
            rental_id,
            reason,
            cancellation_date,
        } = cmd;
        let cancellation_date =
            cancellation_date.unwrap_or_else(|| self.clock().today());

        let rental = self
            .database()
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with a normalization of the same `Rental`.
        tx.execute(Lock(By::new(rental.vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut rental = tx
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;

        rental
            .cancel(cancellation_date, reason)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::debug!(
            "`Rental(id: {})` cancelled on {cancellation_date}",
            rental.id,
        );

        Ok(rental)
    }
}

/// Error of [`CancelRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),

    /// [`Rental`] cannot be cancelled.
    #[display("`Rental` cannot be cancelled: {_0}")]
    #[from]
    Transition(rental::TransitionError),
}
