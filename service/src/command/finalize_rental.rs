//! [`Command`] for finalizing a [`Rental`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date, DateTime,
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

/// [`Command`] for finalizing a [`rental::Status::InProgress`] [`Rental`]
/// and releasing its [`Vehicle`].
#[derive(Clone, Copy, Debug)]
pub struct FinalizeRental {
    /// ID of the [`Rental`] to be finalized.
    pub rental_id: rental::Id,

    /// Day the [`Rental`] actually ended.
    pub actual_end_date: Date,
}

impl<Db, Clk> Command<FinalizeRental> for Service<Db, Clk>
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
        > + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<Update<Rental>, Err = Traced<database::Error>>
        + Database<Update<Vehicle>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: FinalizeRental,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let FinalizeRental {
            rental_id,
            actual_end_date,
        } = cmd;

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

        // Avoid concurrent actions upon the same `Vehicle`.
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

        let vehicle_status = rental
            .finalize(actual_end_date)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let mut vehicle = tx
            .execute(Select(By::<Option<Vehicle>, _>::new(rental.vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::VehicleNotExists(rental.vehicle_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Update(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // Finished rental always gives the `Vehicle` back to the fleet.
        vehicle.status = vehicle_status;
        vehicle.updated_at = DateTime::now().coerce();
        tx.execute(Update(vehicle))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::debug!(
            "`Rental(id: {})` finalized on {actual_end_date}, \
             `Vehicle(id: {})` released",
            rental.id,
            rental.vehicle_id,
        );

        Ok(rental)
    }
}

/// Error of [`FinalizeRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),

    /// [`Rental`] cannot be finalized.
    #[display("`Rental` cannot be finalized: {_0}")]
    #[from]
    Transition(rental::TransitionError),

    /// [`Vehicle`] of the [`Rental`] does not exist.
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),
}
