//! [`Command`] for normalizing a [`Rental`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Clock, DateTime,
};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{rental, vehicle, Rental, Vehicle},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for bringing a [`Rental`] status in line with the current day,
/// updating its [`Vehicle`] accordingly.
///
/// Returns the normalized [`Rental`]. Terminal or already consistent
/// [`Rental`]s are returned as is, without touching the [`Database`].
#[derive(Clone, Debug)]
pub struct NormalizeRental(pub Rental);

impl<Db, Clk> Command<NormalizeRental> for Service<Db, Clk>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
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
    Clk: Clock,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        NormalizeRental(rental): NormalizeRental,
    ) -> Result<Self::Ok, Self::Err> {
        let today = self.clock().today();
        if rental.clone().normalize(today).is_none() {
            return Ok(rental);
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        tx.execute(Lock(By::new(rental.vehicle_id)))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        // Someone may have changed the `Rental` since it was read.
        let Some(mut rental) = tx
            .execute(Select(By::<Option<Rental>, _>::new(rental.id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(rental);
        };
        let Some(target) = rental.normalize(today) else {
            return Ok(rental);
        };

        let vehicle = tx
            .execute(Select(By::<Option<Vehicle>, _>::new(rental.vehicle_id)))
            .await
            .map_err(tracerr::wrap!())?;
        if let Some(mut vehicle) = vehicle {
            let status = vehicle.status.apply(target);
            if status != vehicle.status {
                vehicle.status = status;
                vehicle.updated_at = DateTime::now().coerce();
                tx.execute(Update(vehicle))
                    .await
                    .map_err(tracerr::wrap!())
                    .map(drop)?;
            }
        }

        tx.execute(Update(rental.clone()))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        log::info!(
            "`Rental(id: {})` normalized to `{}` on {today}",
            rental.id,
            rental.status,
        );

        Ok(rental)
    }
}

/// Error of [`NormalizeRental`] [`Command`] execution.
pub type ExecutionError = database::Error;

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select},
        Money,
    };

    use crate::{
        domain::{rental, vehicle, Rental, Vehicle},
        infra::{Database as _, Memory},
        testing::{self, date},
        Command as _,
    };

    use super::NormalizeRental;

    /// Stores a [`Rental`] of the provided [`Vehicle`] with the provided
    /// persisted [`rental::Status`], as if the day has changed since then.
    async fn stale(
        db: &Memory,
        vehicle: &Vehicle,
        status: rental::Status,
    ) -> Rental {
        let customer = testing::customer();
        db.add_customer(customer.clone()).await;
        let (mut rental, _) = Rental::open(
            customer.id,
            vehicle.id,
            date("2024-05-10"),
            date("2024-05-12"),
            Money::new(50.into()).unwrap(),
            date("2024-05-01"),
        )
        .unwrap();
        rental.status = status;
        db.execute(Insert(rental.clone())).await.unwrap();
        rental
    }

    async fn vehicle_status(db: &Memory, id: vehicle::Id) -> vehicle::Status {
        db.execute(Select(By::<Option<Vehicle>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn starts_due_reservation_and_holds_vehicle() {
        let db = Memory::new();
        let (vehicle, _) = testing::seed(&db, "50").await;
        let rental = stale(&db, &vehicle, rental::Status::Reserved).await;
        let svc = testing::service(db.clone(), "2024-05-10");

        let normalized = svc.execute(NormalizeRental(rental)).await.unwrap();

        assert_eq!(normalized.status, rental::Status::InProgress);
        assert_eq!(
            vehicle_status(&db, vehicle.id).await,
            vehicle::Status::Unavailable,
        );
        let stored = db
            .execute(Select(By::<Option<Rental>, _>::new(normalized.id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(normalized));
    }

    #[tokio::test]
    async fn reverts_premature_start_and_releases_vehicle() {
        let db = Memory::new();
        let mut vehicle = testing::vehicle("50");
        vehicle.status = vehicle::Status::Unavailable;
        db.add_vehicle(vehicle.clone()).await;
        let rental = stale(&db, &vehicle, rental::Status::InProgress).await;
        let svc = testing::service(db.clone(), "2024-05-01");

        let normalized = svc.execute(NormalizeRental(rental)).await.unwrap();

        assert_eq!(normalized.status, rental::Status::Reserved);
        assert_eq!(
            vehicle_status(&db, vehicle.id).await,
            vehicle::Status::Available,
        );
    }

    #[tokio::test]
    async fn keeps_maintenance_vehicle_untouched() {
        let db = Memory::new();
        let mut vehicle = testing::vehicle("50");
        vehicle.status = vehicle::Status::InMaintenance;
        db.add_vehicle(vehicle.clone()).await;
        let rental = stale(&db, &vehicle, rental::Status::Reserved).await;
        let svc = testing::service(db.clone(), "2024-05-11");

        let normalized = svc.execute(NormalizeRental(rental)).await.unwrap();

        assert_eq!(normalized.status, rental::Status::InProgress);
        assert_eq!(
            vehicle_status(&db, vehicle.id).await,
            vehicle::Status::InMaintenance,
        );
    }

    #[tokio::test]
    async fn skips_consistent_and_terminal_rentals() {
        let db = Memory::new();
        let (vehicle, _) = testing::seed(&db, "50").await;
        let reserved = stale(&db, &vehicle, rental::Status::Reserved).await;
        let cancelled = stale(&db, &vehicle, rental::Status::Cancelled).await;
        // Nothing is written, so rejected writes don't matter.
        db.reject_writes(true);

        let svc = testing::service(db.clone(), "2024-05-01");
        let same = svc
            .execute(NormalizeRental(reserved.clone()))
            .await
            .unwrap();
        assert_eq!(same, reserved);

        let svc = testing::service(db.clone(), "2024-06-01");
        let same = svc
            .execute(NormalizeRental(cancelled.clone()))
            .await
            .unwrap();
        assert_eq!(same, cancelled);
    }

    #[tokio::test]
    async fn is_idempotent() {
        let db = Memory::new();
        let (vehicle, _) = testing::seed(&db, "50").await;
        let rental = stale(&db, &vehicle, rental::Status::Reserved).await;
        let svc = testing::service(db.clone(), "2024-05-10");

        let once = svc.execute(NormalizeRental(rental)).await.unwrap();
        let twice = svc.execute(NormalizeRental(once.clone())).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(
            vehicle_status(&db, vehicle.id).await,
            vehicle::Status::Unavailable,
        );
    }

    #[tokio::test]
    async fn fails_without_partial_writes() {
        let db = Memory::new();
        let (vehicle, _) = testing::seed(&db, "50").await;
        let rental = stale(&db, &vehicle, rental::Status::Reserved).await;
        let svc = testing::service(db.clone(), "2024-05-10");
        db.reject_writes(true);

        assert!(svc.execute(NormalizeRental(rental.clone())).await.is_err());

        db.reject_writes(false);
        let stored = db
            .execute(Select(By::<Option<Rental>, _>::new(rental.id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(rental));
        assert_eq!(
            vehicle_status(&db, vehicle.id).await,
            vehicle::Status::Available,
        );
    }
}
