//! [`Command`] for creating a new [`Rental`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Clock, Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        customer,
        rental::{self, availability},
        vehicle, Customer, Rental, Vehicle,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Rental`].
#[derive(Clone, Copy, Debug)]
pub struct CreateRental {
    /// ID of the [`Customer`] renting the [`Vehicle`].
    pub customer_id: customer::Id,

    /// ID of the [`Vehicle`] to be rented.
    pub vehicle_id: vehicle::Id,

    /// First day of the new [`Rental`].
    pub start_date: Date,

    /// Day the new [`Rental`] is expected to end.
    pub estimated_end_date: Date,
}

impl<Db, Clk> Command<CreateRental> for Service<Db, Clk>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Rental>, vehicle::Id>>,
            Ok = Vec<Rental>,
            Err = Traced<database::Error>,
        > + Database<Insert<Rental>, Err = Traced<database::Error>>
        + Database<Update<Vehicle>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Clk: Clock,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRental {
            customer_id,
            vehicle_id,
            start_date,
            estimated_end_date,
        } = cmd;

        if estimated_end_date <= start_date {
            return Err(tracerr::new!(E::Transition(
                rental::TransitionError::EndNotAfterStart {
                    start: start_date,
                    end: estimated_end_date,
                }
            )));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent bookings of the same `Vehicle`.
        tx.execute(Lock(By::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut vehicle = tx
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::VehicleNotExists(vehicle_id))
            .map_err(tracerr::wrap!())?;
        match vehicle.status {
            vehicle::Status::Decommissioned => {
                return Err(tracerr::new!(E::VehicleDecommissioned(
                    vehicle_id
                )));
            }
            vehicle::Status::InMaintenance => {
                return Err(tracerr::new!(E::VehicleInMaintenance(
                    vehicle_id
                )));
            }
            vehicle::Status::Available | vehicle::Status::Unavailable => {}
        }
        let daily_price = vehicle
            .daily_price
            .ok_or(E::VehiclePriceMissing(vehicle_id))
            .map_err(tracerr::wrap!())?;

        let customer = tx
            .execute(Select(By::<Option<Customer>, _>::new(customer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CustomerNotExists(customer_id))
            .map_err(tracerr::wrap!())?;

        let rentals = tx
            .execute(Select(By::<Vec<Rental>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        availability::check(start_date, estimated_end_date, &rentals)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let (rental, vehicle_status) = Rental::open(
            customer.id,
            vehicle.id,
            start_date,
            estimated_end_date,
            daily_price,
            self.clock().today(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Insert(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(target) = vehicle_status {
            vehicle.status = vehicle.status.apply(target);
            vehicle.updated_at = DateTime::now().coerce();
            tx.execute(Update(vehicle.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::debug!(
            "`Rental(id: {})` of `Vehicle(id: {})` created as `{}`",
            rental.id,
            vehicle.id,
            rental.status,
        );

        Ok(rental)
    }
}

/// Error of [`CreateRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Requested dates overlap an existing [`Rental`] of the [`Vehicle`].
    #[display("`Vehicle` is not available: {_0}")]
    #[from]
    Overlap(availability::Conflict),

    /// Requested dates are invalid.
    #[display("Invalid `Rental` dates: {_0}")]
    #[from]
    Transition(rental::TransitionError),

    /// [`Vehicle`] is taken out of the fleet.
    #[display("`Vehicle(id: {_0})` is decommissioned")]
    VehicleDecommissioned(#[error(not(source))] vehicle::Id),

    /// [`Vehicle`] is being serviced.
    #[display("`Vehicle(id: {_0})` is in maintenance")]
    VehicleInMaintenance(#[error(not(source))] vehicle::Id),

    /// [`Vehicle`] with the provided ID does not exist.
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),

    /// [`Vehicle`] has no daily price configured.
    #[display("`Vehicle(id: {_0})` has no daily price configured")]
    VehiclePriceMissing(#[error(not(source))] vehicle::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Money,
    };

    use crate::{
        domain::{customer, rental, vehicle, Rental, Vehicle},
        infra::{Database as _, Memory},
        testing::{self, date},
        Command as _,
    };

    use super::{CreateRental, ExecutionError};

    fn cmd(
        vehicle: &Vehicle,
        customer_id: customer::Id,
        start: &str,
        end: &str,
    ) -> CreateRental {
        CreateRental {
            customer_id,
            vehicle_id: vehicle.id,
            start_date: date(start),
            estimated_end_date: date(end),
        }
    }

    async fn vehicle_status(db: &Memory, id: vehicle::Id) -> vehicle::Status {
        db.execute(Select(By::<Option<Vehicle>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn reserves_future_rental() {
        let db = Memory::new();
        let (vehicle, customer) = testing::seed(&db, "50").await;
        let svc = testing::service(db.clone(), "2024-04-28");

        let rental = svc
            .execute(cmd(&vehicle, customer.id, "2024-05-01", "2024-05-04"))
            .await
            .unwrap();

        assert_eq!(rental.status, rental::Status::Reserved);
        assert_eq!(rental.estimated_total, "150.00".parse().unwrap());
        assert_eq!(rental.reserved_daily_price, "50".parse().unwrap());
        assert_eq!(
            vehicle_status(&db, vehicle.id).await,
            vehicle::Status::Available,
        );

        let stored = db
            .execute(Select(By::<Option<Rental>, _>::new(rental.id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(rental));
    }

    #[tokio::test]
    async fn starts_rental_beginning_today() {
        let db = Memory::new();
        let (vehicle, customer) = testing::seed(&db, "40").await;
        let svc = testing::service(db.clone(), "2024-05-01");

        let rental = svc
            .execute(cmd(&vehicle, customer.id, "2024-05-01", "2024-05-03"))
            .await
            .unwrap();

        assert_eq!(rental.status, rental::Status::InProgress);
        assert_eq!(rental.estimated_total, "80.00".parse().unwrap());
        assert_eq!(
            vehicle_status(&db, vehicle.id).await,
            vehicle::Status::Unavailable,
        );
    }

    #[tokio::test]
    async fn snapshots_rounded_prices() {
        let db = Memory::new();
        let (vehicle, customer) = testing::seed(&db, "33.335").await;
        let svc = testing::service(db, "2024-01-01");

        let rental = svc
            .execute(cmd(&vehicle, customer.id, "2024-02-01", "2024-02-04"))
            .await
            .unwrap();

        assert_eq!(rental.reserved_daily_price, "33.34".parse().unwrap());
        assert_eq!(rental.estimated_total, "100.01".parse().unwrap());
    }

    #[tokio::test]
    async fn rejects_overlap_within_buffer() {
        let db = Memory::new();
        let (vehicle, customer) = testing::seed(&db, "50").await;
        let svc = testing::service(db, "2024-04-01");

        let first = svc
            .execute(cmd(&vehicle, customer.id, "2024-05-01", "2024-05-04"))
            .await
            .unwrap();

        let err = svc
            .execute(cmd(&vehicle, customer.id, "2024-05-06", "2024-05-08"))
            .await
            .unwrap_err();
        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::Overlap(c) if c.rental_id == first.id,
            ),
            "unexpected error: {err}",
        );

        _ = svc
            .execute(cmd(&vehicle, customer.id, "2024-05-08", "2024-05-10"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejects_invalid_range_before_lookups() {
        let svc = testing::service(Memory::new(), "2024-04-01");
        let vehicle = testing::vehicle("50");

        let err = svc
            .execute(cmd(
                &vehicle,
                customer::Id::new(),
                "2024-05-04",
                "2024-05-04",
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Transition(
                rental::TransitionError::EndNotAfterStart { .. }
            ),
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_vehicle_and_customer() {
        let db = Memory::new();
        let (vehicle, _) = testing::seed(&db, "50").await;
        let svc = testing::service(db, "2024-04-01");
        let ghost = testing::vehicle("50");

        let customer_id = customer::Id::new();

        let err = svc
            .execute(cmd(&ghost, customer_id, "2024-05-01", "2024-05-02"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::VehicleNotExists(id) if *id == ghost.id,
        ));

        let err = svc
            .execute(cmd(&vehicle, customer_id, "2024-05-01", "2024-05-02"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::CustomerNotExists(id) if *id == customer_id,
        ));
    }

    #[tokio::test]
    async fn rejects_vehicles_out_of_service() {
        for (status, expected) in [
            (vehicle::Status::Decommissioned, "decommissioned"),
            (vehicle::Status::InMaintenance, "in maintenance"),
        ] {
            let db = Memory::new();
            let mut vehicle = testing::vehicle("50");
            vehicle.status = status;
            db.add_vehicle(vehicle.clone()).await;
            let customer = testing::customer();
            db.add_customer(customer.clone()).await;
            let svc = testing::service(db, "2024-04-01");

            let err = svc
                .execute(cmd(&vehicle, customer.id, "2024-05-01", "2024-05-02"))
                .await
                .unwrap_err();

            assert!(
                err.to_string().contains(expected),
                "unexpected error: {err}",
            );
        }
    }

    #[tokio::test]
    async fn rejects_vehicle_without_price() {
        let db = Memory::new();
        let mut vehicle = testing::vehicle("50");
        vehicle.daily_price = None;
        db.add_vehicle(vehicle.clone()).await;
        let customer = testing::customer();
        db.add_customer(customer.clone()).await;
        let svc = testing::service(db, "2024-04-01");

        let err = svc
            .execute(cmd(&vehicle, customer.id, "2024-05-01", "2024-05-02"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::VehiclePriceMissing(_),
        ));
    }

    #[tokio::test]
    async fn persists_nothing_when_commit_fails() {
        let db = Memory::new();
        let (vehicle, customer) = testing::seed(&db, "50").await;
        let svc = testing::service(db.clone(), "2024-05-01");
        db.reject_writes(true);

        let err = svc
            .execute(cmd(&vehicle, customer.id, "2024-05-01", "2024-05-03"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Db(_)));
        assert_eq!(
            vehicle_status(&db, vehicle.id).await,
            vehicle::Status::Available,
        );
        let rentals = db
            .execute(Select(By::<Vec<Rental>, _>::new(vehicle.id)))
            .await
            .unwrap();
        assert!(rentals.is_empty());
    }

    #[tokio::test]
    async fn only_one_of_concurrent_overlapping_requests_wins() {
        let db = Memory::new();
        let (vehicle, customer) = testing::seed(&db, "50").await;
        let svc = testing::service(db.clone(), "2024-04-01");

        let (a, b) = tokio::join!(
            svc.execute(cmd(&vehicle, customer.id, "2024-05-01", "2024-05-04")),
            svc.execute(cmd(&vehicle, customer.id, "2024-05-02", "2024-05-05")),
        );

        assert_eq!(
            [a.is_ok(), b.is_ok()].into_iter().filter(|ok| *ok).count(),
            1,
        );
        let rentals = db
            .execute(Select(By::<Vec<Rental>, _>::new(vehicle.id)))
            .await
            .unwrap();
        assert_eq!(rentals.len(), 1);
        assert_eq!(
            rentals[0].estimated_total,
            Money::new(150.into()).unwrap(),
        );
    }
}
