//! [`Query`] collection related to a single [`Vehicle`].

use std::collections::HashMap;

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use itertools::Itertools as _;
use tracerr::Traced;

use crate::{
    command::{normalize_rental, NormalizeRental},
    domain::{customer, vehicle, Customer, Rental, Vehicle},
    infra::{database, Database},
    read::rental::history,
    Command, Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Vehicle`] by its [`vehicle::Id`].
pub type ById = DatabaseQuery<By<Option<Vehicle>, vehicle::Id>>;

/// Queries the rental history of a [`Vehicle`], the latest starting
/// [`Rental`] first.
///
/// The [`history::Filter`] is matched against the persisted [`Rental`]s, which
/// are normalized on the current day afterwards.
#[derive(Clone, Copy, Debug)]
pub struct History {
    /// ID of the [`Vehicle`] to query the history of.
    pub vehicle_id: vehicle::Id,

    /// [`history::Filter`] to apply.
    pub filter: history::Filter,
}

impl<Db, Clk> Query<History> for Service<Db, Clk>
where
    Db: Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Rental>, history::Selector>>,
            Ok = Vec<Rental>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<customer::Id, Customer>, Vec<customer::Id>>>,
            Ok = HashMap<customer::Id, Customer>,
            Err = Traced<database::Error>,
        >,
    Self: Command<
        NormalizeRental,
        Ok = Rental,
        Err = Traced<normalize_rental::ExecutionError>,
    >,
{
    type Ok = Vec<history::Item>;
    type Err = Traced<HistoryError>;

    async fn execute(&self, query: History) -> Result<Self::Ok, Self::Err> {
        use HistoryError as E;

        let History { vehicle_id, filter } = query;

        let vehicle = self
            .database()
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::VehicleNotExists(vehicle_id))
            .map_err(tracerr::wrap!())?;

        let rentals = self
            .database()
            .execute(Select(By::<Vec<Rental>, _>::new(history::Selector {
                vehicle_id: vehicle.id,
                filter,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let customers = self
            .database()
            .execute(Select(By::<HashMap<_, Customer>, _>::new(
                rentals.iter().map(|r| r.customer_id).unique().collect_vec(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut items = Vec::with_capacity(rentals.len());
        for rental in rentals {
            let customer = customers
                .get(&rental.customer_id)
                .ok_or(E::CustomerNotExists(rental.customer_id))
                .map_err(tracerr::wrap!())?;
            let rental = self.normalized(rental).await;
            items.push(history::Item::new(rental, customer));
        }
        Ok(items)
    }
}

/// Error of [`History`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum HistoryError {
    /// [`Customer`] of a [`Rental`] does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Vehicle`] with the provided ID does not exist.
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{Commit, Insert, Transact},
        Money,
    };

    use crate::{
        command::{CancelRental, CreateRental, FinalizeRental},
        domain::{
            rental::{self, CancellationReason},
            Customer, Rental, Vehicle,
        },
        infra::{Database as _, Memory},
        read::rental::history::Filter,
        testing::{self, date},
        Command as _, Query as _,
    };

    use super::{History, HistoryError};

    /// Seeds a [`Vehicle`] with a completed, a cancelled and a reserved
    /// [`Rental`].
    async fn seed_history(db: &Memory) -> (Vehicle, Customer, [Rental; 3]) {
        let (vehicle, customer) = testing::seed(db, "50").await;
        let create = |start: &str, end: &str| CreateRental {
            customer_id: customer.id,
            vehicle_id: vehicle.id,
            start_date: date(start),
            estimated_end_date: date(end),
        };

        let past = testing::service(db.clone(), "2024-01-01");
        let completed = past
            .execute(create("2024-01-01", "2024-01-05"))
            .await
            .unwrap();
        let completed = past
            .execute(FinalizeRental {
                rental_id: completed.id,
                actual_end_date: date("2024-01-04"),
            })
            .await
            .unwrap();
        let cancelled = past
            .execute(create("2024-02-01", "2024-02-03"))
            .await
            .unwrap();
        let cancelled = past
            .execute(CancelRental {
                rental_id: cancelled.id,
                reason: CancellationReason::new("plans changed"),
                cancellation_date: None,
            })
            .await
            .unwrap();
        let reserved = past
            .execute(create("2024-03-01", "2024-03-04"))
            .await
            .unwrap();

        (vehicle, customer, [completed, cancelled, reserved])
    }

    #[tokio::test]
    async fn lists_latest_first_with_summaries() {
        let db = Memory::new();
        let (vehicle, customer, [completed, cancelled, reserved]) =
            seed_history(&db).await;
        let svc = testing::service(db, "2024-01-10");

        let items = svc
            .execute(History {
                vehicle_id: vehicle.id,
                filter: Filter::default(),
            })
            .await
            .unwrap();

        assert_eq!(
            items.iter().map(|i| i.id).collect::<Vec<_>>(),
            [reserved.id, cancelled.id, completed.id],
        );
        assert!(items.iter().all(|i| i.customer.id == customer.id));
        assert_eq!(items[0].customer.email, customer.email);

        let cancellation = items[1].cancellation.as_ref().unwrap();
        assert_eq!(cancellation.date, Some(date("2024-01-01")));
        assert_eq!(
            cancellation.reason,
            CancellationReason::new("plans changed"),
        );
        assert!(items[0].cancellation.is_none());
        assert!(items[2].cancellation.is_none());

        assert_eq!(items[2].actual_end_date, Some(date("2024-01-04")));
        assert_eq!(
            items[2].final_total,
            Some(Money::new(150.into()).unwrap()),
        );
    }

    #[tokio::test]
    async fn applies_filters() {
        let db = Memory::new();
        let (vehicle, _, [completed, cancelled, reserved]) =
            seed_history(&db).await;
        let svc = testing::service(db, "2024-01-10");
        let history = |filter| History {
            vehicle_id: vehicle.id,
            filter,
        };

        let by_status = svc
            .execute(history(Filter {
                status: Some(rental::Status::Cancelled),
                ..Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(
            by_status.iter().map(|i| i.id).collect::<Vec<_>>(),
            [cancelled.id],
        );

        let from = svc
            .execute(history(Filter {
                from: Some(date("2024-02-01")),
                ..Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(
            from.iter().map(|i| i.id).collect::<Vec<_>>(),
            [reserved.id, cancelled.id],
        );

        // Actual end date takes precedence over the estimated one.
        let to = svc
            .execute(history(Filter {
                to: Some(date("2024-01-04")),
                ..Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(
            to.iter().map(|i| i.id).collect::<Vec<_>>(),
            [completed.id],
        );
    }

    #[tokio::test]
    async fn shows_normalized_statuses() {
        let db = Memory::new();
        let (vehicle, _, [_, _, reserved]) = seed_history(&db).await;
        let svc = testing::service(db.clone(), "2024-03-02");

        let items = svc
            .execute(History {
                vehicle_id: vehicle.id,
                filter: Filter {
                    status: Some(rental::Status::Reserved),
                    ..Filter::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, reserved.id);
        assert_eq!(items[0].status, rental::Status::InProgress);
    }

    #[tokio::test]
    async fn rejects_unknown_vehicle() {
        let svc = testing::service(Memory::new(), "2024-03-02");

        let err = svc
            .execute(History {
                vehicle_id: testing::vehicle("50").id,
                filter: Filter::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), HistoryError::VehicleNotExists(_)));
    }

    #[tokio::test]
    async fn sees_only_committed_rentals() {
        let db = Memory::new();
        let (vehicle, customer) = testing::seed(&db, "50").await;
        let (rental, _) = Rental::open(
            customer.id,
            vehicle.id,
            date("2024-05-10"),
            date("2024-05-12"),
            "50".parse().unwrap(),
            date("2024-05-01"),
        )
        .unwrap();
        let svc = testing::service(db.clone(), "2024-05-01");
        let history = History {
            vehicle_id: vehicle.id,
            filter: Filter::default(),
        };

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(rental)).await.unwrap();
        assert!(svc.execute(history).await.unwrap().is_empty());

        tx.execute(Commit).await.unwrap();
        assert_eq!(svc.execute(history).await.unwrap().len(), 1);
    }
}
