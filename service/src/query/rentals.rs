//! [`Query`] collection related to the multiple [`Rental`]s.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    command::{normalize_rental, NormalizeRental},
    domain::Rental,
    infra::{database, Database},
    read, Command, Service,
};

use super::Query;

/// Queries all the [`Rental`]s, the most recently created first, normalized
/// on the current day.
#[derive(Clone, Copy, Debug, Default)]
pub struct All;

impl<Db, Clk> Query<All> for Service<Db, Clk>
where
    Db: Database<
        Select<By<Vec<Rental>, read::rental::All>>,
        Ok = Vec<Rental>,
        Err = Traced<database::Error>,
    >,
    Self: Command<
        NormalizeRental,
        Ok = Rental,
        Err = Traced<normalize_rental::ExecutionError>,
    >,
{
    type Ok = Vec<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: All) -> Result<Self::Ok, Self::Err> {
        let rentals = self
            .database()
            .execute(Select(By::new(read::rental::All)))
            .await
            .map_err(tracerr::wrap!())?;

        let mut normalized = Vec::with_capacity(rentals.len());
        for rental in rentals {
            normalized.push(self.normalized(rental).await);
        }
        Ok(normalized)
    }
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::{rental, Rental},
        infra::{Database as _, Memory},
        testing::{self, date},
        Query as _,
    };

    use super::All;

    #[tokio::test]
    async fn lists_latest_created_first_normalized() {
        let db = Memory::new();
        let (vehicle, customer) = testing::seed(&db, "50").await;
        let mut ids = vec![];
        for (created, start, end) in [
            ("2024-04-01", "2024-05-01", "2024-05-03"),
            ("2024-04-02", "2024-06-01", "2024-06-03"),
            ("2024-04-03", "2024-07-01", "2024-07-03"),
        ] {
            let (mut rental, _) = Rental::open(
                customer.id,
                vehicle.id,
                date(start),
                date(end),
                "50".parse().unwrap(),
                date("2024-04-01"),
            )
            .unwrap();
            rental.created_at = date(created).start_of_day().coerce();
            ids.push(rental.id);
            db.execute(Insert(rental)).await.unwrap();
        }
        let svc = testing::service(db, "2024-05-02");

        let rentals = svc.execute(All).await.unwrap();

        assert_eq!(
            rentals.iter().map(|r| r.id).collect::<Vec<_>>(),
            ids.into_iter().rev().collect::<Vec<_>>(),
        );
        assert_eq!(
            rentals.iter().map(|r| r.status).collect::<Vec<_>>(),
            [
                rental::Status::Reserved,
                rental::Status::Reserved,
                rental::Status::InProgress,
            ],
        );
    }
}
