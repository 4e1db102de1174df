//! [`Query`] collection related to a single [`Rental`].

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    command::{normalize_rental, NormalizeRental},
    domain::{rental, Rental},
    infra::{database, Database},
    Command, Service,
};

use super::Query;

/// Queries a [`Rental`] by its [`rental::Id`], normalized on the current day.
#[derive(Clone, Copy, Debug)]
pub struct ById(pub rental::Id);

impl<Db, Clk> Query<ById> for Service<Db, Clk>
where
    Db: Database<
        Select<By<Option<Rental>, rental::Id>>,
        Ok = Option<Rental>,
        Err = Traced<database::Error>,
    >,
    Self: Command<
        NormalizeRental,
        Ok = Rental,
        Err = Traced<normalize_rental::ExecutionError>,
    >,
{
    type Ok = Option<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ById(id): ById,
    ) -> Result<Self::Ok, Self::Err> {
        let rental = self
            .database()
            .execute(Select(By::<Option<Rental>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(match rental {
            Some(r) => Some(self.normalized(r).await),
            None => None,
        })
    }
}
