//! [`Customer`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{customer, Customer},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C, IDs> Database<Select<By<HashMap<customer::Id, Customer>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[customer::Id]>,
{
    type Ok = HashMap<customer::Id, Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<customer::Id, Customer>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[customer::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const SQL: &str = "\
            SELECT id, first_names, last_names, \
                   document_kind, document_number, \
                   email, phone, \
                   created_at \
            FROM customers \
            WHERE id = ANY($1::UUID[])";
        Ok(self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Customer {
                        id,
                        first_names: row.get("first_names"),
                        last_names: row.get("last_names"),
                        document_kind: row.get("document_kind"),
                        document_number: row.get("document_number"),
                        email: row.get("email"),
                        phone: row.get("phone"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Customer>, customer::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<customer::Id, Customer>, [customer::Id; 1]>>,
        Ok = HashMap<customer::Id, Customer>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Customer>, customer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}
