//! [`Vehicle`]-related [`Database`] implementations.

use common::operations::{By, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{vehicle, Vehicle},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Vehicle>, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: vehicle::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, plate, brand, model, year, fuel, \
                   status, daily_price, \
                   created_at, updated_at \
            FROM vehicles \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Vehicle {
                id: row.get("id"),
                plate: row.get("plate"),
                brand: row.get("brand"),
                model: row.get("model"),
                year: u16::try_from(row.get::<_, i32>("year"))
                    .expect("`year` overflow"),
                fuel: row.get("fuel"),
                status: row.get("status"),
                daily_price: row.get("daily_price"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }))
    }
}

/// Persists the [`vehicle::Status`] of a [`Vehicle`] only, as the rest of its
/// data is managed elsewhere.
impl<C> Database<Update<Vehicle>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(vehicle): Update<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        let Vehicle {
            id,
            status,
            updated_at,
            ..
        } = vehicle;

        const SQL: &str = "\
            UPDATE vehicles \
            SET status = $2::INT2, \
                updated_at = $3::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &status, &updated_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Vehicle, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Vehicle, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: vehicle::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM vehicles \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
