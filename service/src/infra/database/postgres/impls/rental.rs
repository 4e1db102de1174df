//! [`Rental`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{rental, vehicle, Rental},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `rentals` table, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, customer_id, vehicle_id, \
    start_date, estimated_end_date, actual_end_date, \
    cancellation_date, cancellation_reason, \
    reserved_daily_price, estimated_total, final_total, \
    status, \
    created_at, updated_at";

/// Reads a [`Rental`] out of the provided [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Rental {
    Rental {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        vehicle_id: row.get("vehicle_id"),
        start_date: row.get("start_date"),
        estimated_end_date: row.get("estimated_end_date"),
        actual_end_date: row.get("actual_end_date"),
        cancellation_date: row.get("cancellation_date"),
        cancellation_reason: row.get("cancellation_reason"),
        reserved_daily_price: row.get("reserved_daily_price"),
        estimated_total: row.get("estimated_total"),
        final_total: row.get("final_total"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Rental>, rental::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rental>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rental::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rentals \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Rental>, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Rental>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let vehicle_id: vehicle::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rentals \
             WHERE vehicle_id = $1::UUID \
             ORDER BY start_date, id",
        );
        Ok(self
            .query(&sql, &[&vehicle_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Rental>, read::rental::All>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Rental>, read::rental::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rentals \
             ORDER BY created_at DESC, id DESC",
        );
        Ok(self
            .query(&sql, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Rental>, read::rental::NonTerminal>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Rental>, read::rental::NonTerminal>>,
    ) -> Result<Self::Ok, Self::Err> {
        let statuses = [rental::Status::Reserved, rental::Status::InProgress];

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rentals \
             WHERE status = ANY($1::INT2[]) \
             ORDER BY start_date, id",
        );
        Ok(self
            .query(&sql, &[&statuses.as_slice()])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Rental>, read::rental::history::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Rental>, read::rental::history::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::rental::history::Selector { vehicle_id, filter } =
            by.into_inner();

        let (sql, ps) = history_sql(&vehicle_id, &filter);
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

/// Builds the SQL selecting the history of the [`Vehicle`] with the provided
/// `vehicle_id` matching the provided [`Filter`], along with its positional
/// parameters.
///
/// [`Filter`]: read::rental::history::Filter
/// [`Vehicle`]: crate::domain::Vehicle
fn history_sql<'a>(
    vehicle_id: &'a vehicle::Id,
    filter: &'a read::rental::history::Filter,
) -> (String, Vec<&'a (dyn ToSql + Sync)>) {
    let read::rental::history::Filter { status, from, to } = filter;

    let mut ps: Vec<&(dyn ToSql + Sync)> = vec![vehicle_id];

    let status_idx = status.as_ref().map(|s| {
        ps.push(s);
        ps.len()
    });
    let from_idx = from.as_ref().map(|d| {
        ps.push(d);
        ps.len()
    });
    let to_idx = to.as_ref().map(|d| {
        ps.push(d);
        ps.len()
    });

    let sql = format!(
        "SELECT {COLUMNS} \
         FROM rentals \
         WHERE vehicle_id = $1::UUID \
               {status_filtering} \
               {from_filtering} \
               {to_filtering} \
         ORDER BY start_date DESC, id DESC",
        status_filtering = status_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND status = ${idx}::INT2"))
        }),
        from_filtering = from_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND start_date >= ${idx}::DATE"))
        }),
        to_filtering = to_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!(
                "AND COALESCE(actual_end_date, estimated_end_date) \
                     <= ${idx}::DATE"
            ))
        }),
    );
    (sql, ps)
}

impl<C> Database<Insert<Rental>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Rental>, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rental): Insert<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(rental))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<Rental>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rental): Update<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        let Rental {
            id,
            customer_id,
            vehicle_id,
            start_date,
            estimated_end_date,
            actual_end_date,
            cancellation_date,
            cancellation_reason,
            reserved_daily_price,
            estimated_total,
            final_total,
            status,
            created_at,
            updated_at,
        } = rental;

        const SQL: &str = "\
            INSERT INTO rentals (\
                id, customer_id, vehicle_id, \
                start_date, estimated_end_date, actual_end_date, \
                cancellation_date, cancellation_reason, \
                reserved_daily_price, estimated_total, final_total, \
                status, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::DATE, $5::DATE, $6::DATE, \
                $7::DATE, $8::VARCHAR, \
                $9::NUMERIC, $10::NUMERIC, $11::NUMERIC, \
                $12::INT2, \
                $13::TIMESTAMPTZ, $14::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET actual_end_date = EXCLUDED.actual_end_date, \
                cancellation_date = EXCLUDED.cancellation_date, \
                cancellation_reason = EXCLUDED.cancellation_reason, \
                final_total = EXCLUDED.final_total, \
                status = EXCLUDED.status, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &customer_id,
                &vehicle_id,
                &start_date,
                &estimated_end_date,
                &actual_end_date,
                &cancellation_date,
                &cancellation_reason,
                &reserved_daily_price,
                &estimated_total,
                &final_total,
                &status,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
