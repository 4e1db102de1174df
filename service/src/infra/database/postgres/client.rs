//! Postgres database client definitions.

use std::{fmt, sync::Arc};

use tokio::sync::Mutex;
use tokio_postgres::{Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{
        self,
        connection::{self, Params},
        Connection,
    },
};

/// Non-transactional Postgres database client.
///
/// Every statement runs on its own [`connection::Pooled`] connection taken
/// from the [`connection::Pool`].
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to take [`Connection`]s from.
    pub(crate) pool: connection::Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client from the provided [`connection::Pool`].
    #[must_use]
    pub(crate) const fn from_pool(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Takes a [`connection::Pooled`] connection out of the pool.
    pub(crate) async fn connection(
        &self,
    ) -> Result<connection::Pooled, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        conn.query(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        conn.query_opt(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        conn.execute(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Transactional Postgres database client.
///
/// Clones share the same [`connection::PooledTx`], rolled back once the
/// last of them is dropped without a [`Tx::commit()`].
#[derive(Clone)]
pub struct Tx(Arc<Mutex<Option<connection::PooledTx>>>);

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx").finish_non_exhaustive()
    }
}

impl Tx {
    /// Begins a new [`Tx`] on a [`Connection`] of the provided [`NonTx`]
    /// client.
    ///
    /// # Errors
    ///
    /// If failed to take a [`Connection`] or to begin a transaction in it.
    pub async fn begin(
        client: &NonTx,
    ) -> Result<Self, Traced<database::Error>> {
        let conn = client.connection().await.map_err(tracerr::wrap!())?;
        let tx = connection::PooledTx::begin(conn)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Self(Arc::new(Mutex::new(Some(tx)))))
    }

    /// Commits this [`Tx`].
    ///
    /// Committing an already committed [`Tx`] does nothing.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction of this [`Tx`].
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let tx = self.0.lock().await.take();
        if let Some(tx) = tx {
            tx.commit().await.map_err(tracerr::wrap!())?;
        }
        Ok(())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.0
            .lock()
            .await
            .as_ref()
            .expect("already committed")
            .query(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.0
            .lock()
            .await
            .as_ref()
            .expect("already committed")
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.0
            .lock()
            .await
            .as_ref()
            .expect("already committed")
            .execute(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}
