//! Pooled Postgres connections and the [`Connection`] abstraction over them.

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as Pooled, CreatePoolError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Statement parameters, bound positionally.
pub type Params<'p> = [&'p (dyn ToSql + Sync)];

/// Something SQL statements can be run on.
pub trait Connection {
    /// Runs the provided `stmt` and returns all the rows it yields.
    ///
    /// # Errors
    ///
    /// If the statement fails.
    fn query<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the provided `stmt` and returns the single row it yields, if any.
    ///
    /// # Errors
    ///
    /// If the statement fails or yields more than one row.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the provided `stmt` and returns the number of rows it affected.
    ///
    /// # Errors
    ///
    /// If the statement fails.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;
}

/// [`Pooled`] connection owning a transaction begun in it.
///
/// Dropping it without [`PooledTx::commit()`] rolls the transaction back.
#[self_referencing]
pub struct PooledTx {
    /// [`Pooled`] connection the transaction runs in.
    conn: Pooled,

    /// Transaction begun in the `conn`, taken once committed.
    #[borrows(mut conn)]
    #[not_covariant]
    tx: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for PooledTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledTx").finish_non_exhaustive()
    }
}

impl PooledTx {
    /// Begins a new transaction in the provided [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If the `BEGIN` statement fails.
    pub async fn begin(conn: Pooled) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(conn, |c| {
            c.transaction().map_ok(Some).boxed()
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
    }

    /// Returns the open transaction of this [`PooledTx`].
    fn transaction(&self) -> &deadpool_postgres::Transaction<'_> {
        self.with_tx(|tx| tx.as_ref().expect("already committed"))
    }

    /// Commits the transaction of this [`PooledTx`], returning its [`Pooled`]
    /// connection back to the [`Pool`].
    ///
    /// # Errors
    ///
    /// If the `COMMIT` statement fails.
    #[expect(clippy::missing_panics_doc, reason = "committed only once")]
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "`Transaction` is invariant over `'this`"
        )]
        self.with_tx_mut(|tx| tx.take())
            .expect("already committed")
            .commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Runs the provided `stmt` in the transaction and returns all the rows it
    /// yields.
    pub(super) async fn query<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Vec<Row>, Error>
    where
        T: ToStatement + ?Sized,
    {
        self.transaction().query(stmt, params).await
    }

    /// Runs the provided `stmt` in the transaction and returns the single row
    /// it yields, if any.
    pub(super) async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Option<Row>, Error>
    where
        T: ToStatement + ?Sized,
    {
        self.transaction().query_opt(stmt, params).await
    }

    /// Runs the provided `stmt` in the transaction and returns the number of
    /// rows it affected.
    pub(super) async fn execute<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<u64, Error>
    where
        T: ToStatement + ?Sized,
    {
        self.transaction().execute(stmt, params).await
    }
}
