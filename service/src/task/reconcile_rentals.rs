//! [`ReconcileRentals`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Select, Start};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{normalize_rental, NormalizeRental},
    domain::Rental,
    infra::{database, Database},
    read, Command, Service,
};

use super::Task;

/// Configuration for [`ReconcileRentals`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Indicator whether the [`Task`] should run at all.
    #[default(true)]
    pub enabled: bool,

    /// Interval between [`Rental`]s reconciliations.
    #[default(time::Duration::from_secs(60))]
    pub interval: time::Duration,
}

/// [`Task`] for normalizing all the non-terminal [`Rental`]s, so [`Vehicle`]
/// statuses stay correct even if nobody reads the [`Rental`]s.
///
/// [`Vehicle`]: crate::domain::Vehicle
#[derive(Clone, Copy, Debug)]
pub struct ReconcileRentals<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Clk> Task<Start<By<ReconcileRentals<Self>, Config>>>
    for Service<Db, Clk>
where
    ReconcileRentals<Self>: Task<Perform<()>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ReconcileRentals<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ReconcileRentals {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => {
                    log::info!(
                        "`task::ReconcileRentals` corrected {n} rentals",
                    );
                }
                Err(e) => {
                    log::error!("`task::ReconcileRentals` failed: {e}");
                }
            }
        }
    }
}

impl<Db, Clk> Task<Perform<()>> for ReconcileRentals<Service<Db, Clk>>
where
    Db: Database<
        Select<By<Vec<Rental>, read::rental::NonTerminal>>,
        Ok = Vec<Rental>,
        Err = Traced<database::Error>,
    >,
    Service<Db, Clk>: Command<
        NormalizeRental,
        Ok = Rental,
        Err = Traced<normalize_rental::ExecutionError>,
    >,
{
    /// Number of corrected [`Rental`]s.
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let rentals = self
            .service
            .database()
            .execute(Select(By::new(read::rental::NonTerminal)))
            .await
            .map_err(tracerr::wrap!())?;

        let mut corrected = 0;
        for rental in rentals {
            let status = rental.status;
            // A single failure shouldn't prevent the rest from being fixed.
            match self.service.execute(NormalizeRental(rental)).await {
                Ok(r) if r.status != status => corrected += 1,
                Ok(_) => {}
                Err(e) => log::warn!("`task::ReconcileRentals`: {e}"),
            }
        }
        Ok(corrected)
    }
}

/// Error of [`ReconcileRentals`] execution.
pub type ExecutionError = Traced<database::Error>;
