//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;
#[cfg(test)]
mod testing;

use std::error::Error;

use common::{
    operations::{By, Start},
    SystemClock,
};

#[cfg(doc)]
use common::Clock;
#[cfg(doc)]
use infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    /// [`task::ReconcileRentals`] configuration.
    pub reconcile_rentals: task::reconcile_rentals::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Clk = SystemClock> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Clock`] telling the current day to this [`Service`].
    clock: Clk,
}

impl<Db, Clk> Service<Db, Clk> {
    /// Creates a new [`Service`] with the provided parameters.
    ///
    /// [`task::ReconcileRentals`] is spawned into the returned
    /// [`task::Background`] unless disabled in the provided [`Config`].
    pub fn new(
        config: Config,
        database: Db,
        clock: Clk,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ReconcileRentals<Self>,
                        task::reconcile_rentals::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Service {
            config,
            database,
            clock,
        };

        let mut bg = task::Background::default();
        if this.config.reconcile_rentals.enabled {
            let svc = this.clone();
            bg.spawn("reconcile_rentals", async move {
                svc.execute(Start(By::new(svc.config().reconcile_rentals)))
                    .await
            });
        }

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Clock`] of this [`Service`].
    #[must_use]
    pub fn clock(&self) -> &Clk {
        &self.clock
    }
}
