//! In-memory [`Database`] implementation.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use itertools::Itertools as _;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracerr::Traced;

use crate::{
    domain::{customer, rental, vehicle, Customer, Rental, Vehicle},
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] client.
///
/// Keeps everything in the process memory, so is meant for tests and local
/// experiments only.
#[derive(Clone, Debug)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self(NonTx(Arc::default()))
    }

    /// Adds the provided [`Vehicle`] to this [`Memory`] database, replacing
    /// the one with the same ID, if any.
    pub async fn add_vehicle(&self, vehicle: Vehicle) {
        self.store().state.write().await.apply(Write::Vehicle(vehicle));
    }

    /// Adds the provided [`Customer`] to this [`Memory`] database, replacing
    /// the one with the same ID, if any.
    pub async fn add_customer(&self, customer: Customer) {
        let mut state = self.store().state.write().await;
        _ = state.customers.insert(customer.id, customer);
    }

    /// Makes all the following writes into this [`Memory`] database fail (or
    /// succeed again).
    pub fn reject_writes(&self, reject: bool) {
        self.store().writes_rejected.store(reject, Ordering::SeqCst);
    }

    /// Returns the [`Store`] of this [`Memory`] database.
    fn store(&self) -> &Arc<Store> {
        &self.0 .0
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Writes are rejected by the [`Memory::reject_writes()`] setting.
    #[display("`Memory` database rejects writes")]
    WritesRejected,
}

/// Shared storage of a [`Memory`] database.
#[derive(Debug, Default)]
struct Store {
    /// Committed [`State`].
    state: RwLock<State>,

    /// Exclusive locks of [`Vehicle`]s.
    locks: Mutex<HashMap<vehicle::Id, Arc<Mutex<()>>>>,

    /// Indicator whether writes should fail.
    writes_rejected: AtomicBool,
}

impl Store {
    /// Fails if writes are rejected at the moment.
    fn check_writable(&self) -> Result<(), Traced<database::Error>> {
        if self.writes_rejected.load(Ordering::SeqCst) {
            return Err(tracerr::new!(database::Error::from(
                Error::WritesRejected
            )));
        }
        Ok(())
    }
}

/// Entities stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`Customer`]s.
    customers: HashMap<customer::Id, Customer>,

    /// Stored [`Rental`]s.
    rentals: HashMap<rental::Id, Rental>,

    /// Stored [`Vehicle`]s.
    vehicles: HashMap<vehicle::Id, Vehicle>,
}

impl State {
    /// Applies the provided [`Write`] to this [`State`].
    fn apply(&mut self, write: Write) {
        match write {
            Write::Rental(r) => {
                _ = self.rentals.insert(r.id, r);
            }
            Write::Vehicle(v) => {
                _ = self.vehicles.insert(v.id, v);
            }
        }
    }

    /// Returns all the [`Rental`]s matching the provided predicate.
    fn rentals_where(&self, pred: impl Fn(&Rental) -> bool) -> Vec<Rental> {
        self.rentals.values().filter(|r| pred(r)).cloned().collect()
    }
}

/// Write into a [`State`].
#[derive(Clone, Debug)]
pub enum Write {
    /// Upsert of a [`Rental`].
    Rental(Rental),

    /// Upsert of a [`Vehicle`].
    Vehicle(Vehicle),
}

/// Connection to a [`Memory`] database.
pub trait Connection {
    /// Runs the provided function over the [`State`] visible to this
    /// [`Connection`].
    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> impl Future<Output = R>;

    /// Performs the provided [`Write`].
    ///
    /// # Errors
    ///
    /// If writes are rejected.
    fn write(
        &self,
        write: Write,
    ) -> impl Future<Output = Result<(), Traced<database::Error>>>;
}

/// Non-transactional [`Memory`] database connection.
#[derive(Clone, Debug)]
pub struct NonTx(Arc<Store>);

impl Connection for NonTx {
    async fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&*self.0.state.read().await)
    }

    async fn write(&self, write: Write) -> Result<(), Traced<database::Error>> {
        self.0.check_writable().map_err(tracerr::wrap!())?;
        self.0.state.write().await.apply(write);
        Ok(())
    }
}

/// Transactional [`Memory`] database connection.
///
/// [`Write`]s are staged until committed, and discarded along with the held
/// locks once the last clone is dropped.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`Store`] this [`Tx`] was started on.
    store: Arc<Store>,

    /// [`Pending`] changes of this [`Tx`].
    pending: Arc<Mutex<Pending>>,
}

/// Changes of a [`Tx`] not committed yet.
#[derive(Debug, Default)]
struct Pending {
    /// Staged [`Write`]s, in the order performed.
    writes: Vec<Write>,

    /// Held locks of [`Vehicle`]s.
    locks: HashMap<vehicle::Id, OwnedMutexGuard<()>>,
}

impl Tx {
    /// Locks the [`Vehicle`] with the provided ID until this [`Tx`] ends.
    async fn lock(&self, id: vehicle::Id) {
        let mut pending = self.pending.lock().await;
        if pending.locks.contains_key(&id) {
            return;
        }

        let mutex =
            Arc::clone(self.store.locks.lock().await.entry(id).or_default());
        _ = pending.locks.insert(id, mutex.lock_owned().await);
    }

    /// Applies the staged [`Write`]s and releases the held locks.
    async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let mut pending = self.pending.lock().await;
        self.store.check_writable().map_err(tracerr::wrap!())?;

        let mut state = self.store.state.write().await;
        for write in pending.writes.drain(..) {
            state.apply(write);
        }
        pending.locks.clear();
        Ok(())
    }
}

impl Connection for Tx {
    async fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        let pending = self.pending.lock().await;
        let state = self.store.state.read().await;
        if pending.writes.is_empty() {
            return f(&state);
        }

        let mut view = state.clone();
        for write in pending.writes.iter().cloned() {
            view.apply(write);
        }
        f(&view)
    }

    async fn write(&self, write: Write) -> Result<(), Traced<database::Error>> {
        self.pending.lock().await.writes.push(write);
        Ok(())
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx {
            store: Arc::clone(self.store()),
            pending: Arc::default(),
        }))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.0.commit().await.map_err(tracerr::wrap!())
    }
}

impl Database<Lock<By<Vehicle, vehicle::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Vehicle, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.lock(by.into_inner()).await;
        Ok(())
    }
}

impl<C> Database<Select<By<Option<Vehicle>, vehicle::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.vehicles.get(&id).cloned()).await)
    }
}

impl<C> Database<Update<Vehicle>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(vehicle): Update<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Write::Vehicle(vehicle))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Option<Customer>, customer::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Customer>, customer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.customers.get(&id).cloned()).await)
    }
}

impl<C, IDs> Database<Select<By<HashMap<customer::Id, Customer>, IDs>>>
    for Memory<C>
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
        Ok(self
            .0
            .read(|s| {
                ids.as_ref()
                    .iter()
                    .filter_map(|id| s.customers.get(id))
                    .map(|c| (c.id, c.clone()))
                    .collect()
            })
            .await)
    }
}

impl<C> Database<Select<By<Option<Rental>, rental::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rental>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.rentals.get(&id).cloned()).await)
    }
}

impl<C> Database<Select<By<Vec<Rental>, vehicle::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Rental>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let vehicle_id = by.into_inner();
        Ok(self
            .0
            .read(|s| s.rentals_where(|r| r.vehicle_id == vehicle_id))
            .await
            .into_iter()
            .sorted_by_key(|r| (r.start_date, r.id))
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Rental>, read::rental::All>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Rental>, read::rental::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .0
            .read(|s| s.rentals_where(|_| true))
            .await
            .into_iter()
            .sorted_by(|a, b| {
                b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
            })
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Rental>, read::rental::NonTerminal>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Rental>, read::rental::NonTerminal>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .0
            .read(|s| s.rentals_where(|r| !r.status.is_terminal()))
            .await
            .into_iter()
            .sorted_by_key(|r| (r.start_date, r.id))
            .collect())
    }
}

impl<C>
    Database<Select<By<Vec<Rental>, read::rental::history::Selector>>>
    for Memory<C>
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
        Ok(self
            .0
            .read(|s| {
                s.rentals_where(|r| {
                    r.vehicle_id == vehicle_id && filter.matches(r)
                })
            })
            .await
            .into_iter()
            .sorted_by(|a, b| {
                b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id))
            })
            .collect())
    }
}

impl<C> Database<Insert<Rental>> for Memory<C>
where
    C: Connection,
    Self: Database<Update<Rental>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rental): Insert<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(rental)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Rental>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rental): Update<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Write::Rental(rental))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Commit, Lock, Select, Transact, Update};
    use futures::FutureExt as _;

    use crate::{
        domain::{vehicle, Vehicle},
        infra::Database as _,
        testing,
    };

    use super::Memory;

    async fn status_of(db: &Memory, id: vehicle::Id) -> vehicle::Status {
        db.execute(Select(By::<Option<Vehicle>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn stages_writes_until_commit() {
        let db = Memory::new();
        let mut vehicle = testing::vehicle("50");
        db.add_vehicle(vehicle.clone()).await;

        let tx = db.execute(Transact).await.unwrap();
        vehicle.status = vehicle::Status::Unavailable;
        tx.execute(Update(vehicle.clone())).await.unwrap();

        let seen_by_tx = tx
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen_by_tx.status, vehicle::Status::Unavailable);
        assert_eq!(
            status_of(&db, vehicle.id).await,
            vehicle::Status::Available,
        );

        tx.execute(Commit).await.unwrap();
        assert_eq!(
            status_of(&db, vehicle.id).await,
            vehicle::Status::Unavailable,
        );
    }

    #[tokio::test]
    async fn rolls_back_on_drop() {
        let db = Memory::new();
        let mut vehicle = testing::vehicle("50");
        db.add_vehicle(vehicle.clone()).await;

        let tx = db.execute(Transact).await.unwrap();
        vehicle.status = vehicle::Status::Unavailable;
        tx.execute(Update(vehicle.clone())).await.unwrap();
        drop(tx);

        assert_eq!(
            status_of(&db, vehicle.id).await,
            vehicle::Status::Available,
        );
    }

    #[tokio::test]
    async fn lock_is_exclusive_until_tx_ends() {
        let db = Memory::new();
        let id = vehicle::Id::new();

        let first = db.execute(Transact).await.unwrap();
        first.execute(Lock(By::new(id))).await.unwrap();
        // Re-locking within the same transaction doesn't block.
        first.execute(Lock(By::new(id))).await.unwrap();

        let second = db.execute(Transact).await.unwrap();
        assert!(second.execute(Lock(By::new(id))).now_or_never().is_none());

        let other = vehicle::Id::new();
        assert!(second
            .execute(Lock(By::new(other)))
            .now_or_never()
            .is_some());

        first.execute(Commit).await.unwrap();
        assert!(second.execute(Lock(By::new(id))).now_or_never().is_some());
    }

    #[tokio::test]
    async fn rejects_writes_on_demand() {
        let db = Memory::new();
        let vehicle = testing::vehicle("50");
        db.reject_writes(true);

        assert!(db.execute(Update(vehicle.clone())).await.is_err());

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Update(vehicle.clone())).await.unwrap();
        assert!(tx.execute(Commit).await.is_err());

        db.reject_writes(false);
        db.execute(Update(vehicle)).await.unwrap();
    }
}
