//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use derive_more::Display;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Background environment for running [`Task`]s.
///
/// Resolves once all the spawned [`Task`]s complete, or the first one of them
/// fails.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of tasks.
    set: task::LocalSet,

    /// Handles of spawned tasks along with their names.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), BoxedError>>)>,
}

/// Type-erased error of a [`Task`].
type BoxedError = Box<dyn Error + 'static>;

impl Background {
    /// Spawns a new [`Task`] with the provided `name` inside the
    /// [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self
            .set
            .spawn_local(future.map_err(|e| BoxedError::from(Box::new(e))));
        self.handles.push((name, handle));
    }

    /// Indicates whether no [`Task`]s were spawned into this [`Background`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let tasks = handles.into_iter().map(|(name, h)| {
            h.map(move |r| {
                r.map_err(BoxedError::from)
                    .and_then(|r| r)
                    .map_err(|source| TaskError { name, source })
            })
            .boxed_local()
        });
        let set = iter::once(set.map(Ok).boxed_local());
        future::try_join_all(set.chain(tasks))
            .map_ok(drop)
            .boxed_local()
    }
}

/// Error of a [`Task`] running in a [`Background`].
#[derive(Debug, Display)]
#[display("`{name}` task failed: {source}")]
pub struct TaskError {
    /// Name of the failed [`Task`].
    pub name: &'static str,

    /// Error the [`Task`] failed with.
    pub source: BoxedError,
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}
