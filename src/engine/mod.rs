//! The booking-invariant enforcer.
//!
//! Every Active reservation satisfies: `start < end`, a duration within
//! `[30 min, 8 h]`, `start >= now` at admission, and no overlap with any other
//! Active reservation on the same space or held by the same requester.
//!
//! Admission is lock-scoped: the space and requester tokens are held from the
//! first conflict read until the write has landed, so concurrent requests for
//! overlapping spans serialize instead of racing past each other's checks.

mod error;
mod locks;
mod mutations;
mod queries;
mod validate;

pub use error::EngineError;
pub use validate::validate_span;

use std::future::Future;
use std::sync::Arc;

use crate::clock::Clock;
use crate::store::{BookingStore, StoreError};

use locks::{LockKey, LockSet, LockTable};

pub struct Engine<S: BookingStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    locks: LockTable,
}

impl<S: BookingStore> Engine<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: LockTable::default(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn lock(&self, keys: Vec<LockKey>) -> LockSet {
        self.locks.acquire(keys).await
    }

    /// Run the write phase on its own task, which owns `locks` until the
    /// store has answered. A caller that goes away mid-write cannot cut the
    /// commit short or release the tokens before it lands.
    async fn commit<T, F, Fut>(&self, locks: LockSet, write: F) -> Result<T, EngineError>
    where
        F: FnOnce(Arc<S>) -> Fut,
        Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
        T: Send + 'static,
    {
        let pending = write(self.store.clone());
        let task = tokio::spawn(async move {
            let result = pending.await;
            drop(locks);
            result
        });
        match task.await {
            Ok(result) => result.map_err(EngineError::from),
            Err(e) => Err(EngineError::StorageUnavailable(format!(
                "commit task failed: {e}"
            ))),
        }
    }
}
