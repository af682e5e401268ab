use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use ulid::Ulid;

/// What an admission token protects. Derived `Ord` fixes the global
/// acquisition order: spaces, then requesters, then single reservations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum LockKey {
    Space(Ulid),
    Requester(String),
    Reservation(Ulid),
}

type Slots = Arc<DashMap<LockKey, Arc<Mutex<()>>>>;

/// Per-key async mutexes held across a check-then-write sequence.
#[derive(Default)]
pub(crate) struct LockTable {
    slots: Slots,
}

impl LockTable {
    /// Acquire every key in sorted order, so two callers can never wait on
    /// each other in a cycle.
    pub async fn acquire(&self, mut keys: Vec<LockKey>) -> LockSet {
        keys.sort();
        keys.dedup();
        // Built up front so a caller dropped mid-acquisition still releases
        // (and prunes) whatever it already holds.
        let mut set = LockSet {
            guards: Vec::with_capacity(keys.len()),
            slots: self.slots.clone(),
        };
        for key in keys {
            let slot = self.slots.entry(key.clone()).or_default().clone();
            set.guards.push((key, slot.lock_owned().await));
        }
        set
    }

    /// Number of keys currently held or awaited.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Held tokens. Dropping releases them and forgets idle slots.
pub(crate) struct LockSet {
    guards: Vec<(LockKey, OwnedMutexGuard<()>)>,
    slots: Slots,
}

impl Drop for LockSet {
    fn drop(&mut self) {
        for (key, guard) in self.guards.drain(..).rev() {
            drop(guard);
            // The table's own Arc is the last one only if nobody holds or awaits the slot.
            self.slots
                .remove_if(&key, |_, slot| Arc::strong_count(slot) == 1);
        }
    }
}
