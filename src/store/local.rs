use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;
use ulid::Ulid;

use crate::model::*;
use crate::wal::Wal;

use super::index::Index;
use super::journal::Journal;
use super::{BookingStore, StoreError, StoreResult};

/// DashMap-indexed store. Volatile when built with [`LocalStore::in_memory`],
/// durable (WAL group commit, replay on open) when built with
/// [`LocalStore::open`].
pub struct LocalStore {
    index: Index,
    journal: Option<Journal>,
    /// Commits hold this shared; compaction holds it exclusively so a
    /// snapshot never misses an event that is durable but not yet applied.
    compaction_gate: RwLock<()>,
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self {
            index: Index::default(),
            journal: None,
            compaction_gate: RwLock::new(()),
        }
    }

    /// Replay the log at `path`, trim any torn tail, and keep appending to it. Spawns the WAL
    /// writer task, so this must run inside a Tokio runtime.
    pub fn open(path: &Path) -> io::Result<Self> {
        let events = Wal::recover(path)?;
        let index = Index::default();
        for event in &events {
            index.apply(event);
        }
        info!(
            "replayed {} events from {}: {} spaces, {} reservations",
            events.len(),
            path.display(),
            index.space_count(),
            index.reservation_count()
        );
        // Entries beyond the live state are what compaction would reclaim.
        let live = (index.space_count() + index.reservation_count()) as u64;
        let wal = Wal::open(path)?.with_backlog((events.len() as u64).saturating_sub(live));
        Ok(Self {
            index,
            journal: Some(Journal::spawn(wal)),
            compaction_gate: RwLock::new(()),
        })
    }

    pub fn is_durable(&self) -> bool {
        self.journal.is_some()
    }

    pub fn space_count(&self) -> usize {
        self.index.space_count()
    }

    pub fn reservation_count(&self) -> usize {
        self.index.reservation_count()
    }

    /// Write-ahead, then apply in memory.
    async fn commit(&self, event: Event) -> StoreResult<()> {
        let _gate = self.compaction_gate.read().await;
        if let Some(journal) = &self.journal {
            journal.append(event.clone()).await?;
        }
        self.index.apply(&event);
        Ok(())
    }

    /// Rewrite the log as the minimal event list for the current state.
    /// No-op for an in-memory store.
    pub async fn compact(&self) -> StoreResult<()> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let _gate = self.compaction_gate.write().await;
        let events = self.index.snapshot();
        let count = events.len();
        journal.compact(events).await?;
        info!("compacted WAL to {count} events");
        Ok(())
    }

    pub async fn appends_since_compact(&self) -> u64 {
        match &self.journal {
            Some(journal) => journal.appends_since_compact().await,
            None => 0,
        }
    }
}

#[async_trait]
impl BookingStore for LocalStore {
    async fn find_space(&self, id: Ulid) -> StoreResult<Option<Space>> {
        Ok(self.index.space(&id))
    }

    async fn list_spaces(&self) -> StoreResult<Vec<Space>> {
        Ok(self.index.spaces())
    }

    async fn insert_space(&self, space: NewSpace) -> StoreResult<Space> {
        let space = space.into_space(Ulid::new());
        self.commit(Event::SpaceCreated {
            space: space.clone(),
        })
        .await?;
        Ok(space)
    }

    async fn update_space(&self, space: Space) -> StoreResult<()> {
        if !self.index.contains_space(&space.id) {
            return Err(StoreError::NotFound(space.id));
        }
        self.commit(Event::SpaceUpdated {
            id: space.id,
            name: space.name,
            description: space.description,
        })
        .await
    }

    async fn remove_space(&self, id: Ulid) -> StoreResult<()> {
        if !self.index.contains_space(&id) {
            return Err(StoreError::NotFound(id));
        }
        self.commit(Event::SpaceDeleted { id }).await
    }

    async fn find_overlapping_by_space(
        &self,
        space_id: Ulid,
        span: Span,
    ) -> StoreResult<Vec<Reservation>> {
        Ok(self.index.active_overlapping_space(&space_id, &span))
    }

    async fn find_overlapping_by_requester(
        &self,
        requester: &str,
        span: Span,
    ) -> StoreResult<Vec<Reservation>> {
        Ok(self.index.active_overlapping_requester(requester, &span))
    }

    async fn find_by_id(&self, id: Ulid) -> StoreResult<Option<Reservation>> {
        Ok(self.index.reservation(&id))
    }

    async fn find_all(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        Ok(self.index.matching(filter))
    }

    async fn append(&self, reservation: NewReservation) -> StoreResult<Reservation> {
        let reservation = reservation.into_reservation(Ulid::new());
        self.commit(Event::ReservationCreated {
            reservation: reservation.clone(),
        })
        .await?;
        Ok(reservation)
    }

    async fn update(&self, reservation: Reservation) -> StoreResult<()> {
        if !self.index.contains_reservation(&reservation.id) {
            return Err(StoreError::NotFound(reservation.id));
        }
        self.commit(Event::ReservationUpdated { reservation }).await
    }

    async fn remove(&self, id: Ulid) -> StoreResult<()> {
        if !self.index.contains_reservation(&id) {
            return Err(StoreError::NotFound(id));
        }
        self.commit(Event::ReservationDeleted { id }).await
    }
}
