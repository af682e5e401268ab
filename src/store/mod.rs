//! Storage collaborator consumed by the engine.
//!
//! The engine never trusts a store's overlap filter: `find_overlapping_*`
//! may over-return and the engine re-applies [`Span::overlaps`] itself.

mod index;
mod journal;
mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use ulid::Ulid;

use crate::model::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(Ulid),
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "not found: {id}"),
            StoreError::Unavailable(e) => write!(f, "storage unavailable: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    async fn find_space(&self, id: Ulid) -> StoreResult<Option<Space>>;

    async fn list_spaces(&self) -> StoreResult<Vec<Space>>;

    /// Persist a new space, assigning its identity.
    async fn insert_space(&self, space: NewSpace) -> StoreResult<Space>;

    async fn update_space(&self, space: Space) -> StoreResult<()>;

    /// Remove a space together with every reservation that references it.
    async fn remove_space(&self, id: Ulid) -> StoreResult<()>;

    /// Active reservations on `space_id` that may overlap `span`.
    async fn find_overlapping_by_space(
        &self,
        space_id: Ulid,
        span: Span,
    ) -> StoreResult<Vec<Reservation>>;

    /// Active reservations held by `requester` on any space that may overlap `span`.
    async fn find_overlapping_by_requester(
        &self,
        requester: &str,
        span: Span,
    ) -> StoreResult<Vec<Reservation>>;

    async fn find_by_id(&self, id: Ulid) -> StoreResult<Option<Reservation>>;

    /// Every reservation matching `filter`, any status, in no particular order.
    async fn find_all(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>>;

    /// Persist an admitted reservation, assigning its identity.
    async fn append(&self, reservation: NewReservation) -> StoreResult<Reservation>;

    /// Replace a stored reservation with the same id.
    async fn update(&self, reservation: Reservation) -> StoreResult<()>;

    async fn remove(&self, id: Ulid) -> StoreResult<()>;
}
