use ulid::Ulid;

use crate::store::StoreError;

/// Every way a single engine operation can be rejected. None are fatal to
/// the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `start >= end`.
    InvalidInterval,
    TooShort,
    TooLong,
    InThePast,
    InvalidRequester,
    InvalidSpaceName,
    LimitExceeded(&'static str),
    SpaceNotFound(Ulid),
    /// Carries the id of the reservation already holding the space.
    SpaceConflict(Ulid),
    /// Carries the id of the requester's overlapping reservation.
    RequesterConflict(Ulid),
    SpaceInUse(Ulid),
    NotFound(Ulid),
    AlreadyCancelled(Ulid),
    StorageUnavailable(String),
}

impl EngineError {
    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidInterval => "invalid_interval",
            EngineError::TooShort => "too_short",
            EngineError::TooLong => "too_long",
            EngineError::InThePast => "in_the_past",
            EngineError::InvalidRequester => "invalid_requester",
            EngineError::InvalidSpaceName => "invalid_space_name",
            EngineError::LimitExceeded(_) => "limit_exceeded",
            EngineError::SpaceNotFound(_) => "space_not_found",
            EngineError::SpaceConflict(_) => "space_conflict",
            EngineError::RequesterConflict(_) => "requester_conflict",
            EngineError::SpaceInUse(_) => "space_in_use",
            EngineError::NotFound(_) => "not_found",
            EngineError::AlreadyCancelled(_) => "already_cancelled",
            EngineError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidInterval => write!(f, "end time must be after start time"),
            EngineError::TooShort => write!(f, "minimum reservation duration is 30 minutes"),
            EngineError::TooLong => write!(f, "maximum reservation duration is 8 hours"),
            EngineError::InThePast => write!(f, "cannot create reservations in the past"),
            EngineError::InvalidRequester => write!(f, "requester cannot be empty"),
            EngineError::InvalidSpaceName => write!(f, "space name cannot be empty"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::SpaceNotFound(id) => write!(f, "space not found: {id}"),
            EngineError::SpaceConflict(id) => {
                write!(f, "space already reserved for the selected period by {id}")
            }
            EngineError::RequesterConflict(id) => {
                write!(f, "requester already holds overlapping reservation {id}")
            }
            EngineError::SpaceInUse(id) => {
                write!(f, "cannot delete space {id}: it has active reservations")
            }
            EngineError::NotFound(id) => write!(f, "reservation not found: {id}"),
            EngineError::AlreadyCancelled(id) => write!(f, "reservation {id} is already cancelled"),
            EngineError::StorageUnavailable(e) => write!(f, "storage unavailable: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            StoreError::Unavailable(e) => EngineError::StorageUnavailable(e),
        }
    }
}
