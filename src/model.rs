use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds. The only time type.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;
pub const HOUR_MS: Ms = 60 * MINUTE_MS;

/// Half-open interval `[start, end)`.
///
/// A span is not guaranteed to be well-formed until it has passed
/// `engine::validate_span`; `start >= end` is representable so that callers
/// can hand raw input to the engine and get `InvalidInterval` back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        Self { start, end }
    }

    /// `None` when the difference does not fit in an `Ms`.
    pub fn duration_ms(&self) -> Option<Ms> {
        self.end.checked_sub(self.start)
    }

    /// Two spans overlap iff they share at least one instant. Touching at a
    /// boundary (`a.end == b.start`) is not an overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ── Spaces ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: Ulid,
    pub name: String,
    pub description: String,
}

/// A space that has not been assigned an identity by storage yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpace {
    pub name: String,
    pub description: String,
}

impl NewSpace {
    pub fn into_space(self, id: Ulid) -> Space {
        Space {
            id,
            name: self.name,
            description: self.description,
        }
    }
}

// ── Reservations ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

/// A booked span of a space held by a requester.
///
/// `status` is private: a reservation can only start life as Active (through
/// [`NewReservation::into_reservation`]) and can only move to Cancelled
/// through [`Reservation::cancel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub space_id: Ulid,
    /// User UUID or national-ID string, depending on deployment.
    pub requester: String,
    pub span: Span,
    pub note: Option<String>,
    pub created_at: Ms,
    pub updated_at: Option<Ms>,
    status: ReservationStatus,
}

/// Returned by [`Reservation::cancel`] when the reservation is not Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyCancelled;

impl Reservation {
    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// Active → Cancelled. One-way; a second call is an error, not a no-op.
    pub fn cancel(&mut self, now: Ms) -> Result<(), AlreadyCancelled> {
        if self.status == ReservationStatus::Cancelled {
            return Err(AlreadyCancelled);
        }
        self.status = ReservationStatus::Cancelled;
        self.updated_at = Some(now);
        Ok(())
    }
}

/// An admitted reservation that storage has not assigned an identity to yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub space_id: Ulid,
    pub requester: String,
    pub span: Span,
    pub note: Option<String>,
    pub created_at: Ms,
}

impl NewReservation {
    pub fn into_reservation(self, id: Ulid) -> Reservation {
        Reservation {
            id,
            space_id: self.space_id,
            requester: self.requester,
            span: self.span,
            note: self.note,
            created_at: self.created_at,
            updated_at: None,
            status: ReservationStatus::Active,
        }
    }
}

/// Conjunctive reservation filter. `None` fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub space_id: Option<Ulid>,
    pub requester: Option<String>,
    /// Keep reservations with `span.start >= start_from`.
    pub start_from: Option<Ms>,
    /// Keep reservations with `span.end <= end_until`.
    pub end_until: Option<Ms>,
}

impl ReservationFilter {
    pub fn for_space(space_id: Ulid) -> Self {
        Self {
            space_id: Some(space_id),
            ..Self::default()
        }
    }

    pub fn for_requester(requester: impl Into<String>) -> Self {
        Self {
            requester: Some(requester.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, r: &Reservation) -> bool {
        self.space_id.is_none_or(|id| r.space_id == id)
            && self.requester.as_deref().is_none_or(|req| r.requester == req)
            && self.start_from.is_none_or(|t| r.span.start >= t)
            && self.end_until.is_none_or(|t| r.span.end <= t)
    }
}

/// A reservation joined with its space's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub space_name: String,
}

/// Flat event records. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    SpaceCreated {
        space: Space,
    },
    SpaceUpdated {
        id: Ulid,
        name: String,
        description: String,
    },
    SpaceDeleted {
        id: Ulid,
    },
    ReservationCreated {
        reservation: Reservation,
    },
    /// Full replacement of a stored reservation (e.g. after cancellation).
    ReservationUpdated {
        reservation: Reservation,
    },
    ReservationDeleted {
        id: Ulid,
    },
}
