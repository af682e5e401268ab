use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// Shape, then duration bounds, then temporal position. The first failing
/// check wins; later ones are not evaluated.
pub fn validate_span(span: &Span, now: Ms) -> Result<(), EngineError> {
    if span.start >= span.end {
        return Err(EngineError::InvalidInterval);
    }
    // A difference too large for `Ms` is longer than any bound.
    let Some(duration) = span.duration_ms() else {
        return Err(EngineError::TooLong);
    };
    if duration < MIN_RESERVATION_MS {
        return Err(EngineError::TooShort);
    }
    if duration > MAX_RESERVATION_MS {
        return Err(EngineError::TooLong);
    }
    if span.start < now {
        return Err(EngineError::InThePast);
    }
    Ok(())
}

pub(crate) fn validate_requester(requester: &str) -> Result<(), EngineError> {
    if requester.trim().is_empty() {
        return Err(EngineError::InvalidRequester);
    }
    if requester.len() > MAX_REQUESTER_LEN {
        return Err(EngineError::LimitExceeded("requester too long"));
    }
    Ok(())
}

pub(crate) fn validate_note(note: Option<&str>) -> Result<(), EngineError> {
    if note.is_some_and(|n| n.len() > MAX_NOTE_LEN) {
        return Err(EngineError::LimitExceeded("note too long"));
    }
    Ok(())
}

/// Returns the trimmed name.
pub(crate) fn validate_space_fields<'a>(
    name: &'a str,
    description: &str,
) -> Result<&'a str, EngineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::InvalidSpaceName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("space name too long"));
    }
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(EngineError::LimitExceeded("space description too long"));
    }
    Ok(name)
}

pub(crate) fn require_space(found: Option<Space>, id: ulid::Ulid) -> Result<Space, EngineError> {
    found.ok_or(EngineError::SpaceNotFound(id))
}

/// First Active candidate that really overlaps `span`. Stores may over-return.
pub(crate) fn first_overlap<'a>(
    candidates: &'a [Reservation],
    span: &Span,
) -> Option<&'a Reservation> {
    candidates
        .iter()
        .find(|r| r.is_active() && r.span.overlaps(span))
}
