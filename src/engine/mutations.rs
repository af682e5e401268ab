use std::time::Instant;

use tracing::{debug, info};
use ulid::Ulid;

use crate::model::*;
use crate::observability::{ADMISSIONS_TOTAL, ADMISSION_DURATION_SECONDS, CANCELLATIONS_TOTAL};
use crate::store::BookingStore;

use super::locks::LockKey;
use super::validate::{
    first_overlap, require_space, validate_note, validate_requester, validate_space_fields,
    validate_span,
};
use super::{Engine, EngineError};

impl<S: BookingStore> Engine<S> {
    /// Admit a reservation of `space_id` for `requester` over `span`, or say
    /// why not. Exactly one store write on success, none on rejection.
    pub async fn create_reservation(
        &self,
        space_id: Ulid,
        requester: &str,
        span: Span,
        note: Option<String>,
    ) -> Result<Reservation, EngineError> {
        let started = Instant::now();
        let result = self.admit(space_id, requester, span, note).await;
        metrics::histogram!(ADMISSION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        match &result {
            Ok(r) => {
                metrics::counter!(ADMISSIONS_TOTAL, "outcome" => "admitted").increment(1);
                info!(
                    "admitted reservation {} on space {space_id} for {requester} [{}, {})",
                    r.id, span.start, span.end
                );
            }
            Err(e) => {
                metrics::counter!(ADMISSIONS_TOTAL, "outcome" => e.kind()).increment(1);
                debug!("rejected reservation on space {space_id} for {requester}: {e}");
            }
        }
        result
    }

    async fn admit(
        &self,
        space_id: Ulid,
        requester: &str,
        span: Span,
        note: Option<String>,
    ) -> Result<Reservation, EngineError> {
        let now = self.clock.now();
        validate_span(&span, now)?;
        validate_requester(requester)?;
        validate_note(note.as_deref())?;

        let locks = self
            .lock(vec![
                LockKey::Space(space_id),
                LockKey::Requester(requester.to_string()),
            ])
            .await;

        if self.store.find_space(space_id).await?.is_none() {
            return Err(EngineError::SpaceNotFound(space_id));
        }

        let on_space = self.store.find_overlapping_by_space(space_id, span).await?;
        if let Some(existing) = first_overlap(&on_space, &span) {
            return Err(EngineError::SpaceConflict(existing.id));
        }

        let held = self
            .store
            .find_overlapping_by_requester(requester, span)
            .await?;
        if let Some(existing) = first_overlap(&held, &span) {
            return Err(EngineError::RequesterConflict(existing.id));
        }

        let new = NewReservation {
            space_id,
            requester: requester.to_string(),
            span,
            note,
            created_at: now,
        };
        self.commit(locks, move |store| async move { store.append(new).await })
            .await
    }

    /// Active → Cancelled. One read and one write on success.
    pub async fn cancel_reservation(&self, id: Ulid) -> Result<(), EngineError> {
        let locks = self.lock(vec![LockKey::Reservation(id)]).await;

        let mut reservation = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        reservation
            .cancel(self.clock.now())
            .map_err(|_| EngineError::AlreadyCancelled(id))?;

        self.commit(locks, move |store| async move { store.update(reservation).await })
            .await?;
        metrics::counter!(CANCELLATIONS_TOTAL).increment(1);
        info!("cancelled reservation {id}");
        Ok(())
    }

    /// Hard delete. Skips every invariant check; only existence matters.
    pub async fn delete_reservation(&self, id: Ulid) -> Result<(), EngineError> {
        let locks = self.lock(vec![LockKey::Reservation(id)]).await;
        self.commit(locks, move |store| async move { store.remove(id).await })
            .await?;
        info!("deleted reservation {id}");
        Ok(())
    }

    // ── Spaces ───────────────────────────────────────────────

    pub async fn create_space(&self, name: &str, description: &str) -> Result<Space, EngineError> {
        let name = validate_space_fields(name, description)?;
        let new = NewSpace {
            name: name.to_string(),
            description: description.to_string(),
        };
        let locks = self.lock(Vec::new()).await;
        let space = self
            .commit(locks, move |store| async move { store.insert_space(new).await })
            .await?;
        info!("created space {} ({})", space.id, space.name);
        Ok(space)
    }

    /// Rename / redescribe a space.
    pub async fn update_space(
        &self,
        id: Ulid,
        name: &str,
        description: &str,
    ) -> Result<Space, EngineError> {
        let name = validate_space_fields(name, description)?;
        let locks = self.lock(vec![LockKey::Space(id)]).await;
        require_space(self.store.find_space(id).await?, id)?;

        let space = Space {
            id,
            name: name.to_string(),
            description: description.to_string(),
        };
        let updated = space.clone();
        self.commit(locks, move |store| async move { store.update_space(updated).await })
            .await
            .map_err(|e| space_not_found(e, id))?;
        Ok(space)
    }

    /// Remove a space and its (cancelled) booking history. Refused while any
    /// Active reservation still references it.
    pub async fn delete_space(&self, id: Ulid) -> Result<(), EngineError> {
        let locks = self.lock(vec![LockKey::Space(id)]).await;
        require_space(self.store.find_space(id).await?, id)?;

        let history = self
            .store
            .find_all(&ReservationFilter::for_space(id))
            .await?;
        if history.iter().any(Reservation::is_active) {
            return Err(EngineError::SpaceInUse(id));
        }

        self.commit(locks, move |store| async move { store.remove_space(id).await })
            .await
            .map_err(|e| space_not_found(e, id))?;
        info!("deleted space {id}");
        Ok(())
    }
}

/// A store-level NotFound on a space path names the space, not a reservation.
fn space_not_found(e: EngineError, id: Ulid) -> EngineError {
    match e {
        EngineError::NotFound(missing) if missing == id => EngineError::SpaceNotFound(id),
        other => other,
    }
}
