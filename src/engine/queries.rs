use std::collections::HashMap;

use ulid::Ulid;

use crate::model::*;
use crate::store::BookingStore;

use super::{Engine, EngineError};

impl<S: BookingStore> Engine<S> {
    pub async fn get_reservation(&self, id: Ulid) -> Result<Option<Reservation>, EngineError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Snapshot of every reservation matching `filter`, Cancelled ones
    /// included, ordered by `(start, id)`.
    pub async fn query(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, EngineError> {
        let mut found = self.store.find_all(filter).await?;
        // Stores may over-return; the filter is authoritative.
        found.retain(|r| filter.matches(r));
        found.sort_by_key(|r| (r.span.start, r.id));
        Ok(found)
    }

    /// [`Engine::query`] joined with each reservation's space name.
    /// Reservations whose space vanished between the two reads are skipped.
    pub async fn query_views(
        &self,
        filter: &ReservationFilter,
    ) -> Result<Vec<ReservationView>, EngineError> {
        let reservations = self.query(filter).await?;
        let mut names: HashMap<Ulid, Option<String>> = HashMap::new();
        let mut views = Vec::with_capacity(reservations.len());
        for reservation in reservations {
            if !names.contains_key(&reservation.space_id) {
                let name = self
                    .store
                    .find_space(reservation.space_id)
                    .await?
                    .map(|s| s.name);
                names.insert(reservation.space_id, name);
            }
            if let Some(Some(space_name)) = names.get(&reservation.space_id) {
                views.push(ReservationView {
                    space_name: space_name.clone(),
                    reservation,
                });
            }
        }
        Ok(views)
    }

    pub async fn get_space(&self, id: Ulid) -> Result<Option<Space>, EngineError> {
        Ok(self.store.find_space(id).await?)
    }

    /// All spaces, ordered by id.
    pub async fn list_spaces(&self) -> Result<Vec<Space>, EngineError> {
        let mut spaces = self.store.list_spaces().await?;
        spaces.sort_by_key(|s| s.id);
        Ok(spaces)
    }
}
