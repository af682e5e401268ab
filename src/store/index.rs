use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

/// In-memory materialization of the event log: spaces, reservations and the
/// secondary indexes the overlap lookups walk.
#[derive(Default)]
pub(super) struct Index {
    spaces: DashMap<Ulid, Space>,
    reservations: DashMap<Ulid, Reservation>,
    /// Space → reservation ids (any status).
    by_space: DashMap<Ulid, Vec<Ulid>>,
    /// Requester → reservation ids (any status).
    by_requester: DashMap<String, Vec<Ulid>>,
}

impl Index {
    // ── Spaces ───────────────────────────────────────────────

    pub fn space(&self, id: &Ulid) -> Option<Space> {
        self.spaces.get(id).map(|e| e.value().clone())
    }

    pub fn contains_space(&self, id: &Ulid) -> bool {
        self.spaces.contains_key(id)
    }

    pub fn spaces(&self) -> Vec<Space> {
        self.spaces.iter().map(|e| e.value().clone()).collect()
    }

    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    // ── Reservations ─────────────────────────────────────────

    pub fn reservation(&self, id: &Ulid) -> Option<Reservation> {
        self.reservations.get(id).map(|e| e.value().clone())
    }

    pub fn contains_reservation(&self, id: &Ulid) -> bool {
        self.reservations.contains_key(id)
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    pub fn matching(&self, filter: &ReservationFilter) -> Vec<Reservation> {
        // Narrow through a secondary index when the filter allows it.
        let candidates = match (&filter.space_id, &filter.requester) {
            (Some(space_id), _) => self.ids_for_space(space_id),
            (None, Some(requester)) => self.ids_for_requester(requester),
            (None, None) => {
                return self
                    .reservations
                    .iter()
                    .filter(|e| filter.matches(e.value()))
                    .map(|e| e.value().clone())
                    .collect();
            }
        };
        self.collect(&candidates, |r| filter.matches(r))
    }

    pub fn active_overlapping_space(&self, space_id: &Ulid, span: &Span) -> Vec<Reservation> {
        let ids = self.ids_for_space(space_id);
        self.collect(&ids, |r| r.is_active() && r.span.overlaps(span))
    }

    pub fn active_overlapping_requester(&self, requester: &str, span: &Span) -> Vec<Reservation> {
        let ids = self.ids_for_requester(requester);
        self.collect(&ids, |r| r.is_active() && r.span.overlaps(span))
    }

    fn ids_for_space(&self, space_id: &Ulid) -> Vec<Ulid> {
        self.by_space
            .get(space_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    fn ids_for_requester(&self, requester: &str) -> Vec<Ulid> {
        self.by_requester
            .get(requester)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    fn collect(&self, ids: &[Ulid], keep: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        ids.iter()
            .filter_map(|id| self.reservations.get(id))
            .filter(|e| keep(e.value()))
            .map(|e| e.value().clone())
            .collect()
    }

    // ── Event application ────────────────────────────────────

    pub fn apply(&self, event: &Event) {
        match event {
            Event::SpaceCreated { space } => {
                self.spaces.insert(space.id, space.clone());
            }
            Event::SpaceUpdated {
                id,
                name,
                description,
            } => {
                if let Some(mut space) = self.spaces.get_mut(id) {
                    space.name = name.clone();
                    space.description = description.clone();
                }
            }
            Event::SpaceDeleted { id } => {
                self.spaces.remove(id);
                if let Some((_, ids)) = self.by_space.remove(id) {
                    for rid in ids {
                        if let Some((_, r)) = self.reservations.remove(&rid) {
                            self.unlink_requester(&r.requester, &rid);
                        }
                    }
                }
            }
            Event::ReservationCreated { reservation } => {
                self.link(reservation);
                self.reservations.insert(reservation.id, reservation.clone());
            }
            Event::ReservationUpdated { reservation } => {
                match self.reservations.insert(reservation.id, reservation.clone()) {
                    Some(old)
                        if old.space_id != reservation.space_id
                            || old.requester != reservation.requester =>
                    {
                        self.unlink(&old);
                        self.link(reservation);
                    }
                    Some(_) => {}
                    // Updates to unknown ids only come from a corrupt log.
                    None => self.link(reservation),
                }
            }
            Event::ReservationDeleted { id } => {
                if let Some((_, r)) = self.reservations.remove(id) {
                    self.unlink(&r);
                }
            }
        }
    }

    /// Rebuild the minimal event list that recreates the current state.
    pub fn snapshot(&self) -> Vec<Event> {
        let mut spaces = self.spaces();
        spaces.sort_by_key(|s| s.id);
        let mut reservations: Vec<Reservation> =
            self.reservations.iter().map(|e| e.value().clone()).collect();
        reservations.sort_by_key(|r| r.id);

        spaces
            .into_iter()
            .map(|space| Event::SpaceCreated { space })
            .chain(
                reservations
                    .into_iter()
                    .map(|reservation| Event::ReservationCreated { reservation }),
            )
            .collect()
    }

    fn link(&self, r: &Reservation) {
        self.by_space.entry(r.space_id).or_default().push(r.id);
        self.by_requester
            .entry(r.requester.clone())
            .or_default()
            .push(r.id);
    }

    fn unlink(&self, r: &Reservation) {
        let emptied = match self.by_space.get_mut(&r.space_id) {
            Some(mut ids) => {
                ids.retain(|id| id != &r.id);
                ids.is_empty()
            }
            None => false,
        };
        if emptied {
            self.by_space.remove_if(&r.space_id, |_, ids| ids.is_empty());
        }
        self.unlink_requester(&r.requester, &r.id);
    }

    fn unlink_requester(&self, requester: &str, id: &Ulid) {
        let emptied = match self.by_requester.get_mut(requester) {
            Some(mut ids) => {
                ids.retain(|i| i != id);
                ids.is_empty()
            }
            None => false,
        };
        if emptied {
            self.by_requester.remove_if(requester, |_, ids| ids.is_empty());
        }
    }
}
