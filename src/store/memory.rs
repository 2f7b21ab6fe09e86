//! In-process schedule store.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::{check_entry, colliding, PlacementFilter, ScheduleStore};
use crate::error::StoreError;
use crate::models::{Placement, PlacementId, ScheduleEntry};

/// `RwLock`-guarded placement map.
///
/// The overlap re-check and the insert happen under one write lock, so two
/// racing inserts can never both pass.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: PlacementId,
    placements: BTreeMap<PlacementId, Placement>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored placements.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .placements
            .len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScheduleStore for MemoryStore {
    fn list_placements(&self, filter: &PlacementFilter) -> Result<Vec<Placement>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .placements
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    fn insert_placement(&self, entry: ScheduleEntry) -> Result<Placement, StoreError> {
        check_entry(&entry)?;
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        let collisions = colliding(&entry, inner.placements.values());
        if !collisions.is_empty() {
            return Err(StoreError::Conflict {
                colliding: collisions,
            });
        }

        inner.next_id += 1;
        let placement = Placement::new(inner.next_id, entry);
        inner.placements.insert(placement.id, placement.clone());
        Ok(placement)
    }

    fn delete_placement(&self, id: PlacementId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner
            .placements
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
