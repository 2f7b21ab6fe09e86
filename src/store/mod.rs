//! Schedule store.
//!
//! Persists committed placements. Every implementation must re-check the
//! overlap invariants atomically on insert and reject a colliding entry
//! with [`StoreError::Conflict`]. This backstop holds even when a caller
//! skipped the conflict check or raced another writer.
//!
//! # Implementations
//!
//! - [`MemoryStore`]: in-process, `RwLock`-guarded
//! - [`SqliteStore`]: durable, `rusqlite` with a `BEFORE INSERT` trigger

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::models::{Placement, PlacementId, ScheduleEntry, WeekRange, MAX_DAY, MIN_DAY};

/// Persistence for placements.
pub trait ScheduleStore: Send + Sync {
    /// Placements matching `filter`, ordered by id.
    fn list_placements(&self, filter: &PlacementFilter) -> Result<Vec<Placement>, StoreError>;

    /// Commits an entry and returns it with its new id.
    ///
    /// Fails with [`StoreError::InvalidEntry`] if the day is outside 1-7,
    /// the slot is 0, or the weeks start before week 1 or are inverted.
    /// Fails with [`StoreError::Conflict`] if any stored placement of the
    /// same term shares day, slot and overlapping weeks with the entry on
    /// the teacher, classroom or class dimension.
    fn insert_placement(&self, entry: ScheduleEntry) -> Result<Placement, StoreError>;

    /// Removes a placement.
    fn delete_placement(&self, id: PlacementId) -> Result<(), StoreError>;

    /// Number of placements matching `filter`.
    fn count_placements(&self, filter: &PlacementFilter) -> Result<usize, StoreError> {
        Ok(self.list_placements(filter)?.len())
    }
}

/// Conjunctive placement query. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementFilter {
    /// Term.
    pub term: Option<String>,
    /// Owning binding.
    pub binding_id: Option<String>,
    /// Teacher.
    pub teacher_id: Option<String>,
    /// Classroom.
    pub classroom_id: Option<String>,
    /// Class.
    pub class_id: Option<String>,
    /// Day of week.
    pub day: Option<u8>,
    /// Slot.
    pub slot: Option<u8>,
    /// Weeks that must overlap the placement's weeks.
    pub weeks: Option<WeekRange>,
}

impl PlacementFilter {
    /// Matches every placement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a term.
    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    /// Restricts to a binding.
    pub fn binding(mut self, binding_id: impl Into<String>) -> Self {
        self.binding_id = Some(binding_id.into());
        self
    }

    /// Restricts to a teacher.
    pub fn teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.teacher_id = Some(teacher_id.into());
        self
    }

    /// Restricts to a classroom.
    pub fn classroom(mut self, classroom_id: impl Into<String>) -> Self {
        self.classroom_id = Some(classroom_id.into());
        self
    }

    /// Restricts to a class.
    pub fn class(mut self, class_id: impl Into<String>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }

    /// Restricts to a day.
    pub fn day(mut self, day: u8) -> Self {
        self.day = Some(day);
        self
    }

    /// Restricts to a slot.
    pub fn slot(mut self, slot: u8) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Restricts to placements overlapping `weeks`.
    pub fn overlapping(mut self, weeks: WeekRange) -> Self {
        self.weeks = Some(weeks);
        self
    }

    /// Whether `placement` satisfies every set field.
    pub fn matches(&self, placement: &Placement) -> bool {
        let e = &placement.entry;
        fn eq<T: PartialEq>(want: &Option<T>, have: &T) -> bool {
            want.as_ref().map_or(true, |w| w == have)
        }
        eq(&self.term, &e.term)
            && eq(&self.binding_id, &e.binding_id)
            && eq(&self.teacher_id, &e.teacher_id)
            && self
                .classroom_id
                .as_ref()
                .map_or(true, |room| e.classroom_id.as_ref() == Some(room))
            && eq(&self.class_id, &e.class_id)
            && eq(&self.day, &e.day)
            && eq(&self.slot, &e.slot)
            && self.weeks.map_or(true, |w| w.overlaps(&e.weeks))
    }
}

/// Rejects entries outside the ranges every store persists.
pub(crate) fn check_entry(entry: &ScheduleEntry) -> Result<(), StoreError> {
    let mut problems = Vec::new();
    if !(MIN_DAY..=MAX_DAY).contains(&entry.day) {
        problems.push(format!("day {} is outside {MIN_DAY}-{MAX_DAY}", entry.day));
    }
    if entry.slot < 1 {
        problems.push("slot numbers start at 1".to_string());
    }
    let weeks = entry.weeks;
    if weeks.start < 1 || weeks.end < weeks.start {
        problems.push(format!("weeks {}-{} are not a valid range", weeks.start, weeks.end));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(StoreError::InvalidEntry(problems.join("; ")))
    }
}

/// Stored placements that collide with `entry`, in id order.
pub(crate) fn colliding<'a>(
    entry: &ScheduleEntry,
    stored: impl IntoIterator<Item = &'a Placement>,
) -> Vec<Placement> {
    stored
        .into_iter()
        .filter(|p| !entry.clash_kinds(&p.entry).is_empty())
        .cloned()
        .collect()
}
