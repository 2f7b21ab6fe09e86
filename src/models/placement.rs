//! Placement model.
//!
//! A placement is one concrete weekly occurrence of a binding: a day, a
//! period slot and an inclusive range of term weeks. The stored entry keeps
//! a denormalized copy of the binding's term, teacher, classroom and class
//! so overlap checks never need the registry.

use serde::{Deserialize, Serialize};

use super::{Binding, ConflictKind};

/// Store-assigned placement identifier.
pub type PlacementId = i64;

/// An inclusive range of 1-based term weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRange {
    /// First week (inclusive).
    pub start: u32,
    /// Last week (inclusive).
    pub end: u32,
}

impl WeekRange {
    /// Creates a week range. Not validated; see [`crate::validation`].
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Weeks `1..=weeks`.
    pub fn full_term(weeks: u32) -> Self {
        Self::new(1, weeks)
    }

    /// Inclusive overlap. Touching boundaries overlap.
    #[inline]
    pub fn overlaps(&self, other: &WeekRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// Number of weeks covered (0 for an inverted range).
    pub fn len(&self) -> u32 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Whether the range covers no week.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A placement not yet committed to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Owning binding.
    pub binding_id: String,
    /// Term of the owning binding (denormalized).
    pub term: String,
    /// Teacher of the owning binding (denormalized).
    pub teacher_id: String,
    /// Classroom of the owning binding (denormalized).
    pub classroom_id: Option<String>,
    /// Class of the owning binding (denormalized).
    pub class_id: String,
    /// Day of week (1-7).
    pub day: u8,
    /// Period slot.
    pub slot: u8,
    /// Weeks the occurrence recurs over.
    pub weeks: WeekRange,
}

impl ScheduleEntry {
    /// Builds an entry for `binding` at the given time.
    pub fn for_binding(binding: &Binding, day: u8, slot: u8, weeks: WeekRange) -> Self {
        Self {
            binding_id: binding.id.clone(),
            term: binding.term.clone(),
            teacher_id: binding.teacher_id.clone(),
            classroom_id: binding.classroom_id.clone(),
            class_id: binding.class_id.clone(),
            day,
            slot,
            weeks,
        }
    }

    /// Whether both entries occupy the same term, day and slot over
    /// overlapping weeks.
    pub fn shares_time_with(&self, other: &ScheduleEntry) -> bool {
        self.term == other.term
            && self.day == other.day
            && self.slot == other.slot
            && self.weeks.overlaps(&other.weeks)
    }

    /// Dimensions on which the two entries collide.
    ///
    /// Empty when they do not share time. The classroom dimension only
    /// counts when both entries have a classroom.
    pub fn clash_kinds(&self, other: &ScheduleEntry) -> Vec<ConflictKind> {
        if !self.shares_time_with(other) {
            return Vec::new();
        }
        ConflictKind::ALL
            .into_iter()
            .filter(|&kind| self.same_owner(other, kind))
            .collect()
    }

    /// Whether the entries share the owner of the given dimension.
    pub fn same_owner(&self, other: &ScheduleEntry, kind: ConflictKind) -> bool {
        match kind {
            ConflictKind::Teacher => self.teacher_id == other.teacher_id,
            ConflictKind::Classroom => match (&self.classroom_id, &other.classroom_id) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            ConflictKind::Class => self.class_id == other.class_id,
        }
    }
}

/// A committed placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Store-assigned identifier.
    pub id: PlacementId,
    /// Placement data.
    #[serde(flatten)]
    pub entry: ScheduleEntry,
}

impl Placement {
    /// Wraps an entry with its store id.
    pub fn new(id: PlacementId, entry: ScheduleEntry) -> Self {
        Self { id, entry }
    }

    /// Owning binding id.
    pub fn binding_id(&self) -> &str {
        &self.entry.binding_id
    }
}

/// A caller's request to check or place an occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    /// Binding to place.
    pub binding_id: String,
    /// Day of week (1-7).
    pub day: u8,
    /// Period slot.
    pub slot: u8,
    /// Weeks the occurrence recurs over.
    pub weeks: WeekRange,
}

impl PlacementRequest {
    /// Creates a request.
    pub fn new(binding_id: impl Into<String>, day: u8, slot: u8, weeks: WeekRange) -> Self {
        Self {
            binding_id: binding_id.into(),
            day,
            slot,
            weeks,
        }
    }
}
