//! Conflict records and reports.
//!
//! A conflict is an existing placement that would collide with a candidate
//! on the teacher, classroom or class dimension. Reports are plain data:
//! an empty report means the candidate is safe to commit.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Binding, Placement, PlacementId, WeekRange};

/// Dimension on which two placements collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Same teacher.
    Teacher,
    /// Same classroom (both placements have one).
    Classroom,
    /// Same class.
    Class,
}

impl ConflictKind {
    /// All kinds, in report order.
    pub const ALL: [ConflictKind; 3] = [
        ConflictKind::Teacher,
        ConflictKind::Classroom,
        ConflictKind::Class,
    ];

    /// Lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Classroom => "classroom",
            Self::Class => "class",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One colliding placement on one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Colliding dimension.
    pub kind: ConflictKind,
    /// Existing placement that collides.
    pub placement_id: PlacementId,
    /// Binding owning the existing placement.
    pub binding_id: String,
    /// Course of that binding, if the registry still knows it.
    pub course_id: Option<String>,
    /// Course display label.
    pub course_name: String,
    /// Class of that binding.
    pub class_id: String,
    /// Class display label.
    pub class_name: String,
    /// Teacher of that binding.
    pub teacher_id: String,
    /// Teacher display label.
    pub teacher_name: String,
    /// Classroom of that binding.
    pub classroom_id: Option<String>,
    /// Day of the existing placement.
    pub day: u8,
    /// Slot of the existing placement.
    pub slot: u8,
    /// Weeks of the existing placement.
    pub weeks: WeekRange,
}

impl Conflict {
    /// Builds a record from a colliding placement and, when available,
    /// its binding.
    pub fn new(kind: ConflictKind, placement: &Placement, owner: Option<&Binding>) -> Self {
        let entry = &placement.entry;
        let (course_id, course_name, class_name, teacher_name) = match owner {
            Some(b) => (
                Some(b.course_id.clone()),
                b.course_label().to_string(),
                b.class_label().to_string(),
                b.teacher_label().to_string(),
            ),
            None => (
                None,
                entry.binding_id.clone(),
                entry.class_id.clone(),
                entry.teacher_id.clone(),
            ),
        };
        Self {
            kind,
            placement_id: placement.id,
            binding_id: entry.binding_id.clone(),
            course_id,
            course_name,
            class_id: entry.class_id.clone(),
            class_name,
            teacher_id: entry.teacher_id.clone(),
            teacher_name,
            classroom_id: entry.classroom_id.clone(),
            day: entry.day,
            slot: entry.slot,
            weeks: entry.weeks,
        }
    }

    /// Human-readable explanation.
    ///
    /// Teacher and classroom conflicts name the other class; class
    /// conflicts name the other teacher.
    pub fn message(&self) -> String {
        match self.kind {
            ConflictKind::Teacher | ConflictKind::Classroom => {
                format!("{} conflict: {} ({})", self.kind, self.course_name, self.class_name)
            }
            ConflictKind::Class => {
                format!("{} conflict: {} ({})", self.kind, self.course_name, self.teacher_name)
            }
        }
    }
}

/// Result of a conflict check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Conflicts ordered by kind, then placement id.
    pub conflicts: Vec<Conflict>,
}

impl ConflictReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a conflict.
    pub fn push(&mut self, conflict: Conflict) {
        self.conflicts.push(conflict);
    }

    /// Whether nothing collides.
    pub fn is_clear(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Number of conflicts.
    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Iterates conflicts.
    pub fn iter(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter()
    }

    /// Conflicts of one kind.
    pub fn of_kind(&self, kind: ConflictKind) -> Vec<&Conflict> {
        self.conflicts.iter().filter(|c| c.kind == kind).collect()
    }

    /// Messages of all conflicts, in order.
    pub fn messages(&self) -> Vec<String> {
        self.conflicts.iter().map(Conflict::message).collect()
    }

    /// Single-line summary joined with `", "`.
    pub fn summary(&self) -> String {
        self.messages().join(", ")
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clear() {
            f.write_str("no conflicts")
        } else {
            f.write_str(&self.summary())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleEntry;

    fn sample_binding() -> Binding {
        Binding::new("X", "MATH", "C1", "T1", "2024-2025-1")
            .with_course_name("Mathematics")
            .with_class_name("Class 1A")
            .with_teacher_name("Ms. Lin")
    }

    fn sample_placement(b: &Binding) -> Placement {
        Placement::new(3, ScheduleEntry::for_binding(b, 1, 1, WeekRange::new(1, 20)))
    }

    #[test]
    fn test_conflict_from_known_binding() {
        let b = sample_binding();
        let c = Conflict::new(ConflictKind::Teacher, &sample_placement(&b), Some(&b));
        assert_eq!(c.placement_id, 3);
        assert_eq!(c.binding_id, "X");
        assert_eq!(c.course_id.as_deref(), Some("MATH"));
        assert_eq!(c.message(), "teacher conflict: Mathematics (Class 1A)");
    }

    #[test]
    fn test_class_conflict_names_teacher() {
        let b = sample_binding();
        let c = Conflict::new(ConflictKind::Class, &sample_placement(&b), Some(&b));
        assert_eq!(c.message(), "class conflict: Mathematics (Ms. Lin)");
    }

    #[test]
    fn test_conflict_from_unknown_binding() {
        let b = sample_binding();
        let c = Conflict::new(ConflictKind::Class, &sample_placement(&b), None);
        assert!(c.course_id.is_none());
        assert_eq!(c.course_name, "X");
        assert_eq!(c.teacher_name, "T1");
    }

    #[test]
    fn test_report_queries() {
        let b = sample_binding();
        let p = sample_placement(&b);
        let mut r = ConflictReport::new();
        assert!(r.is_clear());
        assert_eq!(r.to_string(), "no conflicts");

        r.push(Conflict::new(ConflictKind::Teacher, &p, Some(&b)));
        r.push(Conflict::new(ConflictKind::Class, &p, Some(&b)));
        assert_eq!(r.len(), 2);
        assert_eq!(r.of_kind(ConflictKind::Class).len(), 1);
        assert!(r.of_kind(ConflictKind::Classroom).is_empty());
        assert_eq!(
            r.summary(),
            "teacher conflict: Mathematics (Class 1A), class conflict: Mathematics (Ms. Lin)"
        );
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&ConflictKind::Classroom).unwrap();
        assert_eq!(json, "\"classroom\"");
    }
}
