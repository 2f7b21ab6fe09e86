//! Binding model.
//!
//! A binding pairs one course with one class, one teacher and (optionally)
//! one classroom for a term. It carries the weekly-occurrence quota that
//! placements fill.

use serde::{Deserialize, Serialize};

/// A course delivered to a class by a teacher in a term.
///
/// Bindings are owned by an external registry and referenced by id from
/// placements. Display names are optional; when empty, the id is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Unique binding identifier.
    pub id: String,
    /// Course identifier.
    pub course_id: String,
    /// Class (student group) identifier.
    pub class_id: String,
    /// Teacher identifier.
    pub teacher_id: String,
    /// Classroom identifier. `None` = no fixed room, never room-checked.
    pub classroom_id: Option<String>,
    /// Academic term label (e.g. `"2024-2025-1"`).
    pub term: String,
    /// Required weekly occurrences, derived from the course definition.
    pub weekly_hours: u32,
    /// Course display name.
    #[serde(default)]
    pub course_name: String,
    /// Class display name.
    #[serde(default)]
    pub class_name: String,
    /// Teacher display name.
    #[serde(default)]
    pub teacher_name: String,
}

impl Binding {
    /// Creates a binding with no classroom and no display names.
    pub fn new(
        id: impl Into<String>,
        course_id: impl Into<String>,
        class_id: impl Into<String>,
        teacher_id: impl Into<String>,
        term: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            course_id: course_id.into(),
            class_id: class_id.into(),
            teacher_id: teacher_id.into(),
            classroom_id: None,
            term: term.into(),
            weekly_hours: 0,
            course_name: String::new(),
            class_name: String::new(),
            teacher_name: String::new(),
        }
    }

    /// Sets the classroom.
    pub fn with_classroom(mut self, classroom_id: impl Into<String>) -> Self {
        self.classroom_id = Some(classroom_id.into());
        self
    }

    /// Sets the weekly quota.
    pub fn with_weekly_hours(mut self, weekly_hours: u32) -> Self {
        self.weekly_hours = weekly_hours;
        self
    }

    /// Sets the course display name.
    pub fn with_course_name(mut self, name: impl Into<String>) -> Self {
        self.course_name = name.into();
        self
    }

    /// Sets the class display name.
    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = name.into();
        self
    }

    /// Sets the teacher display name.
    pub fn with_teacher_name(mut self, name: impl Into<String>) -> Self {
        self.teacher_name = name.into();
        self
    }

    /// Course name, falling back to the course id.
    pub fn course_label(&self) -> &str {
        label_or_id(&self.course_name, &self.course_id)
    }

    /// Class name, falling back to the class id.
    pub fn class_label(&self) -> &str {
        label_or_id(&self.class_name, &self.class_id)
    }

    /// Teacher name, falling back to the teacher id.
    pub fn teacher_label(&self) -> &str {
        label_or_id(&self.teacher_name, &self.teacher_id)
    }
}

fn label_or_id<'a>(name: &'a str, id: &'a str) -> &'a str {
    if name.is_empty() {
        id
    } else {
        name
    }
}
