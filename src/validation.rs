//! Input validation for timetable operations.
//!
//! Every check collects all problems instead of stopping at the first, so
//! a caller can show the full list at once. Checks run before any storage
//! access. Detects:
//! - Empty identifiers
//! - Duplicate binding IDs
//! - Day of week outside 1-7
//! - Slots missing from the period table
//! - Inverted or zero-based week ranges
//! - Malformed period tables

use crate::models::{Binding, PeriodTable, PlacementRequest, WeekRange, MAX_DAY, MIN_DAY};
use std::collections::HashSet;
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// An identifier is empty or blank.
    InvalidIdentifier,
    /// Two entities share the same ID.
    DuplicateId,
    /// Day of week outside 1-7.
    DayOutOfRange,
    /// Slot not configured in the period table.
    UnknownSlot,
    /// Week range is inverted or starts before week 1.
    InvalidWeekRange,
    /// Period table is empty or has a malformed rule.
    InvalidPeriodTable,
    /// A numeric setting is out of range.
    InvalidSetting,
    /// A registered binding would change teacher, class, classroom or term.
    OwnerChanged,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Joins error messages with `"; "`.
pub fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_identifier(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidIdentifier,
            format!("{field} must not be empty"),
        ));
    }
}

fn check_weeks(errors: &mut Vec<ValidationError>, weeks: &WeekRange) {
    if weeks.start < 1 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWeekRange,
            format!("week start must be at least 1, got {}", weeks.start),
        ));
    }
    if weeks.start > weeks.end {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWeekRange,
            format!(
                "week start {} is after week end {}",
                weeks.start, weeks.end
            ),
        ));
    }
}

/// Validates a placement request against the period table.
///
/// Checks:
/// 1. Binding ID is not empty
/// 2. Day is within 1-7
/// 3. Slot is configured in `periods`
/// 4. `1 <= weeks.start <= weeks.end`
pub fn validate_request(request: &PlacementRequest, periods: &PeriodTable) -> ValidationResult {
    let mut errors = Vec::new();

    check_identifier(&mut errors, "binding id", &request.binding_id);

    if !(MIN_DAY..=MAX_DAY).contains(&request.day) {
        errors.push(ValidationError::new(
            ValidationErrorKind::DayOutOfRange,
            format!(
                "day of week must be {MIN_DAY}-{MAX_DAY}, got {}",
                request.day
            ),
        ));
    }

    if !periods.contains_slot(request.slot) {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnknownSlot,
            format!("slot {} is not in the period table", request.slot),
        ));
    }

    check_weeks(&mut errors, &request.weeks);

    finish(errors)
}

/// Validates a `(class, term)` group selector.
pub fn validate_group(class_id: &str, term: &str) -> ValidationResult {
    let mut errors = Vec::new();
    check_identifier(&mut errors, "class id", class_id);
    check_identifier(&mut errors, "term", term);
    finish(errors)
}

/// Validates a single identifier argument.
pub fn validate_identifier(field: &str, value: &str) -> ValidationResult {
    let mut errors = Vec::new();
    check_identifier(&mut errors, field, value);
    finish(errors)
}

/// Validates a week range used as a query window.
pub fn validate_weeks(weeks: &WeekRange) -> ValidationResult {
    let mut errors = Vec::new();
    check_weeks(&mut errors, weeks);
    finish(errors)
}

/// Validates a set of bindings before loading them into a registry.
///
/// Checks:
/// 1. No duplicate binding IDs
/// 2. ID, course, class, teacher and term are non-empty
/// 3. A classroom, when present, is non-empty
pub fn validate_bindings(bindings: &[Binding]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for b in bindings {
        if !ids.insert(b.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate binding ID: {}", b.id),
            ));
        }

        let before = errors.len();
        check_identifier(&mut errors, "binding id", &b.id);
        check_identifier(&mut errors, "course id", &b.course_id);
        check_identifier(&mut errors, "class id", &b.class_id);
        check_identifier(&mut errors, "teacher id", &b.teacher_id);
        check_identifier(&mut errors, "term", &b.term);
        if let Some(room) = &b.classroom_id {
            check_identifier(&mut errors, "classroom id", room);
        }
        for e in &mut errors[before..] {
            e.message = format!("Binding '{}': {}", b.id, e.message);
        }
    }

    finish(errors)
}

/// Validates a period table.
///
/// Checks:
/// 1. At least one rule
/// 2. Slots are >= 1 and unique
/// 3. Every rule has days, all within 1-7
pub fn validate_periods(periods: &PeriodTable) -> ValidationResult {
    let mut errors = Vec::new();

    if periods.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidPeriodTable,
            "period table has no slots",
        ));
    }

    let mut slots = HashSet::new();
    for rule in periods.rules() {
        if rule.slot < 1 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPeriodTable,
                "slot numbers start at 1",
            ));
        }
        if !slots.insert(rule.slot) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate slot: {}", rule.slot),
            ));
        }
        if rule.days.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPeriodTable,
                format!("slot {} has no allowed days", rule.slot),
            ));
        }
        for &day in &rule.days {
            if !(MIN_DAY..=MAX_DAY).contains(&day) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DayOutOfRange,
                    format!("slot {} allows day {day}, expected {MIN_DAY}-{MAX_DAY}", rule.slot),
                ));
            }
        }
    }

    finish(errors)
}
