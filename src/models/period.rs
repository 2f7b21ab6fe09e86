//! Daily period table.
//!
//! The institution's fixed teaching periods. Each rule names a time slot
//! and the weekdays on which that slot may be used for automatic placement.
//! Later periods are typically open on fewer weekdays.
//!
//! # Day numbering
//! Days run 1 (Monday) through 7 (Sunday).

use rand::prelude::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// First valid day of week (Monday).
pub const MIN_DAY: u8 = 1;
/// Last valid day of week (Sunday).
pub const MAX_DAY: u8 = 7;

/// A time slot and the weekdays it is offered on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRule {
    /// Slot index (1-based).
    pub slot: u8,
    /// Allowed days of week (1-7).
    pub days: Vec<u8>,
}

/// The candidate space for placements: slot rules in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodTable {
    rules: Vec<PeriodRule>,
}

impl PeriodRule {
    /// Creates a rule.
    pub fn new(slot: u8, days: impl Into<Vec<u8>>) -> Self {
        Self {
            slot,
            days: days.into(),
        }
    }
}

impl PeriodTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Standard six-period day.
    ///
    /// Slots 1-4 run Monday to Friday; slots 5-6 run Monday to Thursday.
    pub fn standard() -> Self {
        Self::new()
            .with_rule(1, [1, 2, 3, 4, 5])
            .with_rule(2, [1, 2, 3, 4, 5])
            .with_rule(3, [1, 2, 3, 4, 5])
            .with_rule(4, [1, 2, 3, 4, 5])
            .with_rule(5, [1, 2, 3, 4])
            .with_rule(6, [1, 2, 3, 4])
    }

    /// Adds a slot rule.
    pub fn with_rule(mut self, slot: u8, days: impl Into<Vec<u8>>) -> Self {
        self.rules.push(PeriodRule::new(slot, days));
        self
    }

    /// All rules in table order.
    pub fn rules(&self) -> &[PeriodRule] {
        &self.rules
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `slot` is a configured period.
    pub fn contains_slot(&self, slot: u8) -> bool {
        self.rules.iter().any(|r| r.slot == slot)
    }

    /// Days allowed for `slot`, if configured.
    pub fn allowed_days(&self, slot: u8) -> Option<&[u8]> {
        self.rules
            .iter()
            .find(|r| r.slot == slot)
            .map(|r| r.days.as_slice())
    }

    /// Number of (slot, day) candidates.
    pub fn candidate_count(&self) -> usize {
        self.rules.iter().map(|r| r.days.len()).sum()
    }

    /// Draws a random `(slot, day)` candidate.
    ///
    /// The slot is drawn uniformly from the rules, then the day uniformly
    /// from that slot's allowed days. Returns `None` for an empty table or
    /// a rule without days.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(u8, u8)> {
        let rule = self.rules.choose(rng)?;
        let day = rule.days.choose(rng)?;
        Some((rule.slot, *day))
    }
}

impl Default for PeriodTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// English weekday name for a 1-based day, or `None` when out of range.
pub fn day_name(day: u8) -> Option<&'static str> {
    const NAMES: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    if (MIN_DAY..=MAX_DAY).contains(&day) {
        Some(NAMES[(day - MIN_DAY) as usize])
    } else {
        None
    }
}

/// Display label for a slot (e.g. `"period 3"`).
pub fn slot_name(slot: u8) -> String {
    format!("period {slot}")
}
