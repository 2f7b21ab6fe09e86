//! Weekly-hour fulfilment.
//!
//! Compares each binding's required weekly hours with its committed
//! placements.
//!
//! | State | Meaning |
//! |-------|---------|
//! | Unscheduled | hours required, none placed |
//! | Partial | some placed, fewer than required |
//! | Complete | placed >= required |

use serde::{Deserialize, Serialize};

use crate::models::Binding;

/// Fulfilment state of one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    /// Nothing placed yet.
    Unscheduled,
    /// Some hours still missing.
    Partial,
    /// All required hours placed.
    Complete,
}

impl ProgressState {
    /// State for `placed` placements against `required` hours.
    pub fn from_counts(placed: usize, required: u32) -> Self {
        let required = required as usize;
        if placed >= required {
            Self::Complete
        } else if placed == 0 {
            Self::Unscheduled
        } else {
            Self::Partial
        }
    }
}

/// Placed versus required hours for one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingProgress {
    /// Binding.
    pub binding_id: String,
    /// Course display label.
    pub course: String,
    /// Required weekly hours.
    pub required: u32,
    /// Committed placements.
    pub placed: usize,
    /// Derived state.
    pub state: ProgressState,
}

impl BindingProgress {
    /// Builds progress for `binding` given its placement count.
    pub fn new(binding: &Binding, placed: usize) -> Self {
        Self {
            binding_id: binding.id.clone(),
            course: binding.course_label().to_string(),
            required: binding.weekly_hours,
            placed,
            state: ProgressState::from_counts(placed, binding.weekly_hours),
        }
    }

    /// Hours still to place.
    pub fn remaining(&self) -> usize {
        (self.required as usize).saturating_sub(self.placed)
    }

    /// Placements beyond the requirement.
    pub fn excess(&self) -> usize {
        self.placed.saturating_sub(self.required as usize)
    }

    /// Whether every required hour is placed.
    pub fn is_complete(&self) -> bool {
        self.state == ProgressState::Complete
    }
}

/// Progress summary for a class in a term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProgress {
    /// Class.
    pub class_id: String,
    /// Term.
    pub term: String,
    /// Per-binding progress in registry order.
    pub bindings: Vec<BindingProgress>,
    /// Sum of required hours.
    pub required_total: u32,
    /// Placements counted toward requirements (excess is ignored).
    pub placed_total: usize,
    /// Bindings with nothing placed.
    pub unscheduled: usize,
    /// Bindings partially placed.
    pub partial: usize,
    /// Bindings fully placed.
    pub complete: usize,
}

impl ClassProgress {
    /// Aggregates per-binding progress.
    pub fn calculate(
        class_id: impl Into<String>,
        term: impl Into<String>,
        bindings: Vec<BindingProgress>,
    ) -> Self {
        let mut required_total = 0;
        let mut placed_total = 0;
        let (mut unscheduled, mut partial, mut complete) = (0, 0, 0);

        for b in &bindings {
            required_total += b.required;
            placed_total += b.placed.min(b.required as usize);
            match b.state {
                ProgressState::Unscheduled => unscheduled += 1,
                ProgressState::Partial => partial += 1,
                ProgressState::Complete => complete += 1,
            }
        }

        Self {
            class_id: class_id.into(),
            term: term.into(),
            bindings,
            required_total,
            placed_total,
            unscheduled,
            partial,
            complete,
        }
    }

    /// Fraction of required hours placed (0.0..1.0). 1.0 when nothing
    /// is required.
    pub fn completion_rate(&self) -> f64 {
        if self.required_total == 0 {
            1.0
        } else {
            self.placed_total as f64 / self.required_total as f64
        }
    }

    /// Whether every binding is complete.
    pub fn is_complete(&self) -> bool {
        self.unscheduled == 0 && self.partial == 0
    }

    /// Bindings still missing hours.
    pub fn incomplete(&self) -> impl Iterator<Item = &BindingProgress> {
        self.bindings.iter().filter(|b| !b.is_complete())
    }
}
