//! Full-scan invariant audit.
//!
//! Checks a set of committed placements for pairs that double-book a
//! teacher, classroom or class. A healthy store always audits clean; the
//! audit exists to prove it (after auto-assign, after imports).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{ConflictKind, Placement, PlacementId};

/// Two committed placements that collide on one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapViolation {
    /// Colliding dimension.
    pub kind: ConflictKind,
    /// Lower placement id of the pair.
    pub first: PlacementId,
    /// Higher placement id of the pair.
    pub second: PlacementId,
}

/// Returns every colliding pair, one entry per shared dimension.
///
/// Placements are grouped by (term, day, slot) first, so only placements
/// sharing a time cell are compared pairwise. Output is sorted by
/// `(first, second, kind)`.
pub fn audit_placements(placements: &[Placement]) -> Vec<OverlapViolation> {
    let mut cells: HashMap<(&str, u8, u8), Vec<&Placement>> = HashMap::new();
    for p in placements {
        cells
            .entry((p.entry.term.as_str(), p.entry.day, p.entry.slot))
            .or_default()
            .push(p);
    }

    let mut violations = Vec::new();
    for group in cells.values() {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                for kind in a.entry.clash_kinds(&b.entry) {
                    violations.push(OverlapViolation {
                        kind,
                        first: a.id.min(b.id),
                        second: a.id.max(b.id),
                    });
                }
            }
        }
    }

    violations.sort_by_key(|v| (v.first, v.second, v.kind));
    violations
}
