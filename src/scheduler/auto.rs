//! Randomized greedy auto-assignment.
//!
//! # Algorithm
//!
//! 1. List the class's bindings for the term, in registry order.
//! 2. For each binding, `remaining = weekly_hours - placed`.
//! 3. While hours remain and the draw budget lasts, draw a `(slot, day)`
//!    candidate from the period table and try a guarded commit over the
//!    full term. A conflicting draw costs one attempt.
//! 4. Hours still missing when the budget runs out count as failed.
//!
//! There is no backtracking: earlier bindings keep their cells even when
//! that leaves later bindings without room.
//!
//! # Complexity
//! O(b * a * k) where b = bindings, a = max attempts, k = placements
//! sharing a candidate's time cell.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::commit::{Committer, DimensionLocks, PlacementOutcome};
use crate::config::EngineConfig;
use crate::error::{Result, StoreError, TimetableError};
use crate::models::{Binding, WeekRange};
use crate::registry::BindingRegistry;
use crate::store::{PlacementFilter, ScheduleStore};
use crate::validation::validate_group;

/// Hours placed and hours left unplaced by one auto-assign run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    /// Placements committed by this run.
    pub scheduled: usize,
    /// Required hours that found no free cell.
    pub failed: usize,
}

impl AssignmentOutcome {
    /// Whether every missing hour was placed.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Fills a class's missing weekly hours with random conflict-free cells.
///
/// # Example
///
/// ```
/// use u_timetable::config::EngineConfig;
/// use u_timetable::models::Binding;
/// use u_timetable::registry::MemoryRegistry;
/// use u_timetable::scheduler::{AutoAssigner, DimensionLocks};
/// use u_timetable::store::MemoryStore;
///
/// let registry = MemoryRegistry::new().with_binding(
///     Binding::new("B1", "MATH", "C1", "T1", "2024-2025-1").with_weekly_hours(3),
/// );
/// let store = MemoryStore::new();
/// let config = EngineConfig::default().with_seed(7);
/// let locks = DimensionLocks::new();
///
/// let assigner = AutoAssigner::new(&registry, &store, &config, &locks);
/// let outcome = assigner.assign("C1", "2024-2025-1").unwrap();
/// assert_eq!(outcome.scheduled, 3);
/// assert_eq!(outcome.failed, 0);
/// ```
pub struct AutoAssigner<'a, R: ?Sized, S: ?Sized> {
    registry: &'a R,
    store: &'a S,
    config: &'a EngineConfig,
    committer: Committer<'a, R, S>,
}

impl<'a, R, S> AutoAssigner<'a, R, S>
where
    R: BindingRegistry + ?Sized,
    S: ScheduleStore + ?Sized,
{
    /// Creates an assigner over explicit handles.
    pub fn new(
        registry: &'a R,
        store: &'a S,
        config: &'a EngineConfig,
        locks: &'a DimensionLocks,
    ) -> Self {
        Self {
            registry,
            store,
            config,
            committer: Committer::new(registry, store, &config.periods, locks),
        }
    }

    /// Assigns with the configured seed, or the thread RNG when unset.
    pub fn assign(&self, class_id: &str, term: &str) -> Result<AssignmentOutcome> {
        match self.config.seed {
            Some(seed) => self.assign_with_rng(class_id, term, &mut SmallRng::seed_from_u64(seed)),
            None => self.assign_with_rng(class_id, term, &mut rand::rng()),
        }
    }

    /// Assigns using `rng` for candidate draws.
    ///
    /// # Errors
    /// - `InvalidInput` for a blank class id or term, or a config with
    ///   out-of-range settings
    /// - `NothingToSchedule` when the class has no bindings in the term
    /// - `Store` when a read or a non-conflict write fails
    pub fn assign_with_rng<G: Rng + ?Sized>(
        &self,
        class_id: &str,
        term: &str,
        rng: &mut G,
    ) -> Result<AssignmentOutcome> {
        validate_group(class_id, term)?;
        self.config.check()?;

        let bindings = self.registry.list_bindings(class_id, term);
        if bindings.is_empty() {
            return Err(TimetableError::NothingToSchedule {
                class_id: class_id.to_string(),
                term: term.to_string(),
            });
        }

        let weeks = WeekRange::full_term(self.config.term_weeks);
        let mut outcome = AssignmentOutcome::default();

        for binding in &bindings {
            let placed = self.store.count_placements(
                &PlacementFilter::new()
                    .term(term)
                    .binding(binding.id.as_str()),
            )?;
            let remaining = (binding.weekly_hours as usize).saturating_sub(placed);
            if remaining == 0 {
                tracing::debug!(binding_id = %binding.id, placed, "binding already complete");
                continue;
            }

            let scheduled = self.fill(binding, remaining, weeks, rng)?;
            outcome.scheduled += scheduled;
            if scheduled < remaining {
                let missing = remaining - scheduled;
                outcome.failed += missing;
                tracing::warn!(
                    binding_id = %binding.id,
                    course = binding.course_label(),
                    missing,
                    attempts = self.config.max_attempts,
                    "no free cell found within draw budget"
                );
            }
        }

        tracing::info!(
            action = "auto_assign",
            class_id,
            term,
            scheduled = outcome.scheduled,
            failed = outcome.failed,
            "auto-assign finished"
        );
        Ok(outcome)
    }

    /// Draws candidates for one binding until `remaining` hours are placed
    /// or the budget is spent. Returns the number placed.
    fn fill<G: Rng + ?Sized>(
        &self,
        binding: &Binding,
        remaining: usize,
        weeks: WeekRange,
        rng: &mut G,
    ) -> std::result::Result<usize, StoreError> {
        let mut scheduled = 0;
        let mut attempts = 0;

        while scheduled < remaining && attempts < self.config.max_attempts {
            attempts += 1;
            let Some((slot, day)) = self.config.periods.draw(rng) else {
                break;
            };

            match self.committer.commit(binding, day, slot, weeks)? {
                PlacementOutcome::Placed(p) => {
                    scheduled += 1;
                    tracing::debug!(
                        placement_id = p.id,
                        binding_id = %binding.id,
                        day,
                        slot,
                        attempts,
                        "auto-placed"
                    );
                }
                PlacementOutcome::Conflicted(report) => {
                    tracing::debug!(
                        binding_id = %binding.id,
                        day,
                        slot,
                        conflicts = report.len(),
                        "candidate rejected"
                    );
                }
            }
        }

        Ok(scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::audit_placements;
    use crate::models::{PeriodTable, ScheduleEntry};
    use crate::registry::MemoryRegistry;
    use crate::store::MemoryStore;
    use crate::validation::ValidationErrorKind;

    const TERM: &str = "2024-2025-1";

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn test_tops_up_partial_binding() {
        // 3 hours required, 1 already placed: exactly 2 more.
        let registry = MemoryRegistry::new().with_binding(
            Binding::new("B1", "MATH", "C1", "T1", TERM)
                .with_classroom("R1")
                .with_weekly_hours(3),
        );
        let store = MemoryStore::new();
        let b1 = registry.get_binding("B1").unwrap();
        store
            .insert_placement(ScheduleEntry::for_binding(&b1, 1, 1, WeekRange::full_term(20)))
            .unwrap();

        let config = EngineConfig::default();
        let locks = DimensionLocks::new();
        let assigner = AutoAssigner::new(&registry, &store, &config, &locks);
        let outcome = assigner.assign_with_rng("C1", TERM, &mut rng()).unwrap();

        assert_eq!(outcome, AssignmentOutcome { scheduled: 2, failed: 0 });
        assert_eq!(store.len(), 3);
        let all = store.list_placements(&PlacementFilter::new()).unwrap();
        assert!(audit_placements(&all).is_empty());
        assert!(all.iter().all(|p| p.entry.weeks == WeekRange::new(1, 20)));
    }

    #[test]
    fn test_exhausted_candidates_fail() {
        // One cell, two bindings of the same class.
        let registry = MemoryRegistry::new()
            .with_binding(Binding::new("B1", "MATH", "C1", "T1", TERM).with_weekly_hours(1))
            .with_binding(Binding::new("B2", "ART", "C1", "T2", TERM).with_weekly_hours(1));
        let store = MemoryStore::new();
        let config =
            EngineConfig::default().with_periods(PeriodTable::new().with_rule(1, [1]));
        let locks = DimensionLocks::new();

        let assigner = AutoAssigner::new(&registry, &store, &config, &locks);
        let outcome = assigner.assign_with_rng("C1", TERM, &mut rng()).unwrap();

        assert_eq!(outcome, AssignmentOutcome { scheduled: 1, failed: 1 });
        assert!(!outcome.is_complete());
        let all = store.list_placements(&PlacementFilter::new()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].binding_id(), "B1");
        assert!(audit_placements(&all).is_empty());
    }

    #[test]
    fn test_complete_binding_untouched() {
        let registry = MemoryRegistry::new()
            .with_binding(Binding::new("B1", "MATH", "C1", "T1", TERM).with_weekly_hours(1))
            .with_binding(Binding::new("B0", "CLUB", "C1", "T1", TERM));
        let store = MemoryStore::new();
        let b1 = registry.get_binding("B1").unwrap();
        store
            .insert_placement(ScheduleEntry::for_binding(&b1, 2, 3, WeekRange::full_term(20)))
            .unwrap();

        let config = EngineConfig::default();
        let locks = DimensionLocks::new();
        let assigner = AutoAssigner::new(&registry, &store, &config, &locks);
        let outcome = assigner.assign_with_rng("C1", TERM, &mut rng()).unwrap();

        assert_eq!(outcome, AssignmentOutcome::default());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_respects_other_classes() {
        // T1 teaches C1 and C2; every run must keep T1 single-booked.
        let registry = MemoryRegistry::new()
            .with_binding(Binding::new("A", "MATH", "C1", "T1", TERM).with_weekly_hours(5))
            .with_binding(Binding::new("B", "MATH", "C2", "T1", TERM).with_weekly_hours(5));
        let store = MemoryStore::new();
        let config = EngineConfig::default().with_term_weeks(18);
        let locks = DimensionLocks::new();
        let assigner = AutoAssigner::new(&registry, &store, &config, &locks);

        let mut rng = rng();
        assigner.assign_with_rng("C1", TERM, &mut rng).unwrap();
        assigner.assign_with_rng("C2", TERM, &mut rng).unwrap();

        let all = store.list_placements(&PlacementFilter::new()).unwrap();
        assert!(audit_placements(&all).is_empty());
        assert!(all.iter().all(|p| p.entry.weeks == WeekRange::new(1, 18)));
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let registry = MemoryRegistry::new()
            .with_binding(Binding::new("B1", "MATH", "C1", "T1", TERM).with_weekly_hours(4));
        let config = EngineConfig::default().with_seed(99);
        let locks = DimensionLocks::new();

        let cells = |store: &MemoryStore| {
            store
                .list_placements(&PlacementFilter::new())
                .unwrap()
                .into_iter()
                .map(|p| (p.entry.day, p.entry.slot))
                .collect::<Vec<_>>()
        };

        let first = MemoryStore::new();
        AutoAssigner::new(&registry, &first, &config, &locks)
            .assign("C1", TERM)
            .unwrap();
        let second = MemoryStore::new();
        AutoAssigner::new(&registry, &second, &config, &locks)
            .assign("C1", TERM)
            .unwrap();

        assert_eq!(cells(&first), cells(&second));
    }

    #[test]
    fn test_unvalidated_config_rejected() {
        let registry = MemoryRegistry::new()
            .with_binding(Binding::new("A", "MATH", "C1", "T1", TERM).with_weekly_hours(3));
        let store = MemoryStore::new();
        let config = EngineConfig::default().with_term_weeks(0);
        let locks = DimensionLocks::new();
        let assigner = AutoAssigner::new(&registry, &store, &config, &locks);

        match assigner.assign_with_rng("C1", TERM, &mut rng()).unwrap_err() {
            TimetableError::InvalidInput { errors } => {
                assert_eq!(errors[0].kind, ValidationErrorKind::InvalidSetting);
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_nothing_to_schedule() {
        let registry = MemoryRegistry::new();
        let store = MemoryStore::new();
        let config = EngineConfig::default();
        let locks = DimensionLocks::new();
        let assigner = AutoAssigner::new(&registry, &store, &config, &locks);

        assert!(matches!(
            assigner.assign("C1", TERM),
            Err(TimetableError::NothingToSchedule { .. })
        ));
        match assigner.assign(" ", TERM).unwrap_err() {
            TimetableError::InvalidInput { errors } => {
                assert_eq!(errors[0].kind, ValidationErrorKind::InvalidIdentifier);
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}
