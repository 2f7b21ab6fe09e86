//! Engine facade.
//!
//! `Timetable` owns a registry, a store, the config and the dimension
//! locks, and exposes the engine operations over them. It is `Send + Sync`
//! when its registry and store are, so one instance can serve many
//! threads.

use rand::Rng;

use crate::config::EngineConfig;
use crate::conflict::{audit_placements, ConflictDetector, OverlapViolation};
use crate::error::{ConfigError, Result, TimetableError};
use crate::models::{
    ConflictReport, Placement, PlacementId, PlacementRequest, WeekRange, MAX_DAY, MIN_DAY,
};
use crate::registry::BindingRegistry;
use crate::scheduler::{
    AssignmentOutcome, AutoAssigner, BindingProgress, ClassProgress, Committer, DimensionLocks,
    PlacementOutcome,
};
use crate::store::{PlacementFilter, ScheduleStore};
use crate::validation::{
    validate_group, validate_identifier, validate_weeks, ValidationError, ValidationErrorKind,
};

/// Conflict-checked weekly timetable.
///
/// # Example
///
/// ```
/// use u_timetable::{Timetable, TimetableError};
/// use u_timetable::models::{Binding, PlacementRequest, WeekRange};
/// use u_timetable::registry::MemoryRegistry;
/// use u_timetable::store::MemoryStore;
///
/// let registry = MemoryRegistry::new()
///     .with_binding(Binding::new("X", "MATH", "C1", "T1", "2024-2025-1"))
///     .with_binding(Binding::new("Y", "PHYS", "C2", "T1", "2024-2025-1"));
/// let timetable = Timetable::new(registry, MemoryStore::new());
///
/// let weeks = WeekRange::new(1, 20);
/// timetable
///     .add_placement(&PlacementRequest::new("X", 1, 1, weeks))
///     .unwrap()
///     .into_result()
///     .unwrap();
///
/// // T1 is already teaching on Monday, period 1.
/// let err = timetable
///     .add_placement(&PlacementRequest::new("Y", 1, 1, weeks))
///     .unwrap()
///     .into_result()
///     .unwrap_err();
/// assert!(matches!(err, TimetableError::ConflictDetected(_)));
/// ```
#[derive(Debug)]
pub struct Timetable<R, S> {
    registry: R,
    store: S,
    config: EngineConfig,
    locks: DimensionLocks,
}

impl<R, S> Timetable<R, S>
where
    R: BindingRegistry,
    S: ScheduleStore,
{
    /// Creates a timetable with the default config.
    pub fn new(registry: R, store: S) -> Self {
        Self {
            registry,
            store,
            config: EngineConfig::default(),
            locks: DimensionLocks::new(),
        }
    }

    /// Creates a timetable with a validated config.
    pub fn with_config(
        registry: R,
        store: S,
        config: EngineConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registry,
            store,
            config,
            locks: DimensionLocks::new(),
        })
    }

    /// The binding registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// The schedule store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The active config.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only conflict detector over this timetable's handles.
    pub fn detector(&self) -> ConflictDetector<'_, R, S> {
        ConflictDetector::new(&self.registry, &self.store, &self.config.periods)
    }

    /// Auto-assigner over this timetable's handles.
    pub fn assigner(&self) -> AutoAssigner<'_, R, S> {
        AutoAssigner::new(&self.registry, &self.store, &self.config, &self.locks)
    }

    /// Reports every conflict `request` would cause. Never writes.
    pub fn check_conflict(&self, request: &PlacementRequest) -> Result<ConflictReport> {
        self.detector().detect(request)
    }

    /// Commits `request` if it is conflict-free.
    ///
    /// A conflict is returned as [`PlacementOutcome::Conflicted`], including
    /// one raised by the store after a concurrent writer won the race.
    ///
    /// # Errors
    /// - `InvalidInput` / `InvalidBinding` as for [`Self::check_conflict`]
    /// - `Store` when the store fails for a reason other than overlap
    pub fn add_placement(&self, request: &PlacementRequest) -> Result<PlacementOutcome> {
        let committer = Committer::new(
            &self.registry,
            &self.store,
            &self.config.periods,
            &self.locks,
        );
        let binding = committer.detector().resolve(request)?;
        let outcome = committer.commit(&binding, request.day, request.slot, request.weeks)?;

        match &outcome {
            PlacementOutcome::Placed(p) => tracing::info!(
                action = "add_placement",
                placement_id = p.id,
                binding_id = %binding.id,
                course = binding.course_label(),
                day = request.day,
                slot = request.slot,
                weeks_start = request.weeks.start,
                weeks_end = request.weeks.end,
                "placement added"
            ),
            PlacementOutcome::Conflicted(report) => tracing::debug!(
                binding_id = %binding.id,
                day = request.day,
                slot = request.slot,
                conflicts = %report.summary(),
                "placement rejected"
            ),
        }
        Ok(outcome)
    }

    /// Fills missing weekly hours of every binding of `class_id` in `term`.
    ///
    /// Uses the configured seed when set.
    pub fn auto_assign(&self, class_id: &str, term: &str) -> Result<AssignmentOutcome> {
        self.assigner().assign(class_id, term)
    }

    /// Like [`Self::auto_assign`] with an explicit RNG.
    pub fn auto_assign_with_rng<G: Rng + ?Sized>(
        &self,
        class_id: &str,
        term: &str,
        rng: &mut G,
    ) -> Result<AssignmentOutcome> {
        self.assigner().assign_with_rng(class_id, term, rng)
    }

    /// Removes a placement.
    pub fn delete_placement(&self, id: PlacementId) -> Result<()> {
        self.store.delete_placement(id)?;
        tracing::info!(action = "delete_placement", placement_id = id, "placement deleted");
        Ok(())
    }

    /// Placed versus required hours for one binding.
    pub fn binding_progress(&self, binding_id: &str) -> Result<BindingProgress> {
        validate_identifier("binding id", binding_id)?;
        let binding = self
            .registry
            .get_binding(binding_id)
            .ok_or_else(|| TimetableError::InvalidBinding(binding_id.to_string()))?;
        let placed = self.store.count_placements(
            &PlacementFilter::new()
                .term(binding.term.as_str())
                .binding(binding_id),
        )?;
        Ok(BindingProgress::new(&binding, placed))
    }

    /// Progress of every binding of a class in a term.
    pub fn class_progress(&self, class_id: &str, term: &str) -> Result<ClassProgress> {
        validate_group(class_id, term)?;
        let bindings = self
            .registry
            .list_bindings(class_id, term)
            .iter()
            .map(|b| -> Result<BindingProgress> {
                let filter = PlacementFilter::new().term(term).binding(b.id.as_str());
                Ok(BindingProgress::new(b, self.store.count_placements(&filter)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ClassProgress::calculate(class_id, term, bindings))
    }

    /// A teacher's placements in `term` overlapping `weeks`, by day then slot.
    pub fn teacher_schedule(
        &self,
        teacher_id: &str,
        term: &str,
        weeks: WeekRange,
    ) -> Result<Vec<Placement>> {
        validate_identifier("teacher id", teacher_id)?;
        validate_identifier("term", term)?;
        validate_weeks(&weeks)?;
        self.query(
            PlacementFilter::new()
                .term(term)
                .teacher(teacher_id)
                .overlapping(weeks),
        )
    }

    /// A classroom's placements in `term` overlapping `weeks`, optionally
    /// restricted to one day.
    pub fn classroom_occupancy(
        &self,
        classroom_id: &str,
        term: &str,
        day: Option<u8>,
        weeks: WeekRange,
    ) -> Result<Vec<Placement>> {
        validate_identifier("classroom id", classroom_id)?;
        validate_identifier("term", term)?;
        validate_weeks(&weeks)?;
        let mut filter = PlacementFilter::new()
            .term(term)
            .classroom(classroom_id)
            .overlapping(weeks);
        if let Some(day) = day {
            if !(MIN_DAY..=MAX_DAY).contains(&day) {
                return Err(vec![ValidationError::new(
                    ValidationErrorKind::DayOutOfRange,
                    format!("day {day} is outside {MIN_DAY}-{MAX_DAY}"),
                )]
                .into());
            }
            filter = filter.day(day);
        }
        self.query(filter)
    }

    /// A class's placements in `term`, by day then slot.
    pub fn class_schedule(&self, class_id: &str, term: &str) -> Result<Vec<Placement>> {
        validate_group(class_id, term)?;
        self.query(PlacementFilter::new().term(term).class(class_id))
    }

    /// Every pair of placements in `term` that double-books a dimension.
    /// Empty for a healthy store.
    pub fn audit(&self, term: &str) -> Result<Vec<OverlapViolation>> {
        validate_identifier("term", term)?;
        let placements = self.store.list_placements(&PlacementFilter::new().term(term))?;
        let violations = audit_placements(&placements);
        if !violations.is_empty() {
            tracing::warn!(term, violations = violations.len(), "audit found overlaps");
        }
        Ok(violations)
    }

    fn query(&self, filter: PlacementFilter) -> Result<Vec<Placement>> {
        let mut placements = self.store.list_placements(&filter)?;
        placements.sort_by_key(|p| (p.entry.day, p.entry.slot, p.entry.weeks.start, p.id));
        Ok(placements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Binding, ConflictKind, PeriodTable};
    use crate::registry::MemoryRegistry;
    use crate::scheduler::ProgressState;
    use crate::store::{MemoryStore, SqliteStore};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const TERM: &str = "2024-2025-1";

    fn registry() -> MemoryRegistry {
        MemoryRegistry::new()
            .with_binding(
                Binding::new("X", "MATH", "C1", "T1", TERM)
                    .with_classroom("R1")
                    .with_weekly_hours(3),
            )
            .with_binding(Binding::new("Y", "PHYS", "C2", "T1", TERM).with_weekly_hours(2))
            .with_binding(
                Binding::new("Z", "ART", "C1", "T3", TERM)
                    .with_classroom("R1")
                    .with_weekly_hours(2),
            )
    }

    fn request(id: &str, day: u8, slot: u8) -> PlacementRequest {
        PlacementRequest::new(id, day, slot, WeekRange::new(1, 20))
    }

    #[test]
    fn test_add_check_delete() {
        let tt = Timetable::new(registry(), MemoryStore::new());

        let placed = tt.add_placement(&request("X", 1, 1)).unwrap().into_result().unwrap();
        let report = tt.check_conflict(&request("Y", 1, 1)).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.conflicts[0].kind, ConflictKind::Teacher);

        let outcome = tt.add_placement(&request("Y", 1, 1)).unwrap();
        assert!(!outcome.is_placed());
        assert_eq!(tt.store().len(), 1);

        tt.delete_placement(placed.id).unwrap();
        assert!(tt.check_conflict(&request("Y", 1, 1)).unwrap().is_clear());
        assert!(matches!(
            tt.delete_placement(placed.id),
            Err(TimetableError::Store(_))
        ));
    }

    #[test]
    fn test_add_rejects_invalid_input() {
        let tt = Timetable::new(registry(), MemoryStore::new());
        assert!(matches!(
            tt.add_placement(&request("X", 8, 1)),
            Err(TimetableError::InvalidInput { .. })
        ));
        assert!(matches!(
            tt.add_placement(&request("Q", 1, 1)),
            Err(TimetableError::InvalidBinding(_))
        ));
        assert!(tt.store().is_empty());
    }

    #[test]
    fn test_with_config_validates() {
        let bad = EngineConfig::default().with_periods(PeriodTable::new());
        assert!(matches!(
            Timetable::with_config(registry(), MemoryStore::new(), bad),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_progress_after_auto_assign() {
        let tt = Timetable::new(registry(), MemoryStore::new());
        tt.add_placement(&request("X", 1, 1)).unwrap();

        let before = tt.binding_progress("X").unwrap();
        assert_eq!(before.state, ProgressState::Partial);

        let outcome = tt
            .auto_assign_with_rng("C1", TERM, &mut SmallRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(outcome.scheduled + outcome.failed, 4);

        let progress = tt.class_progress("C1", TERM).unwrap();
        assert_eq!(progress.required_total, 5);
        assert_eq!(progress.placed_total, 1 + outcome.scheduled);
        assert!(tt.audit(TERM).unwrap().is_empty());
    }

    #[test]
    fn test_schedules_sorted() {
        let tt = Timetable::new(registry(), MemoryStore::new());
        tt.add_placement(&request("X", 3, 2)).unwrap();
        tt.add_placement(&request("X", 1, 4)).unwrap();
        tt.add_placement(&request("Z", 1, 2)).unwrap();

        let class = tt.class_schedule("C1", TERM).unwrap();
        let cells: Vec<_> = class.iter().map(|p| (p.entry.day, p.entry.slot)).collect();
        assert_eq!(cells, vec![(1, 2), (1, 4), (3, 2)]);

        let teacher = tt.teacher_schedule("T1", TERM, WeekRange::new(1, 20)).unwrap();
        assert_eq!(teacher.len(), 2);

        let monday = tt
            .classroom_occupancy("R1", TERM, Some(1), WeekRange::new(1, 20))
            .unwrap();
        assert_eq!(monday.len(), 2);
        assert!(tt
            .classroom_occupancy("R1", TERM, Some(9), WeekRange::new(1, 20))
            .is_err());
        assert!(tt
            .teacher_schedule("T1", TERM, WeekRange::new(5, 2))
            .is_err());
    }

    #[test]
    fn test_concurrent_adds_single_winner() {
        // Eight threads race for T1 on Monday period 1.
        let mut registry = MemoryRegistry::new();
        for i in 0..8 {
            registry = registry.with_binding(Binding::new(
                format!("B{i}"),
                "MATH",
                format!("C{i}"),
                "T1",
                TERM,
            ));
        }
        let tt = Timetable::new(registry, MemoryStore::new());

        let placed = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let tt = &tt;
                    s.spawn(move || {
                        tt.add_placement(&request(&format!("B{i}"), 1, 1))
                            .unwrap()
                            .is_placed()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|placed| *placed)
                .count()
        });

        assert_eq!(placed, 1);
        assert_eq!(tt.store().len(), 1);
        assert!(tt.audit(TERM).unwrap().is_empty());
    }

    #[test]
    fn test_end_to_end_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.db");
        let config = EngineConfig::default().with_seed(11);

        {
            let store = SqliteStore::open(&path).unwrap();
            let tt = Timetable::with_config(registry(), store, config.clone()).unwrap();
            tt.add_placement(&request("X", 2, 2)).unwrap().into_result().unwrap();
            tt.auto_assign("C1", TERM).unwrap();
            assert!(tt.audit(TERM).unwrap().is_empty());
        }

        let store = SqliteStore::open(&path).unwrap();
        let tt = Timetable::with_config(registry(), store, config).unwrap();
        let x = tt.binding_progress("X").unwrap();
        assert!(x.placed >= 1);
        let report = tt.check_conflict(&request("Y", 2, 2)).unwrap();
        assert_eq!(report.conflicts[0].binding_id, "X");
    }
}
