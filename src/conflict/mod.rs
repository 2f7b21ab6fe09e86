//! Conflict detection.
//!
//! Evaluates whether a candidate placement would double-book a teacher,
//! classroom or class. Detection is read-only: it never writes to the
//! store and may be called repeatedly and concurrently.
//!
//! # Algorithm
//! 1. Validate the request (day, slot, weeks) before touching storage.
//! 2. Resolve the binding's teacher, classroom and class.
//! 3. List stored placements of the same term, day and slot whose weeks
//!    overlap the candidate's.
//! 4. Classify each by shared dimension. One placement yields one record
//!    per shared dimension.
//!
//! # Complexity
//! O(k) per check, where k = placements sharing the candidate's time cell.

mod audit;

pub use audit::{audit_placements, OverlapViolation};

use crate::error::{Result, StoreError, TimetableError};
use crate::models::{
    Binding, Conflict, ConflictKind, ConflictReport, PeriodTable, Placement, PlacementRequest,
    ScheduleEntry, WeekRange,
};
use crate::registry::BindingRegistry;
use crate::store::{PlacementFilter, ScheduleStore};
use crate::validation::validate_request;

/// Read-only conflict checker over explicit registry and store handles.
///
/// # Example
///
/// ```
/// use u_timetable::conflict::ConflictDetector;
/// use u_timetable::models::{Binding, PeriodTable, PlacementRequest, WeekRange};
/// use u_timetable::registry::MemoryRegistry;
/// use u_timetable::store::MemoryStore;
///
/// let registry = MemoryRegistry::new()
///     .with_binding(Binding::new("B1", "MATH", "C1", "T1", "2024-2025-1"));
/// let store = MemoryStore::new();
/// let periods = PeriodTable::standard();
///
/// let detector = ConflictDetector::new(&registry, &store, &periods);
/// let report = detector
///     .detect(&PlacementRequest::new("B1", 1, 1, WeekRange::new(1, 20)))
///     .unwrap();
/// assert!(report.is_clear());
/// ```
pub struct ConflictDetector<'a, R: ?Sized, S: ?Sized> {
    registry: &'a R,
    store: &'a S,
    periods: &'a PeriodTable,
}

impl<'a, R, S> ConflictDetector<'a, R, S>
where
    R: BindingRegistry + ?Sized,
    S: ScheduleStore + ?Sized,
{
    /// Creates a detector.
    pub fn new(registry: &'a R, store: &'a S, periods: &'a PeriodTable) -> Self {
        Self {
            registry,
            store,
            periods,
        }
    }

    /// Validates `request`, resolves its binding and scans for conflicts.
    ///
    /// # Errors
    /// - `InvalidInput` for a blank id, day outside 1-7, unknown slot or
    ///   bad week range (checked before any storage access)
    /// - `InvalidBinding` when the registry does not know the binding
    /// - `Store` when listing placements fails
    pub fn detect(&self, request: &PlacementRequest) -> Result<ConflictReport> {
        let binding = self.resolve(request)?;
        Ok(self.scan(&binding, request.day, request.slot, request.weeks)?)
    }

    /// Validates `request` and returns its binding.
    pub fn resolve(&self, request: &PlacementRequest) -> Result<Binding> {
        validate_request(request, self.periods)?;
        self.registry
            .get_binding(&request.binding_id)
            .ok_or_else(|| TimetableError::InvalidBinding(request.binding_id.clone()))
    }

    /// Scans the store for placements colliding with `binding` at the
    /// given time. Inputs are assumed valid.
    pub fn scan(
        &self,
        binding: &Binding,
        day: u8,
        slot: u8,
        weeks: WeekRange,
    ) -> std::result::Result<ConflictReport, StoreError> {
        let filter = PlacementFilter::new()
            .term(binding.term.as_str())
            .day(day)
            .slot(slot)
            .overlapping(weeks);
        let nearby = self.store.list_placements(&filter)?;
        let candidate = ScheduleEntry::for_binding(binding, day, slot, weeks);
        Ok(self.classify(&candidate, &nearby))
    }

    /// Builds a report from placements known to share time with
    /// `candidate`, e.g. those returned by a store-level rejection.
    pub fn classify(&self, candidate: &ScheduleEntry, placements: &[Placement]) -> ConflictReport {
        let mut report = ConflictReport::new();
        for kind in ConflictKind::ALL {
            for placement in placements {
                if candidate.shares_time_with(&placement.entry)
                    && candidate.same_owner(&placement.entry, kind)
                {
                    let owner = self.registry.get_binding(placement.binding_id());
                    report.push(Conflict::new(kind, placement, owner.as_ref()));
                }
            }
        }
        report
    }
}
