//! Guarded check-and-commit.
//!
//! A conflict check followed by an insert is a check-then-act race. Two
//! layers close it:
//!
//! 1. [`DimensionLocks`] serializes in-process writers that share a
//!    teacher, classroom or class within a term. Locks are taken in sorted
//!    key order, so two writers can never deadlock.
//! 2. The store re-checks overlap atomically on insert. A rejection there
//!    is turned back into a conflict report, not a generic failure.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::conflict::ConflictDetector;
use crate::error::{Result, StoreError, TimetableError};
use crate::models::{
    Binding, ConflictKind, ConflictReport, PeriodTable, Placement, ScheduleEntry, WeekRange,
};
use crate::registry::BindingRegistry;
use crate::store::ScheduleStore;

/// Result of a placement attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementOutcome {
    /// Committed.
    Placed(Placement),
    /// Rejected; nothing was written.
    Conflicted(ConflictReport),
}

impl PlacementOutcome {
    /// Whether the placement was committed.
    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Placed(_))
    }

    /// The committed placement, if any.
    pub fn placement(&self) -> Option<&Placement> {
        match self {
            Self::Placed(p) => Some(p),
            Self::Conflicted(_) => None,
        }
    }

    /// The conflict report, if rejected.
    pub fn report(&self) -> Option<&ConflictReport> {
        match self {
            Self::Placed(_) => None,
            Self::Conflicted(r) => Some(r),
        }
    }

    /// Converts a rejection into [`TimetableError::ConflictDetected`].
    pub fn into_result(self) -> Result<Placement> {
        match self {
            Self::Placed(p) => Ok(p),
            Self::Conflicted(r) => Err(TimetableError::ConflictDetected(r)),
        }
    }
}

/// Key of one contended dimension within a term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockKey {
    /// Term.
    pub term: String,
    /// Dimension.
    pub kind: ConflictKind,
    /// Teacher, classroom or class id.
    pub owner: String,
}

impl LockKey {
    /// Keys a binding contends on, sorted. A binding without a classroom
    /// contends on teacher and class only.
    pub fn for_binding(binding: &Binding) -> Vec<LockKey> {
        let key = |kind, owner: &str| LockKey {
            term: binding.term.clone(),
            kind,
            owner: owner.to_string(),
        };
        let mut keys = vec![
            key(ConflictKind::Teacher, &binding.teacher_id),
            key(ConflictKind::Class, &binding.class_id),
        ];
        if let Some(room) = &binding.classroom_id {
            keys.push(key(ConflictKind::Classroom, room));
        }
        keys.sort();
        keys
    }
}

/// Per-dimension mutexes, created on first use.
#[derive(Debug, Default)]
pub struct DimensionLocks {
    locks: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl DimensionLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutex handles for `keys`, in the order given.
    fn handles(&self, keys: &[LockKey]) -> Vec<Arc<Mutex<()>>> {
        let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        keys.iter()
            .map(|k| Arc::clone(table.entry(k.clone()).or_default()))
            .collect()
    }

    /// Number of distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no key has been locked yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs the conflict check and the insert under the binding's locks.
pub struct Committer<'a, R: ?Sized, S: ?Sized> {
    detector: ConflictDetector<'a, R, S>,
    store: &'a S,
    locks: &'a DimensionLocks,
}

impl<'a, R, S> Committer<'a, R, S>
where
    R: BindingRegistry + ?Sized,
    S: ScheduleStore + ?Sized,
{
    /// Creates a committer over explicit handles.
    pub fn new(
        registry: &'a R,
        store: &'a S,
        periods: &'a PeriodTable,
        locks: &'a DimensionLocks,
    ) -> Self {
        Self {
            detector: ConflictDetector::new(registry, store, periods),
            store,
            locks,
        }
    }

    /// The detector used for the check step.
    pub fn detector(&self) -> &ConflictDetector<'a, R, S> {
        &self.detector
    }

    /// Checks and, if clear, commits `binding` at the given time.
    ///
    /// Store-level overlap rejections come back as
    /// [`PlacementOutcome::Conflicted`]. Other store failures are errors,
    /// including [`StoreError::InvalidEntry`] for out-of-range day, slot
    /// or weeks.
    pub fn commit(
        &self,
        binding: &Binding,
        day: u8,
        slot: u8,
        weeks: WeekRange,
    ) -> std::result::Result<PlacementOutcome, StoreError> {
        let handles = self.locks.handles(&LockKey::for_binding(binding));
        let _guards: Vec<MutexGuard<'_, ()>> = handles
            .iter()
            .map(|h| h.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        let report = self.detector.scan(binding, day, slot, weeks)?;
        if !report.is_clear() {
            return Ok(PlacementOutcome::Conflicted(report));
        }

        let entry = ScheduleEntry::for_binding(binding, day, slot, weeks);
        match self.store.insert_placement(entry.clone()) {
            Ok(placement) => Ok(PlacementOutcome::Placed(placement)),
            Err(StoreError::Conflict { colliding }) => {
                tracing::warn!(
                    binding_id = %binding.id,
                    day,
                    slot,
                    colliding = colliding.len(),
                    "store rejected placement after a clean check"
                );
                Ok(PlacementOutcome::Conflicted(
                    self.detector.classify(&entry, &colliding),
                ))
            }
            Err(e) => Err(e),
        }
    }
}
