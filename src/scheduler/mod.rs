//! Placement commit, auto-assignment and progress.
//!
//! # Commit
//!
//! `Committer` runs the conflict check and the store insert while holding
//! per-(term, teacher/classroom/class) locks from `DimensionLocks`. The
//! store's own overlap re-check backs it up against writers outside this
//! process.
//!
//! # Auto-assign
//!
//! `AutoAssigner` tops up each binding of a class to its weekly hours with
//! random draws from the period table. It is a bounded greedy heuristic,
//! not a solver: it never moves an existing placement.
//!
//! # Progress
//!
//! `BindingProgress` and `ClassProgress` report placed versus required
//! weekly hours.

mod auto;
mod commit;
mod progress;

pub use auto::{AssignmentOutcome, AutoAssigner};
pub use commit::{Committer, DimensionLocks, LockKey, PlacementOutcome};
pub use progress::{BindingProgress, ClassProgress, ProgressState};
