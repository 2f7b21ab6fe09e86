//! Weekly timetable engine for schools.
//!
//! Places course bindings (course + class + teacher + optional classroom)
//! into (day, slot, week range) cells without double-booking a teacher,
//! classroom or class, and fills missing weekly hours automatically.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Binding`, `PeriodTable`, `WeekRange`,
//!   `Placement`, `Conflict`, `ConflictReport`
//! - **`validation`**: Input checks (identifiers, day/slot/week ranges,
//!   period tables, binding sets)
//! - **`registry`**: Read-only binding lookup (`BindingRegistry`)
//! - **`store`**: Placement persistence with an atomic overlap backstop
//!   (`MemoryStore`, `SqliteStore`)
//! - **`conflict`**: Read-only conflict detection and full-scan audit
//! - **`scheduler`**: Guarded commit, randomized auto-assign, progress
//! - **`config`**: TOML-loadable `EngineConfig`
//!
//! # Invariants
//!
//! For any two committed placements of one term on the same day and slot
//! with overlapping weeks (inclusive): different teachers, different
//! classes, and different classrooms unless either has none.
//!
//! # Logging
//!
//! Emits `tracing` events; installing a subscriber is left to the caller.

pub mod config;
pub mod conflict;
pub mod error;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod store;
mod timetable;
pub mod validation;

pub use config::EngineConfig;
pub use error::{ConfigError, Result, StoreError, TimetableError};
pub use scheduler::{AssignmentOutcome, PlacementOutcome};
pub use timetable::Timetable;
pub use validation::{ValidationError, ValidationErrorKind};
