//! Timetable domain models.
//!
//! Plain data types for bindings, placements, the period table and
//! conflict reports. No storage or search logic lives here.
//!
//! # Domain Mappings
//!
//! | u-timetable | School office | Also known as |
//! |-------------|---------------|---------------|
//! | Binding | Course assignment | Course/class/teacher pairing |
//! | Placement | Timetable cell | Schedule entry |
//! | PeriodTable | Bell schedule | Daily period table |
//! | ConflictReport | Clash list | Double-booking report |

mod binding;
mod conflict;
mod period;
mod placement;
mod term;

pub use binding::Binding;
pub use conflict::{Conflict, ConflictKind, ConflictReport};
pub use period::{day_name, slot_name, PeriodRule, PeriodTable, MAX_DAY, MIN_DAY};
pub use placement::{Placement, PlacementId, PlacementRequest, ScheduleEntry, WeekRange};
pub use term::academic_term;
