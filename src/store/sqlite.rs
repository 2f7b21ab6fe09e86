//! SQLite schedule store.
//!
//! Placements live in one table with a denormalized copy of the owning
//! binding's term, teacher, classroom and class. Overlap is enforced twice
//! inside an `IMMEDIATE` transaction: a query that collects the colliding
//! rows, and a `BEFORE INSERT` trigger that aborts any overlapping row,
//! including rows written by other processes.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row, TransactionBehavior};

use super::{check_entry, PlacementFilter, ScheduleStore};
use crate::error::StoreError;
use crate::models::{Placement, PlacementId, ScheduleEntry, WeekRange};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS placements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        binding_id TEXT NOT NULL,
        term TEXT NOT NULL,
        teacher_id TEXT NOT NULL,
        classroom_id TEXT,
        class_id TEXT NOT NULL,
        day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 1 AND 7),
        time_slot INTEGER NOT NULL CHECK (time_slot >= 1),
        week_start INTEGER NOT NULL CHECK (week_start >= 1),
        week_end INTEGER NOT NULL CHECK (week_end >= week_start)
    );

    CREATE INDEX IF NOT EXISTS idx_placements_time
        ON placements(term, day_of_week, time_slot);

    CREATE INDEX IF NOT EXISTS idx_placements_binding
        ON placements(binding_id);

    CREATE TRIGGER IF NOT EXISTS placements_no_overlap
    BEFORE INSERT ON placements
    WHEN EXISTS (
        SELECT 1 FROM placements p
        WHERE p.term = NEW.term
          AND p.day_of_week = NEW.day_of_week
          AND p.time_slot = NEW.time_slot
          AND p.week_start <= NEW.week_end
          AND p.week_end >= NEW.week_start
          AND (p.teacher_id = NEW.teacher_id
               OR p.class_id = NEW.class_id
               OR (NEW.classroom_id IS NOT NULL AND p.classroom_id = NEW.classroom_id))
    )
    BEGIN
        SELECT RAISE(ABORT, 'placement overlaps an existing placement');
    END;
"#;

const COLUMNS: &str = "id, binding_id, term, teacher_id, classroom_id, class_id, \
                       day_of_week, time_slot, week_start, week_end";

/// Durable store backed by a single SQLite connection.
///
/// Uses `Mutex` to serialize access to the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self::with_connection(conn)?;
        tracing::info!(path = %path.display(), "SQLite schedule store initialized");
        Ok(store)
    }

    /// Creates an in-memory database.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn row_to_placement(row: &Row<'_>) -> rusqlite::Result<Placement> {
    Ok(Placement::new(
        row.get(0)?,
        ScheduleEntry {
            binding_id: row.get(1)?,
            term: row.get(2)?,
            teacher_id: row.get(3)?,
            classroom_id: row.get(4)?,
            class_id: row.get(5)?,
            day: row.get(6)?,
            slot: row.get(7)?,
            weeks: WeekRange::new(row.get(8)?, row.get(9)?),
        },
    ))
}

/// Builds a `WHERE` clause with numbered placeholders for `filter`.
fn where_clause(filter: &PlacementFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    let mut push = |column: &str, op: &str, value: Value| {
        values.push(value);
        clauses.push(format!("{column} {op} ?{}", values.len()));
    };

    let text = |s: &String| Value::Text(s.clone());
    if let Some(v) = &filter.term {
        push("term", "=", text(v));
    }
    if let Some(v) = &filter.binding_id {
        push("binding_id", "=", text(v));
    }
    if let Some(v) = &filter.teacher_id {
        push("teacher_id", "=", text(v));
    }
    if let Some(v) = &filter.classroom_id {
        push("classroom_id", "=", text(v));
    }
    if let Some(v) = &filter.class_id {
        push("class_id", "=", text(v));
    }
    if let Some(v) = filter.day {
        push("day_of_week", "=", Value::Integer(v.into()));
    }
    if let Some(v) = filter.slot {
        push("time_slot", "=", Value::Integer(v.into()));
    }
    if let Some(w) = filter.weeks {
        push("week_start", "<=", Value::Integer(w.end.into()));
        push("week_end", ">=", Value::Integer(w.start.into()));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn query_colliding(conn: &Connection, entry: &ScheduleEntry) -> rusqlite::Result<Vec<Placement>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM placements
         WHERE term = ?1 AND day_of_week = ?2 AND time_slot = ?3
           AND week_start <= ?5 AND week_end >= ?4
           AND (teacher_id = ?6 OR class_id = ?7
                OR (?8 IS NOT NULL AND classroom_id = ?8))
         ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            entry.term,
            entry.day,
            entry.slot,
            entry.weeks.start,
            entry.weeks.end,
            entry.teacher_id,
            entry.class_id,
            entry.classroom_id,
        ],
        row_to_placement,
    )?;
    rows.collect()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

impl ScheduleStore for SqliteStore {
    fn list_placements(&self, filter: &PlacementFilter) -> Result<Vec<Placement>, StoreError> {
        let conn = self.lock()?;
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT {COLUMNS} FROM placements{clause} ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), row_to_placement)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_placement(&self, entry: ScheduleEntry) -> Result<Placement, StoreError> {
        check_entry(&entry)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let collisions = query_colliding(&tx, &entry)?;
        if !collisions.is_empty() {
            return Err(StoreError::Conflict {
                colliding: collisions,
            });
        }

        let inserted = tx.execute(
            "INSERT INTO placements
                (binding_id, term, teacher_id, classroom_id, class_id,
                 day_of_week, time_slot, week_start, week_end)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.binding_id,
                entry.term,
                entry.teacher_id,
                entry.classroom_id,
                entry.class_id,
                entry.day,
                entry.slot,
                entry.weeks.start,
                entry.weeks.end,
            ],
        );

        if let Err(err) = inserted {
            if is_constraint_violation(&err) {
                let collisions = query_colliding(&tx, &entry)?;
                if !collisions.is_empty() {
                    return Err(StoreError::Conflict {
                        colliding: collisions,
                    });
                }
            }
            return Err(err.into());
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Placement::new(id, entry))
    }

    fn delete_placement(&self, id: PlacementId) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM placements WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn count_placements(&self, filter: &PlacementFilter) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM placements{clause}");
        let count: i64 = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(binding: &str, teacher: &str, room: Option<&str>, class: &str) -> ScheduleEntry {
        ScheduleEntry {
            binding_id: binding.into(),
            term: "S1".into(),
            teacher_id: teacher.into(),
            classroom_id: room.map(String::from),
            class_id: class.into(),
            day: 2,
            slot: 3,
            weeks: WeekRange::new(1, 20),
        }
    }

    #[test]
    fn test_insert_and_list() {
        let store = SqliteStore::in_memory().unwrap();
        let p = store
            .insert_placement(entry("B1", "T1", Some("R1"), "C1"))
            .unwrap();
        assert_eq!(p.id, 1);

        let all = store.list_placements(&PlacementFilter::new()).unwrap();
        assert_eq!(all, vec![p]);
    }

    #[test]
    fn test_insert_rejects_each_dimension() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_placement(entry("B1", "T1", Some("R1"), "C1"))
            .unwrap();

        for candidate in [
            entry("B2", "T1", Some("R2"), "C2"),
            entry("B3", "T3", Some("R1"), "C3"),
            entry("B4", "T4", None, "C1"),
        ] {
            let err = store.insert_placement(candidate).unwrap_err();
            assert!(matches!(err, StoreError::Conflict { ref colliding } if colliding.len() == 1));
        }
        assert_eq!(store.count_placements(&PlacementFilter::new()).unwrap(), 1);
    }

    #[test]
    fn test_insert_rejects_out_of_range_entry() {
        let store = SqliteStore::in_memory().unwrap();
        let mut inverted = entry("B1", "T1", None, "C1");
        inverted.weeks = WeekRange::new(1, 0);
        assert!(matches!(
            store.insert_placement(inverted),
            Err(StoreError::InvalidEntry(_))
        ));
        let mut zero_slot = entry("B1", "T1", None, "C1");
        zero_slot.slot = 0;
        assert!(matches!(
            store.insert_placement(zero_slot),
            Err(StoreError::InvalidEntry(_))
        ));
        assert_eq!(store.count_placements(&PlacementFilter::new()).unwrap(), 0);
    }

    #[test]
    fn test_null_classrooms_do_not_collide() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_placement(entry("B1", "T1", None, "C1")).unwrap();
        assert!(store.insert_placement(entry("B2", "T2", None, "C2")).is_ok());
    }

    #[test]
    fn test_trigger_blocks_raw_insert() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_placement(entry("B1", "T1", None, "C1")).unwrap();

        let conn = store.conn.lock().unwrap();
        let err = conn
            .execute(
                "INSERT INTO placements
                    (binding_id, term, teacher_id, classroom_id, class_id,
                     day_of_week, time_slot, week_start, week_end)
                 VALUES ('B2', 'S1', 'T1', NULL, 'C2', 2, 3, 20, 25)",
                [],
            )
            .unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn test_filters() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_placement(entry("B1", "T1", Some("R1"), "C1"))
            .unwrap();
        let mut other = entry("B2", "T2", Some("R2"), "C2");
        other.day = 4;
        other.weeks = WeekRange::new(11, 20);
        store.insert_placement(other).unwrap();

        let by_teacher = store
            .list_placements(&PlacementFilter::new().teacher("T2"))
            .unwrap();
        assert_eq!(by_teacher.len(), 1);
        assert_eq!(by_teacher[0].entry.day, 4);

        let early = PlacementFilter::new()
            .term("S1")
            .overlapping(WeekRange::new(1, 10));
        assert_eq!(store.count_placements(&early).unwrap(), 1);

        let room = PlacementFilter::new().classroom("R1").day(2).slot(3);
        assert_eq!(store.list_placements(&room).unwrap()[0].binding_id(), "B1");
    }

    #[test]
    fn test_delete() {
        let store = SqliteStore::in_memory().unwrap();
        let p = store.insert_placement(entry("B1", "T1", None, "C1")).unwrap();
        store.delete_placement(p.id).unwrap();
        assert!(matches!(
            store.delete_placement(p.id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("timetable.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_placement(entry("B1", "T1", None, "C1")).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let all = reopened.list_placements(&PlacementFilter::new()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].entry.teacher_id, "T1");
    }
}
