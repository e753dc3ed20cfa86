//! The durable source of truth for shift assignments.
//!
//! Rows are keyed by (date, course) and never deleted; clearing a cell
//! writes `None`. The store accepts any value: invariants are enforced by
//! the engine through candidate restriction, not here.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{CourseId, DateKey, DateRange, DriverId, ShiftAssignment};
use crate::error::PersistenceError;

type Rows = BTreeMap<DateKey, BTreeMap<CourseId, Option<DriverId>>>;

/// Persistence seam for assignments.
pub trait AssignmentStore: Send + Sync {
    /// Committed rows whose date falls in `range`.
    fn load_range(&self, range: DateRange) -> Result<AssignmentSnapshot, PersistenceError>;

    /// Destructive regenerate: every row in `range` is nulled, then `cells`
    /// are written. All or nothing.
    fn replace_range(
        &self,
        range: DateRange,
        cells: &[ShiftAssignment],
    ) -> Result<(), PersistenceError>;

    /// Last-write-wins upsert of a single cell.
    fn upsert(&self, assignment: &ShiftAssignment) -> Result<(), PersistenceError>;

    /// Upserts all cells or none.
    fn upsert_batch(&self, assignments: &[ShiftAssignment]) -> Result<(), PersistenceError>;
}

/// Immutable view of committed rows for one date range.
///
/// Cloning is cheap; applying writes produces a new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentSnapshot {
    rows: Arc<Rows>,
}

impl AssignmentSnapshot {
    pub fn from_assignments(assignments: impl IntoIterator<Item = ShiftAssignment>) -> Self {
        let mut rows = Rows::new();
        for a in assignments {
            rows.entry(a.date).or_default().insert(a.course_id, a.driver_id);
        }
        Self {
            rows: Arc::new(rows),
        }
    }

    /// Committed driver of a cell; `None` when unfilled or absent.
    pub fn get(&self, date: DateKey, course: &CourseId) -> Option<&DriverId> {
        self.rows
            .get(&date)
            .and_then(|day| day.get(course))
            .and_then(Option::as_ref)
    }

    /// Filled cells on `date`.
    pub fn assigned_on(&self, date: DateKey) -> impl Iterator<Item = (&CourseId, &DriverId)> + '_ {
        self.rows
            .get(&date)
            .into_iter()
            .flatten()
            .filter_map(|(course, driver)| driver.as_ref().map(|d| (course, d)))
    }

    /// All rows, including explicit unfilled ones, ordered by date then course.
    pub fn assignments(&self) -> impl Iterator<Item = ShiftAssignment> + '_ {
        self.rows.iter().flat_map(|(date, day)| {
            day.iter()
                .map(move |(course, driver)| ShiftAssignment::new(*date, course.clone(), driver.clone()))
        })
    }

    pub fn with_applied<'a>(&self, writes: impl IntoIterator<Item = &'a ShiftAssignment>) -> Self {
        let mut rows = (*self.rows).clone();
        for a in writes {
            rows.entry(a.date)
                .or_default()
                .insert(a.course_id.clone(), a.driver_id.clone());
        }
        Self {
            rows: Arc::new(rows),
        }
    }
}

/// Process-local store behind a read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    rows: RwLock<Rows>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.read().values().map(BTreeMap::len).sum()
    }
}

impl AssignmentStore for InMemoryAssignmentStore {
    fn load_range(&self, range: DateRange) -> Result<AssignmentSnapshot, PersistenceError> {
        let rows = self.rows.read();
        let selected: Rows = rows
            .range(range.start()..=range.end())
            .map(|(date, day)| (*date, day.clone()))
            .collect();
        Ok(AssignmentSnapshot {
            rows: Arc::new(selected),
        })
    }

    fn replace_range(
        &self,
        range: DateRange,
        cells: &[ShiftAssignment],
    ) -> Result<(), PersistenceError> {
        if let Some(outside) = cells.iter().find(|c| !range.contains(c.date)) {
            return Err(PersistenceError::Rejected(format!(
                "cell {} lies outside {}",
                outside.key(),
                range
            )));
        }

        let mut rows = self.rows.write();
        for (_, day) in rows.range_mut(range.start()..=range.end()) {
            for driver in day.values_mut() {
                *driver = None;
            }
        }
        for cell in cells {
            rows.entry(cell.date)
                .or_default()
                .insert(cell.course_id.clone(), cell.driver_id.clone());
        }
        Ok(())
    }

    fn upsert(&self, assignment: &ShiftAssignment) -> Result<(), PersistenceError> {
        self.rows
            .write()
            .entry(assignment.date)
            .or_default()
            .insert(assignment.course_id.clone(), assignment.driver_id.clone());
        Ok(())
    }

    fn upsert_batch(&self, assignments: &[ShiftAssignment]) -> Result<(), PersistenceError> {
        let mut rows = self.rows.write();
        for a in assignments {
            rows.entry(a.date)
                .or_default()
                .insert(a.course_id.clone(), a.driver_id.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> DateKey {
        DateKey::from_ymd(2025, 6, d).unwrap()
    }

    #[test]
    fn test_replace_range_nulls_rows_it_does_not_rewrite() {
        let store = InMemoryAssignmentStore::new();
        store
            .upsert(&ShiftAssignment::assigned(day(1), "old-course", "d1"))
            .unwrap();
        store
            .upsert(&ShiftAssignment::assigned(day(5), "x", "d9"))
            .unwrap();

        let range = DateRange::new(day(1), day(2)).unwrap();
        store
            .replace_range(range, &[ShiftAssignment::assigned(day(1), "x", "d2")])
            .unwrap();

        let snapshot = store.load_range(range).unwrap();
        assert_eq!(snapshot.get(day(1), &CourseId::new("old-course")), None);
        assert_eq!(snapshot.get(day(1), &CourseId::new("x")), Some(&DriverId::new("d2")));
        // Nulled, not deleted.
        assert_eq!(store.row_count(), 3);
        // Outside the range is untouched.
        let outside = store.load_range(DateRange::single(day(5))).unwrap();
        assert_eq!(outside.get(day(5), &CourseId::new("x")), Some(&DriverId::new("d9")));
    }

    #[test]
    fn test_replace_range_rejects_cells_outside_range() {
        let store = InMemoryAssignmentStore::new();
        let err = store
            .replace_range(
                DateRange::single(day(1)),
                &[ShiftAssignment::unfilled(day(2), "x")],
            )
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Rejected(_)));
        assert_eq!(store.row_count(), 0);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = InMemoryAssignmentStore::new();
        let a = ShiftAssignment::assigned(day(1), "x", "d1");
        store.upsert(&a).unwrap();
        store.upsert(&a).unwrap();
        assert_eq!(store.row_count(), 1);
        let snapshot = store.load_range(DateRange::single(day(1))).unwrap();
        assert_eq!(snapshot.assignments().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_snapshot_with_applied_leaves_original() {
        let base = AssignmentSnapshot::from_assignments([ShiftAssignment::assigned(day(1), "x", "d1")]);
        let next = base.with_applied(&[ShiftAssignment::unfilled(day(1), "x")]);
        assert_eq!(base.get(day(1), &CourseId::new("x")), Some(&DriverId::new("d1")));
        assert_eq!(next.get(day(1), &CourseId::new("x")), None);
        assert_eq!(next.assigned_on(day(1)).count(), 0);
    }
}
