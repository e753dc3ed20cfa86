//! One loaded date range as the manual editor sees it.

use tracing::info;

use crate::conflicts::ConflictEvaluator;
use crate::domain::{Course, CourseId, DateKey, DateRange, DriverId, Roster, ShiftAssignment};
use crate::error::{CommitReport, ScheduleError};
use crate::index::{AvailabilityIndex, CapabilityIndex};
use crate::staging::StagingLayer;
use crate::store::AssignmentStore;

/// Indices, committed snapshot and staged edits for a date range.
///
/// The indices are a snapshot of the roster taken at load time. Changes made
/// to drivers or day-offs afterwards are not seen until the range is reloaded.
#[derive(Debug, Clone)]
pub struct ScheduleView {
    range: DateRange,
    courses: Vec<Course>,
    known_drivers: Vec<DriverId>,
    capability: CapabilityIndex,
    availability: AvailabilityIndex,
    staging: StagingLayer,
}

impl ScheduleView {
    pub fn load(
        roster: &Roster,
        store: &dyn AssignmentStore,
        range: DateRange,
    ) -> Result<Self, ScheduleError> {
        let committed = store.load_range(range)?;
        info!(%range, courses = roster.courses.len(), "Loaded schedule view");
        Ok(Self {
            range,
            courses: roster.ordered_courses(),
            known_drivers: roster.drivers.iter().map(|d| d.id.clone()).collect(),
            capability: CapabilityIndex::build(&roster.drivers),
            availability: AvailabilityIndex::build_for_range(&roster.day_offs, range),
            staging: StagingLayer::new(committed),
        })
    }

    #[inline]
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Courses in fill order.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn staging(&self) -> &StagingLayer {
        &self.staging
    }

    pub fn evaluator(&self) -> ConflictEvaluator<'_> {
        ConflictEvaluator::new(&self.capability, &self.availability)
    }

    /// Every cell of the range with its currently shown driver.
    pub fn grid(&self) -> Vec<ShiftAssignment> {
        self.range
            .days()
            .flat_map(|date| {
                self.courses.iter().map(move |course| {
                    ShiftAssignment::new(
                        date,
                        course.id.clone(),
                        self.staging.current_value(date, &course.id).cloned(),
                    )
                })
            })
            .collect()
    }

    pub fn candidates(&self, date: DateKey, course: &CourseId) -> Result<Vec<DriverId>, ScheduleError> {
        self.check_cell(date, course)?;
        Ok(self.evaluator().available_drivers(&self.staging, date, course))
    }

    /// Stages a driver for a cell after checking it against the selector.
    pub fn select_driver(
        &mut self,
        date: DateKey,
        course: &CourseId,
        driver: Option<DriverId>,
    ) -> Result<(), ScheduleError> {
        self.check_cell(date, course)?;
        if let Some(driver) = driver.as_ref() {
            // The shown driver stays selectable even after leaving the roster
            let is_current = self.staging.current_value(date, course) == Some(driver);
            if !is_current && !self.known_drivers.contains(driver) {
                return Err(ScheduleError::UnknownDriver(driver.clone()));
            }
            if !self
                .evaluator()
                .is_selectable(&self.staging, date, course, Some(driver))
            {
                return Err(ScheduleError::DriverNotSelectable {
                    date,
                    course_id: course.clone(),
                    driver_id: driver.clone(),
                });
            }
        }
        self.staging.set_local_driver(date, course.clone(), driver);
        Ok(())
    }

    pub fn discard(&mut self) -> usize {
        self.staging.discard()
    }

    /// All-or-nothing commit of staged edits.
    pub fn commit(&mut self, store: &dyn AssignmentStore) -> Result<usize, ScheduleError> {
        Ok(self.staging.commit(store)?)
    }

    /// Per-cell commit; failed cells stay staged.
    pub fn commit_each(&mut self, store: &dyn AssignmentStore) -> CommitReport {
        self.staging.commit_each(store)
    }

    /// Fails with [`ScheduleError::UnsavedEdits`] while edits are staged,
    /// unless the caller confirmed dropping them.
    pub fn ensure_can_leave(&self, confirm_discard: bool) -> Result<(), ScheduleError> {
        let pending = self.staging.pending_count();
        if pending > 0 && !confirm_discard {
            return Err(ScheduleError::UnsavedEdits { pending });
        }
        Ok(())
    }

    /// Loads another range in place. Staged edits block the switch unless
    /// `confirm_discard` is set, in which case they are dropped.
    pub fn switch_range(
        &mut self,
        range: DateRange,
        roster: &Roster,
        store: &dyn AssignmentStore,
        confirm_discard: bool,
    ) -> Result<(), ScheduleError> {
        self.ensure_can_leave(confirm_discard)?;
        let next = Self::load(roster, store, range)?;
        let dropped = self.staging.pending_count();
        if dropped > 0 {
            info!(dropped, from = %self.range, to = %range, "Dropped staged edits on range switch");
        }
        *self = next;
        Ok(())
    }

    fn check_cell(&self, date: DateKey, course: &CourseId) -> Result<(), ScheduleError> {
        if !self.range.contains(date) {
            return Err(ScheduleError::DateOutOfRange {
                date,
                range: self.range,
            });
        }
        if !self.courses.iter().any(|c| &c.id == course) {
            return Err(ScheduleError::UnknownCourse(course.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayOffRequest, Driver};
    use crate::store::InMemoryAssignmentStore;

    fn day(d: u32) -> DateKey {
        DateKey::from_ymd(2025, 6, d).unwrap()
    }

    fn roster() -> Roster {
        Roster::new(
            vec![Course::new("x", "Course X", 1), Course::new("y", "Course Y", 2)],
            vec![
                Driver::new("alice", "Alice").with_courses(["x", "y"]),
                Driver::new("bob", "Bob").with_courses(["x"]),
            ],
            vec![DayOffRequest::new("bob", day(2))],
        )
    }

    fn week() -> DateRange {
        DateRange::new(day(1), day(7)).unwrap()
    }

    #[test]
    fn test_grid_covers_range() {
        let store = InMemoryAssignmentStore::new();
        store
            .upsert(&ShiftAssignment::assigned(day(3), "y", "alice"))
            .unwrap();
        let view = ScheduleView::load(&roster(), &store, week()).unwrap();

        let grid = view.grid();
        assert_eq!(grid.len(), 14);
        assert_eq!(grid.iter().filter(|c| c.is_filled()).count(), 1);
    }

    #[test]
    fn test_select_rejects_unavailable_driver() {
        let store = InMemoryAssignmentStore::new();
        let mut view = ScheduleView::load(&roster(), &store, week()).unwrap();

        let err = view
            .select_driver(day(2), &CourseId::new("x"), Some(DriverId::new("bob")))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::DriverNotSelectable { .. }));
        assert!(!view.staging().has_pending_edits());

        view.select_driver(day(1), &CourseId::new("x"), Some(DriverId::new("bob")))
            .unwrap();
        assert!(view.staging().has_pending_edits());
    }

    #[test]
    fn test_select_validates_cell() {
        let store = InMemoryAssignmentStore::new();
        let mut view = ScheduleView::load(&roster(), &store, week()).unwrap();

        assert!(matches!(
            view.select_driver(day(9), &CourseId::new("x"), None),
            Err(ScheduleError::DateOutOfRange { .. })
        ));
        assert!(matches!(
            view.select_driver(day(1), &CourseId::new("z"), None),
            Err(ScheduleError::UnknownCourse(_))
        ));
        assert!(matches!(
            view.select_driver(day(1), &CourseId::new("x"), Some(DriverId::new("nobody"))),
            Err(ScheduleError::UnknownDriver(_))
        ));
    }

    #[test]
    fn test_reselecting_departed_current_driver() {
        let store = InMemoryAssignmentStore::new();
        store
            .upsert(&ShiftAssignment::assigned(day(1), "x", "carol"))
            .unwrap();
        let mut view = ScheduleView::load(&roster(), &store, week()).unwrap();
        let x = CourseId::new("x");
        let carol = DriverId::new("carol");

        let offered = view.candidates(day(1), &x).unwrap();
        assert_eq!(offered.first(), Some(&carol));

        view.select_driver(day(1), &x, Some(carol.clone())).unwrap();
        assert_eq!(view.staging().current_value(day(1), &x), Some(&carol));

        view.select_driver(day(2), &x, None).unwrap();
        assert!(matches!(
            view.select_driver(day(2), &x, Some(carol)),
            Err(ScheduleError::UnknownDriver(_))
        ));
    }

    #[test]
    fn test_switch_range_is_gated_on_pending_edits() {
        let store = InMemoryAssignmentStore::new();
        let roster = roster();
        let mut view = ScheduleView::load(&roster, &store, week()).unwrap();
        view.select_driver(day(1), &CourseId::new("x"), Some(DriverId::new("alice")))
            .unwrap();

        let next = DateRange::new(day(8), day(14)).unwrap();
        assert_eq!(
            view.switch_range(next, &roster, &store, false),
            Err(ScheduleError::UnsavedEdits { pending: 1 })
        );
        assert_eq!(view.range(), week());
        assert!(view.staging().has_pending_edits());

        view.switch_range(next, &roster, &store, true).unwrap();
        assert_eq!(view.range(), next);
        assert!(!view.staging().has_pending_edits());
        assert_eq!(store.row_count(), 0);
    }

    #[test]
    fn test_commit_then_reload_sees_edits() {
        let store = InMemoryAssignmentStore::new();
        let roster = roster();
        let mut view = ScheduleView::load(&roster, &store, week()).unwrap();
        view.select_driver(day(1), &CourseId::new("x"), Some(DriverId::new("bob")))
            .unwrap();
        view.select_driver(day(1), &CourseId::new("y"), Some(DriverId::new("alice")))
            .unwrap();

        assert_eq!(view.commit(&store).unwrap(), 2);
        view.switch_range(week(), &roster, &store, false).unwrap();

        assert_eq!(
            view.staging().current_value(day(1), &CourseId::new("x")),
            Some(&DriverId::new("bob"))
        );
    }
}
