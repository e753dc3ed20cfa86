//! Selectable drivers for a cell under the live (committed + staged) grid.

use std::collections::HashSet;

use crate::domain::{CourseId, DateKey, DriverId};
use crate::index::{AvailabilityIndex, CapabilityIndex};
use crate::staging::StagingLayer;

/// Derives the manual-edit selector contents for one cell.
///
/// The cell's current driver is always offered, even when it is off,
/// incapable, or placed elsewhere the same day. Every other candidate must be
/// capable of the course, not off that date, and not shown on any other
/// course of that date, pending edits included.
#[derive(Debug, Clone, Copy)]
pub struct ConflictEvaluator<'a> {
    capability: &'a CapabilityIndex,
    availability: &'a AvailabilityIndex,
}

impl<'a> ConflictEvaluator<'a> {
    pub fn new(capability: &'a CapabilityIndex, availability: &'a AvailabilityIndex) -> Self {
        Self {
            capability,
            availability,
        }
    }

    /// Current driver first, then the remaining candidates in listing order.
    pub fn available_drivers(
        &self,
        staging: &StagingLayer,
        date: DateKey,
        course: &CourseId,
    ) -> Vec<DriverId> {
        let current = staging.current_value(date, course);
        let elsewhere: HashSet<&DriverId> = staging
            .live_assignments_on(date)
            .into_iter()
            .filter(|(other, _)| *other != course)
            .map(|(_, driver)| driver)
            .collect();

        let mut drivers: Vec<DriverId> = current.into_iter().cloned().collect();
        drivers.extend(
            self.capability
                .capable_drivers(course)
                .iter()
                .filter(|d| Some(*d) != current)
                .filter(|d| !self.availability.is_off(d, date))
                .filter(|d| !elsewhere.contains(d))
                .cloned(),
        );
        drivers
    }

    /// Whether `driver` may be placed on the cell. Unfilled always may.
    pub fn is_selectable(
        &self,
        staging: &StagingLayer,
        date: DateKey,
        course: &CourseId,
        driver: Option<&DriverId>,
    ) -> bool {
        match driver {
            None => true,
            Some(driver) => self
                .available_drivers(staging, date, course)
                .iter()
                .any(|d| d == driver),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayOffRequest, Driver, ShiftAssignment};
    use crate::store::AssignmentSnapshot;

    fn day(d: u32) -> DateKey {
        DateKey::from_ymd(2025, 6, d).unwrap()
    }

    fn ids(drivers: &[DriverId]) -> Vec<&str> {
        drivers.iter().map(|d| d.as_str()).collect()
    }

    fn drivers() -> Vec<Driver> {
        vec![
            Driver::new("alice", "Alice").with_courses(["x", "y"]),
            Driver::new("bob", "Bob").with_courses(["x", "y"]),
            Driver::new("carol", "Carol").with_courses(["y"]),
        ]
    }

    #[test]
    fn test_candidates_exclude_off_and_incapable() {
        let capability = CapabilityIndex::build(&drivers());
        let availability = AvailabilityIndex::build(&[DayOffRequest::new("bob", day(1))]);
        let evaluator = ConflictEvaluator::new(&capability, &availability);
        let staging = StagingLayer::default();

        let x = evaluator.available_drivers(&staging, day(1), &CourseId::new("x"));
        assert_eq!(ids(&x), vec!["alice"]);

        let x_next_day = evaluator.available_drivers(&staging, day(2), &CourseId::new("x"));
        assert_eq!(ids(&x_next_day), vec!["alice", "bob"]);
    }

    #[test]
    fn test_current_driver_always_offered() {
        let capability = CapabilityIndex::build(&drivers());
        // Carol is incapable of x and off; she is also on y the same day.
        let availability = AvailabilityIndex::build(&[DayOffRequest::new("carol", day(1))]);
        let evaluator = ConflictEvaluator::new(&capability, &availability);
        let staging = StagingLayer::new(AssignmentSnapshot::from_assignments([
            ShiftAssignment::assigned(day(1), "x", "carol"),
            ShiftAssignment::assigned(day(1), "y", "carol"),
        ]));

        let x = evaluator.available_drivers(&staging, day(1), &CourseId::new("x"));
        assert_eq!(ids(&x), vec!["carol", "alice", "bob"]);
        assert!(evaluator.is_selectable(&staging, day(1), &CourseId::new("x"), Some(&DriverId::new("carol"))));
    }

    #[test]
    fn test_staged_edit_narrows_sibling_cells() {
        let capability = CapabilityIndex::build(&drivers());
        let availability = AvailabilityIndex::default();
        let evaluator = ConflictEvaluator::new(&capability, &availability);
        let mut staging = StagingLayer::default();

        staging.set_local_driver(day(1), CourseId::new("x"), Some(DriverId::new("alice")));

        let y = evaluator.available_drivers(&staging, day(1), &CourseId::new("y"));
        assert_eq!(ids(&y), vec!["bob", "carol"]);

        // Other dates are unaffected.
        let y_next_day = evaluator.available_drivers(&staging, day(2), &CourseId::new("y"));
        assert_eq!(ids(&y_next_day), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_staged_unfill_frees_committed_driver() {
        let capability = CapabilityIndex::build(&drivers());
        let availability = AvailabilityIndex::default();
        let evaluator = ConflictEvaluator::new(&capability, &availability);
        let mut staging = StagingLayer::new(AssignmentSnapshot::from_assignments([
            ShiftAssignment::assigned(day(1), "x", "alice"),
        ]));

        let before = evaluator.available_drivers(&staging, day(1), &CourseId::new("y"));
        assert!(!before.contains(&DriverId::new("alice")));

        staging.set_local_driver(day(1), CourseId::new("x"), None);
        let after = evaluator.available_drivers(&staging, day(1), &CourseId::new("y"));
        assert!(after.contains(&DriverId::new("alice")));
    }

    #[test]
    fn test_unfilled_is_always_selectable() {
        let capability = CapabilityIndex::default();
        let availability = AvailabilityIndex::default();
        let evaluator = ConflictEvaluator::new(&capability, &availability);
        let staging = StagingLayer::default();

        assert!(evaluator.is_selectable(&staging, day(1), &CourseId::new("x"), None));
        assert!(!evaluator.is_selectable(
            &staging,
            day(1),
            &CourseId::new("x"),
            Some(&DriverId::new("alice"))
        ));
    }
}
