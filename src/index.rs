//! Static lookups built once per loaded date range.

use std::collections::{HashMap, HashSet};

use crate::domain::{CourseId, DateKey, DateRange, DayOffRequest, Driver, DriverId};

/// Course -> capable drivers, in canonical driver listing order.
///
/// The listing order is the generator's tie-break, so it must be stable.
#[derive(Debug, Clone, Default)]
pub struct CapabilityIndex {
    by_course: HashMap<CourseId, Vec<DriverId>>,
}

impl CapabilityIndex {
    pub fn build(drivers: &[Driver]) -> Self {
        let mut ordered: Vec<&Driver> = drivers.iter().collect();
        ordered.sort_by(|a, b| Driver::listing_order(a, b));

        let mut by_course: HashMap<CourseId, Vec<DriverId>> = HashMap::new();
        for driver in ordered {
            for course in &driver.capable_course_ids {
                by_course
                    .entry(course.clone())
                    .or_default()
                    .push(driver.id.clone());
            }
        }

        Self { by_course }
    }

    pub fn capable_drivers(&self, course: &CourseId) -> &[DriverId] {
        self.by_course
            .get(course)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_capable(&self, driver: &DriverId, course: &CourseId) -> bool {
        self.capable_drivers(course).contains(driver)
    }
}

/// Date -> drivers who asked for that date off.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    off_by_date: HashMap<DateKey, HashSet<DriverId>>,
}

impl AvailabilityIndex {
    pub fn build(requests: &[DayOffRequest]) -> Self {
        let mut off_by_date: HashMap<DateKey, HashSet<DriverId>> = HashMap::new();
        for request in requests {
            off_by_date
                .entry(request.date)
                .or_default()
                .insert(request.driver_id.clone());
        }
        Self { off_by_date }
    }

    /// Like [`build`](Self::build), keeping only requests inside `range`.
    pub fn build_for_range(requests: &[DayOffRequest], range: DateRange) -> Self {
        let in_range: Vec<DayOffRequest> = requests
            .iter()
            .filter(|r| range.contains(r.date))
            .cloned()
            .collect();
        Self::build(&in_range)
    }

    pub fn is_off(&self, driver: &DriverId, date: DateKey) -> bool {
        self.off_by_date
            .get(&date)
            .is_some_and(|off| off.contains(driver))
    }

    pub fn drivers_off(&self, date: DateKey) -> impl Iterator<Item = &DriverId> {
        self.off_by_date.get(&date).into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> DateKey {
        DateKey::from_ymd(2025, 6, d).unwrap()
    }

    #[test]
    fn test_capable_drivers_in_name_order() {
        let drivers = vec![
            Driver::new("d3", "Carol").with_courses(["x"]),
            Driver::new("d1", "Alice").with_courses(["x", "y"]),
            Driver::new("d2", "Bob").with_courses(["x"]),
        ];
        let index = CapabilityIndex::build(&drivers);

        let x: Vec<&str> = index
            .capable_drivers(&CourseId::new("x"))
            .iter()
            .map(|d| d.as_str())
            .collect();
        assert_eq!(x, vec!["d1", "d2", "d3"]);
        assert_eq!(index.capable_drivers(&CourseId::new("y")).len(), 1);
    }

    #[test]
    fn test_name_ties_break_on_id() {
        let drivers = vec![
            Driver::new("b", "Sam").with_courses(["x"]),
            Driver::new("a", "Sam").with_courses(["x"]),
        ];
        let index = CapabilityIndex::build(&drivers);
        assert_eq!(
            index.capable_drivers(&CourseId::new("x")),
            &[DriverId::new("a"), DriverId::new("b")]
        );
    }

    #[test]
    fn test_unknown_course_has_no_drivers() {
        let index = CapabilityIndex::build(&[Driver::new("d1", "Alice")]);
        assert!(index.capable_drivers(&CourseId::new("nowhere")).is_empty());
        assert!(!index.is_capable(&DriverId::new("d1"), &CourseId::new("nowhere")));
    }

    #[test]
    fn test_is_off() {
        let index = AvailabilityIndex::build(&[
            DayOffRequest::new("d1", day(1)),
            DayOffRequest::new("d2", day(1)),
        ]);
        assert!(index.is_off(&DriverId::new("d1"), day(1)));
        assert!(!index.is_off(&DriverId::new("d1"), day(2)));
        assert_eq!(index.drivers_off(day(1)).count(), 2);
        assert_eq!(index.drivers_off(day(3)).count(), 0);
    }

    #[test]
    fn test_build_for_range_drops_outside_requests() {
        let requests = vec![DayOffRequest::new("d1", day(1)), DayOffRequest::new("d1", day(9))];
        let index = AvailabilityIndex::build_for_range(&requests, DateRange::new(day(1), day(3)).unwrap());
        assert!(index.is_off(&DriverId::new("d1"), day(1)));
        assert!(!index.is_off(&DriverId::new("d1"), day(9)));
    }
}
