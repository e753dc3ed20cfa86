//! Draft generation: greedy first-fit fill of a whole date range.
//!
//! For each date in ascending order, courses are visited in fill order and
//! each takes the first capable driver (in listing order) who is not off and
//! not already placed that day. There is no backtracking, so a day can end
//! with unfilled courses that a different course order would have filled.
//! That outcome is the policy, not a defect.

use std::collections::HashSet;

use crate::domain::{Course, CourseId, DateKey, DateRange, DriverId, ShiftAssignment};
use crate::index::{AvailabilityIndex, CapabilityIndex};

/// A complete date x course grid, dates ascending, courses in fill order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftGrid {
    range: DateRange,
    cells: Vec<ShiftAssignment>,
}

impl DraftGrid {
    #[inline]
    pub fn range(&self) -> DateRange {
        self.range
    }

    #[inline]
    pub fn cells(&self) -> &[ShiftAssignment] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<ShiftAssignment> {
        self.cells
    }

    /// The chosen driver of a cell. Outer `None` when the cell is not in the grid.
    pub fn get(&self, date: DateKey, course: &CourseId) -> Option<Option<&DriverId>> {
        self.cells
            .iter()
            .find(|c| c.date == date && &c.course_id == course)
            .map(|c| c.driver_id.as_ref())
    }

    pub fn cells_on(&self, date: DateKey) -> impl Iterator<Item = &ShiftAssignment> {
        self.cells.iter().filter(move |c| c.date == date)
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_filled()).count()
    }

    pub fn unfilled_count(&self) -> usize {
        self.cells.len() - self.filled_count()
    }
}

/// Pure draft generator over one roster snapshot.
pub struct DraftGenerator<'a> {
    courses: Vec<&'a Course>,
    capability: &'a CapabilityIndex,
    availability: &'a AvailabilityIndex,
}

impl<'a> DraftGenerator<'a> {
    pub fn new(
        courses: &'a [Course],
        capability: &'a CapabilityIndex,
        availability: &'a AvailabilityIndex,
    ) -> Self {
        let mut courses: Vec<&Course> = courses.iter().collect();
        courses.sort_by(|a, b| Course::fill_order(a, b));
        Self {
            courses,
            capability,
            availability,
        }
    }

    /// Computes the grid. Identical inputs give identical output.
    pub fn generate(&self, range: DateRange) -> DraftGrid {
        let mut cells = Vec::with_capacity(range.len_days() as usize * self.courses.len());

        for date in range.days() {
            let mut assigned_today: HashSet<&DriverId> = HashSet::new();

            for course in &self.courses {
                let chosen = self
                    .capability
                    .capable_drivers(&course.id)
                    .iter()
                    .find(|driver| {
                        !self.availability.is_off(driver, date) && !assigned_today.contains(driver)
                    });

                if let Some(driver) = chosen {
                    assigned_today.insert(driver);
                }
                cells.push(ShiftAssignment::new(date, course.id.clone(), chosen.cloned()));
            }
        }

        DraftGrid { range, cells }
    }
}
