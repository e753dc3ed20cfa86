//! The two persisted operations: draft generation and single-cell assignment.

use std::time::Instant;
use tracing::{info, warn};

use crate::conflicts::ConflictEvaluator;
use crate::domain::{DateRange, Roster, ShiftAssignment};
use crate::error::ScheduleError;
use crate::generator::{DraftGenerator, DraftGrid};
use crate::index::{AvailabilityIndex, CapabilityIndex};
use crate::staging::StagingLayer;
use crate::store::AssignmentStore;

#[cfg(feature = "console")]
use crate::console;

/// Generates a draft for `range` and writes it as one batch.
///
/// Existing assignments in the range are ignored while computing and
/// overwritten by the write. If the write fails nothing is persisted.
pub fn generate_draft(
    store: &dyn AssignmentStore,
    roster: &Roster,
    range: DateRange,
) -> Result<DraftGrid, ScheduleError> {
    let started = Instant::now();
    let capability = CapabilityIndex::build(&roster.drivers);
    let availability = AvailabilityIndex::build_for_range(&roster.day_offs, range);
    let grid = DraftGenerator::new(&roster.courses, &capability, &availability).generate(range);

    if let Err(e) = store.replace_range(range, grid.cells()) {
        warn!(%range, error = %e, "Draft write failed");
        return Err(e.into());
    }

    info!(
        %range,
        courses = roster.courses.len(),
        filled = grid.filled_count(),
        unfilled = grid.unfilled_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Generated draft"
    );

    #[cfg(feature = "console")]
    console::print_draft_summary(&grid, roster.courses.len(), started.elapsed());

    Ok(grid)
}

/// Writes exactly one cell.
///
/// The driver must be selectable for the cell against the committed grid.
/// Repeating the same write leaves the store unchanged.
pub fn set_assignment(
    store: &dyn AssignmentStore,
    roster: &Roster,
    assignment: ShiftAssignment,
) -> Result<(), ScheduleError> {
    roster.require_course(&assignment.course_id)?;
    if let Some(driver) = assignment.driver_id.as_ref() {
        let day = DateRange::single(assignment.date);
        let committed = StagingLayer::new(store.load_range(day)?);
        if committed.current_value(assignment.date, &assignment.course_id) != Some(driver) {
            roster.require_driver(driver)?;
        }
        let capability = CapabilityIndex::build(&roster.drivers);
        let availability = AvailabilityIndex::build_for_range(&roster.day_offs, day);
        let evaluator = ConflictEvaluator::new(&capability, &availability);
        if !evaluator.is_selectable(&committed, assignment.date, &assignment.course_id, Some(driver)) {
            return Err(ScheduleError::DriverNotSelectable {
                date: assignment.date,
                course_id: assignment.course_id.clone(),
                driver_id: driver.clone(),
            });
        }
    }

    store.upsert(&assignment)?;
    info!(
        cell = %assignment.key(),
        driver = ?assignment.driver_id,
        "Set assignment"
    );
    Ok(())
}

/// Committed grid for `range`: every date x course, unfilled where no row exists.
pub fn load_assignments(
    store: &dyn AssignmentStore,
    roster: &Roster,
    range: DateRange,
) -> Result<Vec<ShiftAssignment>, ScheduleError> {
    let snapshot = &store.load_range(range)?;
    let courses = roster.ordered_courses();
    Ok(range
        .days()
        .flat_map(|date| {
            courses.iter().map(move |course| {
                ShiftAssignment::new(date, course.id.clone(), snapshot.get(date, &course.id).cloned())
            })
        })
        .collect())
}
