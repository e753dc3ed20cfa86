//! Error types for the scheduling engine.

use std::fmt;

use crate::domain::{CellKey, CourseId, DateKey, DateRange, DriverId};

/// Failure talking to the assignment store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The store could not be reached or did not answer.
    Unavailable(String),
    /// The store refused the write.
    Rejected(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Unavailable(msg) => write!(f, "Assignment store unavailable: {}", msg),
            PersistenceError::Rejected(msg) => write!(f, "Assignment store rejected write: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Errors surfaced by scheduling operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A date string that is not `YYYY-MM-DD`.
    InvalidDate(String),
    /// Range with `start > end`.
    InvalidDateRange { start: DateKey, end: DateKey },
    /// Range longer than the configured maximum.
    DateRangeTooLong { days: i64, max: i64 },
    /// A date outside the currently loaded range.
    DateOutOfRange { date: DateKey, range: DateRange },
    UnknownCourse(CourseId),
    UnknownDriver(DriverId),
    /// The driver is not in the cell's selectable list.
    DriverNotSelectable {
        date: DateKey,
        course_id: CourseId,
        driver_id: DriverId,
    },
    /// Leaving the view would drop staged edits.
    UnsavedEdits { pending: usize },
    Persistence(PersistenceError),
}

impl ScheduleError {
    /// Input errors are rejected before any computation or store access.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ScheduleError::InvalidDate(_)
                | ScheduleError::InvalidDateRange { .. }
                | ScheduleError::DateRangeTooLong { .. }
                | ScheduleError::DateOutOfRange { .. }
        )
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidDate(raw) => {
                write!(f, "Invalid date '{}', expected YYYY-MM-DD", raw)
            }
            ScheduleError::InvalidDateRange { start, end } => {
                write!(f, "Invalid date range: start {} is after end {}", start, end)
            }
            ScheduleError::DateRangeTooLong { days, max } => {
                write!(f, "Date range spans {} days, maximum is {}", days, max)
            }
            ScheduleError::DateOutOfRange { date, range } => {
                write!(f, "Date {} is outside the loaded range {}", date, range)
            }
            ScheduleError::UnknownCourse(id) => write!(f, "Unknown course {}", id),
            ScheduleError::UnknownDriver(id) => write!(f, "Unknown driver {}", id),
            ScheduleError::DriverNotSelectable {
                date,
                course_id,
                driver_id,
            } => write!(
                f,
                "Driver {} cannot be assigned to course {} on {}",
                driver_id, course_id, date
            ),
            ScheduleError::UnsavedEdits { pending } => {
                write!(f, "{} unsaved edit(s) would be discarded", pending)
            }
            ScheduleError::Persistence(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleError::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PersistenceError> for ScheduleError {
    fn from(e: PersistenceError) -> Self {
        ScheduleError::Persistence(e)
    }
}

/// One staged cell that failed to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCommitError {
    pub cell: CellKey,
    pub error: PersistenceError,
}

impl fmt::Display for CellCommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.cell, self.error)
    }
}

impl std::error::Error for CellCommitError {}

/// Outcome of a per-cell commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub committed: Vec<CellKey>,
    pub failed: Vec<CellCommitError>,
}

impl CommitReport {
    /// True when every staged edit reached the store.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
