//! DTOs for REST API requests/responses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CellKey, CourseId, DateKey, DateRange, DriverId, ShiftAssignment};
use crate::error::{CommitReport, ScheduleError};
use crate::generator::DraftGrid;
use crate::staging::StagingState;
use crate::view::ScheduleView;

/// A date range as sent by clients. Validated by [`DateRangeDto::to_range`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeDto {
    pub start_date: String,
    pub end_date: String,
}

impl DateRangeDto {
    pub fn to_range(&self, max_days: i64) -> Result<DateRange, ScheduleError> {
        let range = DateRange::parse(&self.start_date, &self.end_date)?;
        range.ensure_max_days(max_days)?;
        Ok(range)
    }
}

/// Query form of a range: `?start=YYYY-MM-DD&end=YYYY-MM-DD`.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    pub start: String,
    pub end: String,
}

impl RangeQuery {
    pub fn to_range(&self, max_days: i64) -> Result<DateRange, ScheduleError> {
        let range = DateRange::parse(&self.start, &self.end)?;
        range.ensure_max_days(max_days)?;
        Ok(range)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDto {
    pub start_date: DateKey,
    pub end_date: DateKey,
    pub assignments: Vec<ShiftAssignment>,
    pub filled: usize,
    pub unfilled: usize,
}

impl GridDto {
    pub fn from_cells(range: DateRange, assignments: Vec<ShiftAssignment>) -> Self {
        let filled = assignments.iter().filter(|a| a.is_filled()).count();
        Self {
            start_date: range.start(),
            end_date: range.end(),
            unfilled: assignments.len() - filled,
            filled,
            assignments,
        }
    }

    pub fn from_draft(grid: DraftGrid) -> Self {
        let range = grid.range();
        Self::from_cells(range, grid.into_cells())
    }
}

/// One cell of an editing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCellDto {
    pub date: DateKey,
    pub course_id: CourseId,
    pub driver_id: Option<DriverId>,
    /// True when the value is a staged edit, not the committed one.
    pub pending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: Uuid,
    pub start_date: DateKey,
    pub end_date: DateKey,
    pub state: StagingState,
    pub has_pending_edits: bool,
    pub pending_count: usize,
    pub cells: Vec<SessionCellDto>,
}

impl SessionDto {
    pub fn from_view(id: Uuid, view: &ScheduleView) -> Self {
        let staging = view.staging();
        let cells = view
            .grid()
            .into_iter()
            .map(|cell| SessionCellDto {
                pending: staging.is_staged(cell.date, &cell.course_id),
                date: cell.date,
                course_id: cell.course_id,
                driver_id: cell.driver_id,
            })
            .collect();

        Self {
            id,
            start_date: view.range().start(),
            end_date: view.range().end(),
            state: staging.state(),
            has_pending_edits: staging.has_pending_edits(),
            pending_count: staging.pending_count(),
            cells,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesQuery {
    pub date: String,
    pub course_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesResponse {
    pub date: DateKey,
    pub course_id: CourseId,
    pub current: Option<DriverId>,
    pub drivers: Vec<DriverId>,
}

/// Body of a single-cell write or a staged edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellUpdateDto {
    pub date: String,
    pub course_id: CourseId,
    #[serde(default)]
    pub driver_id: Option<DriverId>,
}

impl CellUpdateDto {
    pub fn to_assignment(&self) -> Result<ShiftAssignment, ScheduleError> {
        Ok(ShiftAssignment::new(
            self.date.parse()?,
            self.course_id.clone(),
            self.driver_id.clone(),
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitMode {
    /// One all-or-nothing write.
    #[default]
    Batch,
    /// One write per cell; failures are reported per cell.
    PerCell,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    #[serde(default)]
    pub mode: CommitMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedCellDto {
    pub date: DateKey,
    pub course_id: CourseId,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub committed: Vec<CellKey>,
    pub failed: Vec<FailedCellDto>,
    pub state: StagingState,
}

impl CommitResponse {
    pub fn from_report(report: CommitReport, state: StagingState) -> Self {
        Self {
            committed: report.committed,
            failed: report
                .failed
                .into_iter()
                .map(|f| FailedCellDto {
                    date: f.cell.date,
                    course_id: f.cell.course_id,
                    error: f.error.to_string(),
                })
                .collect(),
            state,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardResponse {
    pub discarded: usize,
    pub state: StagingState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRangeRequest {
    pub start_date: String,
    pub end_date: String,
    /// Operator confirmed dropping staged edits.
    #[serde(default)]
    pub discard_pending: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloseQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub demo_data: &'static str,
}
