//! Uncommitted per-cell edits layered over a committed snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::domain::{CourseId, DateKey, DriverId, ShiftAssignment};
use crate::error::{CellCommitError, CommitReport, PersistenceError};
use crate::store::{AssignmentSnapshot, AssignmentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StagingState {
    /// No pending edits.
    Clean,
    /// At least one pending edit.
    Dirty,
}

/// Owned overlay of pending edits.
///
/// Reads see the pending value of a cell if one is staged, else the committed
/// value. `discard` drops the overlay and falls back to the snapshot the layer
/// was built from (or the one produced by the last successful commit).
#[derive(Debug, Clone, Default)]
pub struct StagingLayer {
    committed: AssignmentSnapshot,
    pending: BTreeMap<DateKey, BTreeMap<CourseId, Option<DriverId>>>,
}

impl StagingLayer {
    pub fn new(committed: AssignmentSnapshot) -> Self {
        Self {
            committed,
            pending: BTreeMap::new(),
        }
    }

    pub fn committed(&self) -> &AssignmentSnapshot {
        &self.committed
    }

    pub fn current_value(&self, date: DateKey, course: &CourseId) -> Option<&DriverId> {
        match self.pending.get(&date).and_then(|day| day.get(course)) {
            Some(staged) => staged.as_ref(),
            None => self.committed.get(date, course),
        }
    }

    pub fn is_staged(&self, date: DateKey, course: &CourseId) -> bool {
        self.pending
            .get(&date)
            .is_some_and(|day| day.contains_key(course))
    }

    /// Stages `driver` (or unfilled) for a cell, replacing any earlier edit.
    pub fn set_local_driver(&mut self, date: DateKey, course: CourseId, driver: Option<DriverId>) {
        debug!(%date, course = %course, driver = ?driver, "Staged edit");
        self.pending.entry(date).or_default().insert(course, driver);
    }

    /// Filled cells on `date` as currently shown: committed rows overlaid
    /// with every pending edit for that date.
    pub fn live_assignments_on(&self, date: DateKey) -> BTreeMap<&CourseId, &DriverId> {
        let mut live: BTreeMap<&CourseId, Option<&DriverId>> = self
            .committed
            .assigned_on(date)
            .map(|(course, driver)| (course, Some(driver)))
            .collect();
        for (course, driver) in self.pending.get(&date).into_iter().flatten() {
            live.insert(course, driver.as_ref());
        }
        live.into_iter()
            .filter_map(|(course, driver)| driver.map(|d| (course, d)))
            .collect()
    }

    /// Pending edits ordered by date then course.
    pub fn pending_edits(&self) -> impl Iterator<Item = ShiftAssignment> + '_ {
        self.pending.iter().flat_map(|(date, day)| {
            day.iter()
                .map(move |(course, driver)| ShiftAssignment::new(*date, course.clone(), driver.clone()))
        })
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(BTreeMap::len).sum()
    }

    /// Callers gate navigation on this so staged edits are never lost silently.
    pub fn has_pending_edits(&self) -> bool {
        self.pending_count() > 0
    }

    pub fn state(&self) -> StagingState {
        if self.has_pending_edits() {
            StagingState::Dirty
        } else {
            StagingState::Clean
        }
    }

    /// Drops every pending edit. Returns how many were dropped.
    pub fn discard(&mut self) -> usize {
        let dropped = self.pending_count();
        self.pending.clear();
        if dropped > 0 {
            info!(dropped, "Discarded staged edits");
        }
        dropped
    }

    /// Writes all pending edits as one all-or-nothing batch.
    ///
    /// On failure nothing is persisted and every edit stays pending.
    pub fn commit(&mut self, store: &dyn AssignmentStore) -> Result<usize, PersistenceError> {
        if !self.has_pending_edits() {
            return Ok(0);
        }

        let batch: Vec<ShiftAssignment> = self.pending_edits().collect();
        if let Err(e) = store.upsert_batch(&batch) {
            warn!(pending = batch.len(), error = %e, "Batch commit failed");
            return Err(e);
        }

        self.committed = self.committed.with_applied(&batch);
        self.pending.clear();
        info!(committed = batch.len(), "Committed staged edits");
        Ok(batch.len())
    }

    /// Writes pending edits one cell at a time.
    ///
    /// Cells that reach the store leave the overlay; failed cells stay
    /// pending and are listed in the report for resubmission.
    pub fn commit_each(&mut self, store: &dyn AssignmentStore) -> CommitReport {
        let mut report = CommitReport::default();
        let mut applied = Vec::new();

        for edit in self.pending_edits().collect::<Vec<_>>() {
            match store.upsert(&edit) {
                Ok(()) => {
                    report.committed.push(edit.key());
                    applied.push(edit);
                }
                Err(error) => {
                    warn!(cell = %edit.key(), error = %error, "Cell commit failed");
                    report.failed.push(CellCommitError {
                        cell: edit.key(),
                        error,
                    });
                }
            }
        }

        for edit in &applied {
            if let Some(day) = self.pending.get_mut(&edit.date) {
                day.remove(&edit.course_id);
                if day.is_empty() {
                    self.pending.remove(&edit.date);
                }
            }
        }
        self.committed = self.committed.with_applied(&applied);

        info!(
            committed = report.committed.len(),
            failed = report.failed.len(),
            "Committed staged edits per cell"
        );
        report
    }
}
