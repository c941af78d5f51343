//! Outcome classification, batch summary, and exit codes.

use crate::config::{ApplicationError, PatchOutcome, PatchResult};
use serde::Serialize;
use std::path::PathBuf;

/// Everything applied or already applied.
pub const EXIT_OK: i32 = 0;
/// At least one file failed.
pub const EXIT_FAILED: i32 = 1;
/// No failures, but nothing was patched and something was not found.
pub const EXIT_NO_MATCH: i32 = 2;

/// Coarse per-file status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Patched,
    Unchanged,
    NotFound,
    Error,
}

impl Status {
    pub fn of(result: &Result<PatchResult, ApplicationError>) -> Self {
        match result {
            Ok(PatchResult::Applied { .. }) => Status::Patched,
            Ok(PatchResult::Unchanged { .. }) => Status::Unchanged,
            Err(ApplicationError::FileNotFound { .. })
            | Err(ApplicationError::PatternNotFound { .. }) => Status::NotFound,
            Err(_) => Status::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub patched: usize,
    pub unchanged: usize,
    pub not_found: usize,
    pub errors: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[PatchOutcome]) -> Self {
        let mut summary = Summary::default();
        for outcome in outcomes {
            summary.record(Status::of(&outcome.result));
        }
        summary
    }

    pub fn record(&mut self, status: Status) {
        match status {
            Status::Patched => self.patched += 1,
            Status::Unchanged => self.unchanged += 1,
            Status::NotFound => self.not_found += 1,
            Status::Error => self.errors += 1,
        }
    }

    pub fn merge(&mut self, other: Summary) {
        self.patched += other.patched;
        self.unchanged += other.unchanged;
        self.not_found += other.not_found;
        self.errors += other.errors;
    }

    pub fn exit_code(&self) -> i32 {
        if self.errors > 0 {
            EXIT_FAILED
        } else if self.patched == 0 && self.not_found > 0 {
            EXIT_NO_MATCH
        } else {
            EXIT_OK
        }
    }
}

/// Serializable view of a [`PatchOutcome`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub patch: String,
    pub file: PathBuf,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&PatchOutcome> for ReportEntry {
    fn from(outcome: &PatchOutcome) -> Self {
        Self {
            patch: outcome.patch_id.clone(),
            file: outcome.file.clone(),
            status: Status::of(&outcome.result),
            detail: outcome.result.as_ref().err().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    pub summary: Summary,
}

impl Report {
    pub fn new(outcomes: &[PatchOutcome]) -> Self {
        Self {
            entries: outcomes.iter().map(ReportEntry::from).collect(),
            summary: Summary::from_outcomes(outcomes),
        }
    }

    pub fn extend(&mut self, outcomes: &[PatchOutcome]) {
        self.entries.extend(outcomes.iter().map(ReportEntry::from));
        self.summary.merge(Summary::from_outcomes(outcomes));
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
