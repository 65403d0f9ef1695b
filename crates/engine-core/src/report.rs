use crate::{
    error::{ErrorKind, SyncError},
    metrics::MetricsSnapshot,
};
use chrono::NaiveDate;
use model::sync::window::SyncWindow;
use serde::Serialize;
use std::fmt;

/// How a run ended.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every target was attempted; some may have failed.
    Completed,
    /// The window was empty; nothing was fetched or written.
    NothingToSync,
    /// The anchor target could not be read, fetched or written.
    AbortedAnchorFailure,
    /// Shutdown was requested before every target was attempted.
    Cancelled,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::NothingToSync)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStatus::Completed => "Completed",
            RunStatus::NothingToSync => "NothingToSync",
            RunStatus::AbortedAnchorFailure => "AbortedAnchorFailure",
            RunStatus::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// Result of syncing one target.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TargetOutcome {
    Written { rows: usize, truncated: bool },
    NoData,
    Failed { kind: ErrorKind, message: String },
    Skipped,
}

impl TargetOutcome {
    pub fn failed(error: &SyncError) -> Self {
        TargetOutcome::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TargetOutcome::Failed { .. })
    }
}

impl fmt::Display for TargetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOutcome::Written { rows, truncated } => {
                write!(f, "{rows} rows written")?;
                if *truncated {
                    f.write_str(" (truncated at row limit)")?;
                }
                Ok(())
            }
            TargetOutcome::NoData => f.write_str("no data"),
            TargetOutcome::Failed { kind, message } => write!(f, "{kind}: {message}"),
            TargetOutcome::Skipped => f.write_str("skipped"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TargetReport {
    pub name: String,
    pub anchor: bool,
    #[serde(flatten)]
    pub outcome: TargetOutcome,
}

/// End-of-run summary.
#[derive(Serialize, Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub status: RunStatus,
    pub anchor_watermark: Option<NaiveDate>,
    pub window: Option<SyncWindow>,
    pub targets: Vec<TargetReport>,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    pub fn target(&self, name: &str) -> Option<&TargetReport> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn failed_targets(&self) -> impl Iterator<Item = &TargetReport> {
        self.targets.iter().filter(|t| t.outcome.is_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_outcomes_flat() {
        let report = TargetReport {
            name: "daily_totals".into(),
            anchor: true,
            outcome: TargetOutcome::Written {
                rows: 6,
                truncated: false,
            },
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"name": "daily_totals", "anchor": true, "outcome": "written", "rows": 6, "truncated": false})
        );
    }

    #[test]
    fn failed_outcome_carries_kind() {
        let outcome = TargetOutcome::Failed {
            kind: ErrorKind::FetchError,
            message: "HTTP 429".into(),
        };
        assert_eq!(outcome.to_string(), "FetchError: HTTP 429");
        assert!(outcome.is_failure());
    }

    #[test]
    fn only_completed_and_noop_are_success() {
        assert!(RunStatus::Completed.is_success());
        assert!(RunStatus::NothingToSync.is_success());
        assert!(!RunStatus::AbortedAnchorFailure.is_success());
        assert!(!RunStatus::Cancelled.is_success());
    }
}
