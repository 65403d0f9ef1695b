use crate::settings::{CredentialSettings, SinkSettings};
use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;
use engine_core::planner::WindowPlanner;
use model::sync::target::SyncTarget;
use std::time::Duration;

/// Immutable, validated configuration used for one run.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    pub site_url: String,
    pub planner: WindowPlanner,
    pub row_limit: usize,
    pub call_timeout: Duration,
    pub max_concurrency: usize,
    pub timezone: Option<Tz>,
    pub api_base_url: String,
    pub credentials: CredentialSettings,
    pub sink: SinkSettings,
    /// Registered targets, anchor first.
    pub targets: Vec<SyncTarget>,
}

impl ValidatedSettings {
    pub fn anchor(&self) -> &SyncTarget {
        &self.targets[0]
    }

    /// Current calendar date in the configured zone.
    pub fn today(&self) -> NaiveDate {
        match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
            None => Local::now().date_naive(),
        }
    }
}
