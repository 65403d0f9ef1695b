use crate::settings::{
    SinkSettings, SyncSettings, error::SettingsError, validated::ValidatedSettings,
};
use chrono_tz::Tz;
use connectors::search::MAX_ROW_LIMIT;
use engine_core::planner::WindowPlanner;
use model::sync::target::SyncTarget;
use std::{collections::HashSet, time::Duration};
use tracing::info;

/// Checks ranges and target registration before anything touches the network.
pub struct SettingsValidator<'a> {
    settings: &'a SyncSettings,
}

impl<'a> SettingsValidator<'a> {
    pub fn new(settings: &'a SyncSettings) -> Self {
        Self { settings }
    }

    pub fn validate(&self) -> Result<ValidatedSettings, SettingsError> {
        let s = self.settings;
        let mut errors: Vec<String> = Vec::new();

        if s.site_url.trim().is_empty() {
            errors.push("site_url must not be empty".into());
        }
        if !(1..=MAX_ROW_LIMIT).contains(&s.row_limit) {
            errors.push(format!(
                "row_limit must be between 1 and {MAX_ROW_LIMIT}, got {}",
                s.row_limit
            ));
        }
        if s.call_timeout_secs == 0 {
            errors.push("call_timeout_secs must be at least 1".into());
        }
        if s.max_concurrency == 0 {
            errors.push("max_concurrency must be at least 1".into());
        }
        // A shorter backfill than lag leaves the first window permanently empty.
        if s.initial_backfill_days < s.freshness_lag_days {
            errors.push(format!(
                "initial_backfill_days ({}) must not be less than freshness_lag_days ({})",
                s.initial_backfill_days, s.freshness_lag_days
            ));
        }
        self.validate_sink(&mut errors);

        let timezone = match s.timezone.as_deref() {
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(_) => {
                    errors.push(format!("unknown timezone '{name}'"));
                    None
                }
            },
            None => None,
        };

        let targets = self.validate_targets(&mut errors)?;

        if !errors.is_empty() {
            return Err(SettingsError::ValidationFailed(errors));
        }

        let validated = ValidatedSettings {
            site_url: s.site_url.clone(),
            planner: WindowPlanner {
                freshness_lag_days: s.freshness_lag_days,
                initial_backfill_days: s.initial_backfill_days,
            },
            row_limit: s.row_limit,
            call_timeout: Duration::from_secs(s.call_timeout_secs),
            max_concurrency: s.max_concurrency,
            timezone,
            api_base_url: s.api.base_url.clone(),
            credentials: s.credentials.clone(),
            sink: s.sink.clone(),
            targets,
        };

        info!(
            site = %validated.site_url,
            sink = validated.sink.kind(),
            targets = validated.targets.len(),
            anchor = validated.anchor().name(),
            "Settings validated"
        );
        Ok(validated)
    }

    fn validate_sink(&self, errors: &mut Vec<String>) {
        let blank = match &self.settings.sink {
            SinkSettings::Csv { dir } => dir.trim().is_empty().then_some("sink.dir"),
            SinkSettings::Sqlite { path } => path.trim().is_empty().then_some("sink.path"),
            SinkSettings::Postgres { url } => url.trim().is_empty().then_some("sink.url"),
            SinkSettings::Sheets { spreadsheet_id, .. } => spreadsheet_id
                .trim()
                .is_empty()
                .then_some("sink.spreadsheet_id"),
        };
        if let Some(field) = blank {
            errors.push(format!("{field} must not be empty"));
        }
    }

    /// Builds the targets, anchor first, preserving the configured order of
    /// the rest.
    fn validate_targets(&self, errors: &mut Vec<String>) -> Result<Vec<SyncTarget>, SettingsError> {
        let s = self.settings;
        if s.targets.is_empty() {
            errors.push("at least one target is required".into());
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        for t in &s.targets {
            if !seen.insert(t.name.as_str()) {
                errors.push(format!("duplicate target name '{}'", t.name));
            }
        }

        let mut targets = s
            .targets
            .iter()
            .map(|t| SyncTarget::new(t.name.clone(), t.dimensions.clone(), t.header.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        match targets.iter().position(|t| t.name() == s.anchor) {
            Some(idx) => {
                let anchor = targets.remove(idx);
                targets.insert(0, anchor);
            }
            None => errors.push(format!("anchor target '{}' is not registered", s.anchor)),
        }

        Ok(targets)
    }
}
