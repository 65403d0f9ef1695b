use crate::{
    error::RunError,
    execution::factory,
    settings::validated::ValidatedSettings,
};
use chrono::NaiveDate;
use connectors::{
    search::ReportingApi,
    sink::{Row, TableHandle, TabularSink},
};
use engine_core::{
    error::SyncError,
    fetcher::ReportFetcher,
    gateway::SinkGateway,
    metrics::Metrics,
    planner::WindowPlanner,
    report::{RunReport, RunStatus, TargetOutcome, TargetReport},
    watermark::WatermarkTracker,
};
use futures::{StreamExt, stream};
use model::sync::{target::SyncTarget, window::SyncWindow};
use std::{collections::HashMap, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Builds the sink and API client from `settings` and performs one sync run.
///
/// The sink is only opened once credentials have been verified.
pub async fn run(
    settings: ValidatedSettings,
    env: &HashMap<String, String>,
    cancel: CancellationToken,
) -> Result<RunReport, RunError> {
    let credentials = factory::create_credentials(&settings.credentials, env);
    let http = factory::create_http_client(&settings)?;
    let api = factory::create_api(&settings, &http, credentials.clone())?;
    let sink = factory::create_sink(&settings, &http, credentials);

    let today = settings.today();
    SyncOrchestrator::new(&settings, sink, api, cancel)
        .run(today)
        .await
}

/// Drives one run: anchor watermark, shared window, then every target.
pub struct SyncOrchestrator {
    run_id: String,
    targets: Vec<SyncTarget>,
    planner: WindowPlanner,
    max_concurrency: usize,
    gateway: SinkGateway,
    fetcher: ReportFetcher,
    metrics: Metrics,
    cancel: CancellationToken,
}

impl SyncOrchestrator {
    /// `settings.targets` must hold the anchor first, as validation leaves it.
    pub fn new(
        settings: &ValidatedSettings,
        sink: Arc<dyn TabularSink>,
        api: Arc<dyn ReportingApi>,
        cancel: CancellationToken,
    ) -> Self {
        let metrics = Metrics::new();
        SyncOrchestrator {
            run_id: uuid::Uuid::new_v4().to_string(),
            targets: settings.targets.clone(),
            planner: settings.planner,
            max_concurrency: settings.max_concurrency.max(1),
            gateway: SinkGateway::new(sink, settings.call_timeout),
            fetcher: ReportFetcher::new(
                api,
                settings.site_url.clone(),
                settings.row_limit,
                settings.call_timeout,
                metrics.clone(),
            ),
            metrics,
            cancel,
        }
    }

    /// Runs every target once against the window planned for `today`.
    ///
    /// Only a credential failure is returned as an error; everything after
    /// that ends in a report.
    pub async fn run(&self, today: NaiveDate) -> Result<RunReport, RunError> {
        info!(run_id = %self.run_id, sink = self.gateway.kind(), %today, "Starting sync run");

        let Some((anchor, rest)) = self.targets.split_first() else {
            return Ok(self.report(RunStatus::Completed, None, None, Vec::new()));
        };

        if self.cancel.is_cancelled() {
            warn!("Shutdown requested before the run started");
            return Ok(self.report(RunStatus::Cancelled, None, None, self.skip_all()));
        }

        self.fetcher
            .verify_credentials()
            .await
            .map_err(SyncError::AuthUnavailable)
            .inspect_err(|e| error!(error = %e, "Credential check failed"))?;

        let (handle, watermark) = match WatermarkTracker::new(&self.gateway)
            .last_synced_date(anchor)
            .await
        {
            Ok(found) => found,
            Err(e) => return Ok(self.abort(anchor, None, None, e)),
        };

        let window = self.planner.plan(watermark, today);
        if window.is_empty() {
            info!(
                anchor = anchor.name(),
                %window,
                "Anchor is up to date, nothing to sync"
            );
            return Ok(self.report(
                RunStatus::NothingToSync,
                watermark,
                Some(window),
                self.skip_all(),
            ));
        }
        info!(%window, days = window.days(), "Planned sync window");

        if self.cancel.is_cancelled() {
            warn!("Shutdown requested before the anchor target, nothing was written");
            return Ok(self.report(
                RunStatus::Cancelled,
                watermark,
                Some(window),
                self.skip_all(),
            ));
        }

        let anchor_outcome = match self.sync_target(anchor, Some(handle), &window).await {
            Ok(outcome) => outcome,
            Err(e) => return Ok(self.abort(anchor, watermark, Some(window), e)),
        };

        let mut targets = vec![TargetReport {
            name: anchor.name().to_string(),
            anchor: true,
            outcome: anchor_outcome,
        }];

        let others: Vec<TargetReport> = stream::iter(rest)
            .map(|target| self.run_target(target, &window))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let cancelled = others
            .iter()
            .any(|t| t.outcome == TargetOutcome::Skipped);
        targets.extend(others);

        let status = if cancelled {
            warn!("Run cancelled; remaining targets were skipped");
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        let report = self.report(status, watermark, Some(window), targets);
        let failed = report.failed_targets().count();
        if failed > 0 {
            warn!(failed, "Sync run finished with failed targets");
        }
        info!(status = %report.status, rows_written = report.metrics.rows_written, "Sync run finished");
        Ok(report)
    }

    /// Non-anchor target: failures are recorded and never stop the run.
    async fn run_target(&self, target: &SyncTarget, window: &SyncWindow) -> TargetReport {
        let outcome = if self.cancel.is_cancelled() {
            warn!(table = target.name(), "Shutdown requested, skipping target");
            TargetOutcome::Skipped
        } else {
            match self.sync_target(target, None, window).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.metrics.increment_failures(1);
                    error!(table = target.name(), kind = %e.kind(), error = %e, "Target failed");
                    TargetOutcome::failed(&e)
                }
            }
        };

        TargetReport {
            name: target.name().to_string(),
            anchor: false,
            outcome,
        }
    }

    /// Ensure (unless a handle is already known), fetch and append.
    async fn sync_target(
        &self,
        target: &SyncTarget,
        handle: Option<TableHandle>,
        window: &SyncWindow,
    ) -> Result<TargetOutcome, SyncError> {
        let handle = match handle {
            Some(handle) => handle,
            None => self.gateway.ensure(target).await?,
        };

        let fetched = self
            .fetcher
            .fetch(target.name(), window, target.dimensions())
            .await
            .map_err(|source| SyncError::Fetch {
                target: target.name().to_string(),
                source,
            })?;

        if fetched.rows.is_empty() {
            info!(table = target.name(), %window, "No data in window");
            return Ok(TargetOutcome::NoData);
        }

        let rows: Vec<Row> = fetched
            .rows
            .iter()
            .map(|row| row.to_values(target.dimensions()))
            .collect();
        let written = self.gateway.append(&handle, &rows).await?;
        self.metrics.increment_rows_written(written as u64);

        info!(
            table = target.name(),
            rows = written,
            truncated = fetched.truncated,
            "Appended rows"
        );
        Ok(TargetOutcome::Written {
            rows: written,
            truncated: fetched.truncated,
        })
    }

    /// The anchor failed: it is reported failed and nothing else is attempted.
    fn abort(
        &self,
        anchor: &SyncTarget,
        watermark: Option<NaiveDate>,
        window: Option<SyncWindow>,
        e: SyncError,
    ) -> RunReport {
        self.metrics.increment_failures(1);
        error!(
            table = anchor.name(),
            kind = %e.kind(),
            error = %e,
            "Anchor target failed, aborting run"
        );

        let mut targets = self.skip_all();
        if let Some(first) = targets.first_mut() {
            first.outcome = TargetOutcome::failed(&e);
        }
        self.report(RunStatus::AbortedAnchorFailure, watermark, window, targets)
    }

    fn skip_all(&self) -> Vec<TargetReport> {
        self.targets
            .iter()
            .enumerate()
            .map(|(idx, t)| TargetReport {
                name: t.name().to_string(),
                anchor: idx == 0,
                outcome: TargetOutcome::Skipped,
            })
            .collect()
    }

    fn report(
        &self,
        status: RunStatus,
        anchor_watermark: Option<NaiveDate>,
        window: Option<SyncWindow>,
        targets: Vec<TargetReport>,
    ) -> RunReport {
        RunReport {
            run_id: self.run_id.clone(),
            status,
            anchor_watermark,
            window,
            targets,
            metrics: self.metrics.snapshot(),
        }
    }
}
