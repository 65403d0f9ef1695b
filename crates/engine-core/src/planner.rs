use chrono::{Days, NaiveDate};
use model::sync::window::SyncWindow;

pub const DEFAULT_FRESHNESS_LAG_DAYS: u32 = 3;
pub const DEFAULT_INITIAL_BACKFILL_DAYS: u32 = 400;

/// Computes the fetch window shared by every target of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlanner {
    /// Days of not-yet-final data skipped at the recent end.
    pub freshness_lag_days: u32,
    /// How far back the first run reaches.
    pub initial_backfill_days: u32,
}

impl Default for WindowPlanner {
    fn default() -> Self {
        WindowPlanner {
            freshness_lag_days: DEFAULT_FRESHNESS_LAG_DAYS,
            initial_backfill_days: DEFAULT_INITIAL_BACKFILL_DAYS,
        }
    }
}

impl WindowPlanner {
    pub fn plan(&self, anchor_watermark: Option<NaiveDate>, today: NaiveDate) -> SyncWindow {
        plan(
            anchor_watermark,
            today,
            self.freshness_lag_days,
            self.initial_backfill_days,
        )
    }
}

/// `end = today - lag`; `start = watermark + 1`, or `today - backfill` when no
/// watermark exists. An inverted result means there is nothing to fetch.
pub fn plan(
    anchor_watermark: Option<NaiveDate>,
    today: NaiveDate,
    freshness_lag_days: u32,
    initial_backfill_days: u32,
) -> SyncWindow {
    let end_date = days_before(today, freshness_lag_days);
    let start_date = match anchor_watermark {
        Some(watermark) => watermark.succ_opt().unwrap_or(NaiveDate::MAX),
        None => days_before(today, initial_backfill_days),
    };
    SyncWindow::new(start_date, end_date)
}

fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}
