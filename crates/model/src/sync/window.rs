use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Inclusive date range fetched for every target in a run.
///
/// A window whose start lies after its end is empty: there is nothing to sync.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SyncWindow {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        SyncWindow {
            start_date,
            end_date,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_date > self.end_date
    }

    /// Number of calendar days covered, zero when empty.
    pub fn days(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.end_date - self.start_date).num_days() as u64 + 1
        }
    }
}

impl fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start_date, self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn single_day_window_is_not_empty() {
        let w = SyncWindow::new(d(6, 7), d(6, 7));
        assert!(!w.is_empty());
        assert_eq!(w.days(), 1);
    }

    #[test]
    fn inverted_window_is_empty() {
        let w = SyncWindow::new(d(6, 8), d(6, 7));
        assert!(w.is_empty());
        assert_eq!(w.days(), 0);
    }

    #[test]
    fn counts_days_inclusively() {
        assert_eq!(SyncWindow::new(d(6, 2), d(6, 7)).days(), 6);
    }
}
