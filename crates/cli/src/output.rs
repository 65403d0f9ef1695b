use crate::{error::CliError, shutdown::ExitCode};
use engine_core::report::{RunReport, RunStatus};
use std::fmt::Write;

fn generate_report_json(report: &RunReport) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub async fn write_report(report: &RunReport, path: &str) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

pub fn print_report(report: &RunReport, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", generate_report_json(report)?);
    } else {
        print!("{}", render_table(report));
    }
    Ok(())
}

pub fn exit_code(status: RunStatus) -> ExitCode {
    match status {
        RunStatus::Cancelled => ExitCode::ShutdownRequested,
        s if s.is_success() => ExitCode::Success,
        _ => ExitCode::GeneralError,
    }
}

fn render_table(report: &RunReport) -> String {
    let mut out = String::new();
    let na = || "n/a".to_string();

    let _ = writeln!(out, "Sync run {}: {}", report.run_id, report.status);
    let _ = writeln!(out, "-----------------------------");
    let _ = writeln!(
        out,
        "{:<20} {}",
        "Anchor watermark",
        report.anchor_watermark.map(|d| d.to_string()).unwrap_or_else(na)
    );
    let _ = writeln!(
        out,
        "{:<20} {}",
        "Window",
        report
            .window
            .map(|w| format!("{w} ({} days)", w.days()))
            .unwrap_or_else(na)
    );
    for t in &report.targets {
        let name = if t.anchor {
            format!("{} (anchor)", t.name)
        } else {
            t.name.clone()
        };
        let _ = writeln!(out, "{name:<28} {}", t.outcome);
    }
    let m = &report.metrics;
    let _ = writeln!(
        out,
        "Fetches: {}, rows fetched: {}, rows written: {}, truncated: {}, failures: {}",
        m.fetch_calls, m.rows_fetched, m.rows_written, m.truncated_fetches, m.failure_count
    );
    out
}
