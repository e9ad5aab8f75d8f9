use std::io::Write;
use std::time::Duration;

use redline_diff::DiffOutput;

use crate::compare::SnapshotStatus;

/// Totals for one batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: Vec<String>,
    pub new: Vec<String>,
    pub errored: Vec<String>,
}

impl BatchSummary {
    pub fn record(&mut self, name: &str, status: &SnapshotStatus) {
        match status {
            SnapshotStatus::Pass { .. } => self.passed += 1,
            SnapshotStatus::Fail { .. } => self.failed.push(name.to_owned()),
            SnapshotStatus::New => self.new.push(name.to_owned()),
            SnapshotStatus::Error(_) => self.errored.push(name.to_owned()),
        }
    }

    pub fn has_failures(&self) -> bool {
        !(self.failed.is_empty() && self.new.is_empty() && self.errored.is_empty())
    }
}

/// Clear the current terminal line (wipes progress indicator).
pub fn clear_line() {
    print!("\r\x1b[2K");
}

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

fn status_line(name: &str, status: &SnapshotStatus, elapsed: Duration) -> String {
    let time_suffix = format!("  \x1b[2m{}\x1b[0m", format_duration(elapsed));
    match status {
        SnapshotStatus::Pass { score } if *score > 0.0 => {
            format!("  \x1b[32mPASS\x1b[0m  {name}  ({score:.2}%){time_suffix}")
        }
        SnapshotStatus::Pass { .. } => format!("  \x1b[32mPASS\x1b[0m  {name}{time_suffix}"),
        SnapshotStatus::Fail {
            diff_pixels,
            score,
            dimension_mismatch: Some((rw, rh, cw, ch)),
        } => format!(
            "  \x1b[31mFAIL\x1b[0m  {name}  (dimensions changed: {rw}x{rh} -> {cw}x{ch}, {diff_pixels} pixels, {score:.2}%){time_suffix}"
        ),
        SnapshotStatus::Fail {
            diff_pixels, score, ..
        } => format!(
            "  \x1b[31mFAIL\x1b[0m  {name}  ({diff_pixels} pixels, {score:.2}%){time_suffix}"
        ),
        SnapshotStatus::New => {
            format!("  \x1b[33m NEW\x1b[0m  {name}  (no reference){time_suffix}")
        }
        SnapshotStatus::Error(msg) => {
            format!("  \x1b[31m ERR\x1b[0m  {name}  ({msg}){time_suffix}")
        }
    }
}

/// Print a single snapshot result line.
pub fn print_line(name: &str, status: &SnapshotStatus, elapsed: Duration) {
    clear_line();
    println!("{}", status_line(name, status, elapsed));
}

/// Show comparison progress indicator.
pub fn show_progress(done: usize, total: usize) {
    if done < total {
        print!("  Comparing  [{done}/{total}]");
        let _ = std::io::stdout().flush();
    }
}

/// Print snapshot names grouped by status. Only non-empty groups are shown.
pub fn print_actionable_summary(summary: &BatchSummary) {
    if !summary.has_failures() {
        return;
    }

    clear_line();
    println!();
    println!("Actionable snapshots:");

    for (label, names) in [
        ("Failed", &summary.failed),
        ("New", &summary.new),
        ("Errored", &summary.errored),
    ] {
        if !names.is_empty() {
            println!();
            println!("  {label} ({}):", names.len());
            for name in names {
                println!("    {name}");
            }
        }
    }
}

/// Print the final summary.
pub fn print_summary(summary: &BatchSummary, elapsed: Duration) {
    let failed = summary.failed.len();
    let new = summary.new.len();
    let errored = summary.errored.len();

    clear_line();
    println!();
    print!(
        "Snapshots:  {} total, \x1b[32m{} passed\x1b[0m, \x1b[31m{failed} failed\x1b[0m, \x1b[33m{new} new\x1b[0m",
        summary.total, summary.passed,
    );
    if errored > 0 {
        print!(", \x1b[31m{errored} errored\x1b[0m");
    }
    println!();
    println!("Time:       {}", format_duration(elapsed));

    if summary.has_failures() {
        println!();
        if failed > 0 {
            println!("{failed} snapshot(s) have visual differences.");
        }
        if new > 0 {
            println!("{new} snapshot(s) have no reference.");
        }
        if errored > 0 {
            println!("{errored} snapshot(s) could not be compared.");
        }
    }
}

/// One-line result for `redline diff`.
pub fn diff_line(output: &DiffOutput, passed: bool) -> String {
    let label = if passed {
        "\x1b[32mPASS\x1b[0m"
    } else {
        "\x1b[31mFAIL\x1b[0m"
    };
    let mut line = format!(
        "{label}  {:.2}%  ({} of {} pixels changed, {}x{})",
        output.score, output.diff_pixels, output.total_pixels, output.width, output.height
    );
    if let Some((fw, fh, sw, sh)) = output.dimension_mismatch {
        line.push_str(&format!("  dimensions differ: {fw}x{fh} vs {sw}x{sh}"));
    }
    line
}
