use std::time::Instant;

use anyhow::Result;
use futures::StreamExt;
use redline_diff::write_png;
use tracing::debug;

use crate::compare::{SnapshotStatus, compare_files};
use crate::config::ResolvedRunConfig;
use crate::report::terminal::{self, BatchSummary};
use crate::store;

/// `redline batch` — compare every current snapshot against its reference.
/// Returns exit code: 0 = all pass, 1 = any fail, new or error.
pub async fn batch(config: ResolvedRunConfig, filter: Option<&str>, parallel: usize) -> Result<i32> {
    let paths = &config.paths;
    let ids: Vec<String> = store::list_ids(&paths.current)?
        .into_iter()
        .filter(|id| store::matches_filter(id, filter))
        .collect();
    if ids.is_empty() {
        println!(
            "Nothing to compare: no snapshots in {}.",
            paths.current.display()
        );
        return Ok(0);
    }

    // Full run: wipe the whole difference dir (catches removed snapshots).
    // Filtered run: only clear files for the snapshots being compared.
    if filter.is_some() {
        store::clean_difference_files(paths, &ids);
    } else {
        store::clear_difference_dir(paths);
    }

    let run_start = Instant::now();
    let total = ids.len();
    let options = config.diff_options();
    let mut results = futures::stream::iter(ids)
        .map(|id| {
            let reference = store::reference_path(paths, &id);
            let current = store::current_path(paths, &id);
            async move {
                let started = Instant::now();
                let outcome = compare_files(reference, current, options).await;
                (id, outcome, started.elapsed())
            }
        })
        .buffer_unordered(parallel.max(1));

    let mut summary = BatchSummary {
        total,
        ..Default::default()
    };
    let mut done = 0usize;

    debug!(total, parallel, "waiting for comparison results");
    while let Some((name, outcome, elapsed)) = results.next().await {
        done += 1;
        debug!(done, total, name = %name, "received result");

        let status = match outcome {
            Ok(None) => SnapshotStatus::New,
            Ok(Some(output)) => {
                let status = SnapshotStatus::from_output(&output, config.diff_threshold);
                if status.is_failure() {
                    write_png(&store::difference_path(paths, &name), &output.png).await?;
                }
                status
            }
            Err(e) => SnapshotStatus::Error(format!("{:#}", anyhow::Error::from(e))),
        };

        summary.record(&name, &status);
        terminal::print_line(&name, &status, elapsed);
        terminal::show_progress(done, total);
    }

    terminal::print_actionable_summary(&summary);
    terminal::print_summary(&summary, run_start.elapsed());

    Ok(if summary.has_failures() { 1 } else { 0 })
}
