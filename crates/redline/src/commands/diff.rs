use std::path::Path;

use anyhow::{Context, Result, bail};
use redline_diff::{DiffOutput, ImageSource, output_diff_stream, write_png};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::ResolvedRunConfig;
use crate::report::terminal;

/// Machine-readable result for `redline diff --json`.
#[derive(Debug, Serialize)]
struct DiffReport<'a> {
    score: f64,
    threshold: f64,
    passed: bool,
    diff_pixels: u64,
    total_pixels: u64,
    width: u32,
    height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension_mismatch: Option<[u32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a str>,
}

impl<'a> DiffReport<'a> {
    fn new(result: &DiffOutput, threshold: f64, passed: bool, output: Option<&'a str>) -> Self {
        Self {
            score: result.score,
            threshold,
            passed,
            diff_pixels: result.diff_pixels,
            total_pixels: result.total_pixels,
            width: result.width,
            height: result.height,
            dimension_mismatch: result
                .dimension_mismatch
                .map(|(fw, fh, sw, sh)| [fw, fh, sw, sh]),
            output,
        }
    }
}

/// `redline diff` — compare two images, write the diff, report the score.
/// Returns exit code: 0 = within threshold, 1 = over threshold.
pub async fn diff(
    config: ResolvedRunConfig,
    first: &str,
    second: &str,
    output: Option<&str>,
    json: bool,
) -> Result<i32> {
    let first = ImageSource::parse(first)?;
    let second = ImageSource::parse(second)?;
    if matches!(
        (&first, &second),
        (ImageSource::Stream(_), ImageSource::Stream(_))
    ) {
        bail!("Only one input can be read from stdin");
    }

    let result = output_diff_stream(first, second, config.diff_options()).await?;
    let passed = config.passes(&result);
    info!(
        score = result.score,
        threshold = config.diff_threshold,
        passed,
        "comparison finished"
    );

    let to_stdout = output == Some("-");
    match output {
        Some("-") => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&result.png)
                .await
                .context("Failed to write diff image to stdout")?;
            stdout.flush().await?;
        }
        Some(path) => write_png(Path::new(path), &result.png).await?,
        None => {}
    }

    let report = if json {
        let written = output.filter(|o| *o != "-");
        serde_json::to_string(&DiffReport::new(
            &result,
            config.diff_threshold,
            passed,
            written,
        ))
        .context("Failed to serialize diff report")?
    } else {
        terminal::diff_line(&result, passed)
    };
    // Keep stdout clean when it carries the image.
    if to_stdout {
        eprintln!("{report}");
    } else {
        println!("{report}");
    }

    Ok(if passed { 0 } else { 1 })
}
