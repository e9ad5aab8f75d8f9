use std::path::PathBuf;

use redline_diff::{DiffError, DiffOptions, DiffOutput, output_diff_stream};

/// Status of a single snapshot comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotStatus {
    Pass {
        score: f64,
    },
    Fail {
        diff_pixels: u64,
        score: f64,
        dimension_mismatch: Option<(u32, u32, u32, u32)>,
    },
    New,
    Error(String),
}

/// A diff passes when nothing changed or the unrounded changed share is
/// within `threshold` percent. A zero threshold therefore means exact.
pub fn within_threshold(output: &DiffOutput, threshold: f64) -> bool {
    output.is_match() || output.changed_percentage() <= threshold
}

impl SnapshotStatus {
    /// Classify a finished diff against the pass threshold.
    pub fn from_output(output: &DiffOutput, threshold: f64) -> Self {
        if within_threshold(output, threshold) {
            Self::Pass {
                score: output.score,
            }
        } else {
            Self::Fail {
                diff_pixels: output.diff_pixels,
                score: output.score,
                dimension_mismatch: output.dimension_mismatch,
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Pass { .. })
    }
}

/// Diff a reference file against a current file.
/// `Ok(None)` when there is no reference yet.
pub async fn compare_files(
    reference: PathBuf,
    current: PathBuf,
    options: DiffOptions,
) -> Result<Option<DiffOutput>, DiffError> {
    if !reference.exists() {
        return Ok(None);
    }
    output_diff_stream(reference, current, options).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(diff_pixels: u64, score: f64) -> DiffOutput {
        sized_output(diff_pixels, 100, score)
    }

    fn sized_output(diff_pixels: u64, total_pixels: u64, score: f64) -> DiffOutput {
        DiffOutput {
            png: Vec::new(),
            score,
            diff_pixels,
            total_pixels,
            width: 10,
            height: 10,
            dimension_mismatch: None,
        }
    }

    #[test]
    fn within_threshold_passes() {
        assert_eq!(
            SnapshotStatus::from_output(&output(1, 1.0), 1.0),
            SnapshotStatus::Pass { score: 1.0 }
        );
        assert_eq!(
            SnapshotStatus::from_output(&output(0, 0.0), 0.0),
            SnapshotStatus::Pass { score: 0.0 }
        );
    }

    #[test]
    fn above_threshold_fails() {
        let status = SnapshotStatus::from_output(&output(2, 2.0), 1.0);
        assert!(status.is_failure());
        assert_eq!(
            status,
            SnapshotStatus::Fail {
                diff_pixels: 2,
                score: 2.0,
                dimension_mismatch: None,
            }
        );
    }

    #[test]
    fn zero_threshold_is_exact_even_when_score_rounds_to_zero() {
        // One pixel of 300x300 rounds to a 0.00 score.
        let single = sized_output(1, 90_000, 0.0);
        assert!(!within_threshold(&single, 0.0));
        assert!(SnapshotStatus::from_output(&single, 0.0).is_failure());
        assert!(within_threshold(&single, 0.01));
    }

    #[tokio::test]
    async fn missing_reference_is_new() {
        let dir = tempfile::tempdir().unwrap();
        let res = compare_files(
            dir.path().join("ref.png"),
            dir.path().join("cur.png"),
            DiffOptions::default(),
        )
        .await
        .unwrap();
        assert!(res.is_none());
    }
}
