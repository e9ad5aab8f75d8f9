use std::io::Cursor;
use std::path::Path;

use tokio::io::AsyncRead;
use tracing::debug;

use crate::{DiffError, DiffOptions, ImageSource, codec, pixel};

/// Encoded diff image plus its score.
#[derive(Debug, Clone)]
pub struct DiffOutput {
    /// PNG-encoded composited diff.
    pub png: Vec<u8>,
    /// Percentage of changed pixels (0.00-100.00).
    pub score: f64,
    pub diff_pixels: u64,
    pub total_pixels: u64,
    pub width: u32,
    pub height: u32,
    /// `Some((first_w, first_h, second_w, second_h))` when the inputs differ in size.
    pub dimension_mismatch: Option<(u32, u32, u32, u32)>,
}

impl DiffOutput {
    pub fn is_match(&self) -> bool {
        self.diff_pixels == 0
    }

    /// Unrounded percentage of changed pixels.
    pub fn changed_percentage(&self) -> f64 {
        if self.total_pixels == 0 {
            return 0.0;
        }
        self.diff_pixels as f64 * 100.0 / self.total_pixels as f64
    }

    /// Expose the encoded PNG as a readable stream.
    pub fn into_reader(self) -> impl AsyncRead + Send + Unpin {
        Cursor::new(self.png)
    }
}

/// Run CPU-bound work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, DiffError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DiffError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DiffError::Task(e.to_string()))?
}

/// Read, decode, compare and encode two images.
///
/// Both inputs are read and decoded concurrently. The first failure from
/// any stage is returned and nothing else is produced.
pub async fn output_diff_stream(
    first: impl Into<ImageSource>,
    second: impl Into<ImageSource>,
    options: DiffOptions,
) -> Result<DiffOutput, DiffError> {
    let (first, second) = (first.into(), second.into());
    let (first_name, second_name) = (first.name(), second.name());

    let (first_bytes, second_bytes) = tokio::try_join!(first.read_all(), second.read_all())?;

    let (left, right) = tokio::try_join!(
        blocking(move || codec::decode(&first_name, &first_bytes)),
        blocking(move || codec::decode(&second_name, &second_bytes)),
    )?;
    debug!(
        first = ?left.dimensions(),
        second = ?right.dimensions(),
        "decoded both images"
    );

    let policy = options.dimension_policy;
    blocking(move || {
        let dimension_mismatch = (left.dimensions() != right.dimensions())
            .then(|| (left.width(), left.height(), right.width(), right.height()));
        let diff = pixel::compare(&left, &right, policy)?;
        let (width, height) = diff.image.dimensions();
        let png = codec::encode_png(diff.image)?;
        debug!(
            score = diff.score,
            diff_pixels = diff.diff_pixels,
            total_pixels = diff.total_pixels,
            "diff composited"
        );
        Ok(DiffOutput {
            png,
            score: diff.score,
            diff_pixels: diff.diff_pixels,
            total_pixels: diff.total_pixels,
            width,
            height,
            dimension_mismatch,
        })
    })
    .await
}

/// Like [`output_diff_stream`], then write the PNG to `dest`.
/// Returns the diff score.
pub async fn output_diff(
    first: impl Into<ImageSource>,
    second: impl Into<ImageSource>,
    dest: impl AsRef<Path>,
    options: DiffOptions,
) -> Result<f64, DiffError> {
    let dest = dest.as_ref();
    let output = output_diff_stream(first, second, options).await?;
    write_png(dest, &output.png).await?;
    debug!(path = %dest.display(), score = output.score, "wrote diff image");
    Ok(output.score)
}

/// Write encoded bytes, creating parent directories as needed.
pub async fn write_png(dest: &Path, png: &[u8]) -> Result<(), DiffError> {
    let write_err = |source| DiffError::Write {
        path: dest.to_path_buf(),
        source,
    };
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(dest, png).await.map_err(write_err)
}
