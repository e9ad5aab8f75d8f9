//! Pixel-level image comparison for visual regression testing.
//!
//! Two images are compared quad by quad. Changed pixels are painted red on
//! top of the candidate's color, unchanged pixels fade toward gray, and the
//! share of changed pixels is reported as a percentage.

use serde::{Deserialize, Serialize};

mod codec;
mod error;
mod pipeline;
mod pixel;
mod source;

pub use self::codec::{decode, encode_png};
pub use self::error::DiffError;
pub use self::pipeline::{DiffOutput, output_diff, output_diff_stream, write_png};
pub use self::pixel::{
    DiffCounts, PixelBuffer, PixelDiff, compare, compare_buffers, desaturate, diff_score, redden,
};
pub use self::source::ImageSource;

/// How to treat inputs whose width/height differ.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DimensionPolicy {
    /// Compare raw buffers by length; the larger image bounds the output.
    #[default]
    Lenient,
    /// Refuse to compare images of different dimensions.
    Strict,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiffOptions {
    pub dimension_policy: DimensionPolicy,
}
