use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("Argument needs to be a valid read path, stream or buffer (got {0:?})")]
    InvalidInputType(String),

    #[error("failed to read {name}")]
    SourceRead {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {name}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode diff image")]
    Encode(#[source] image::ImageError),

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Images not the same dimension. First: {first_w}x{first_h}. Second: {second_w}x{second_h}."
    )]
    DimensionMismatch {
        first_w: u32,
        first_h: u32,
        second_w: u32,
        second_h: u32,
    },

    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    MalformedBuffer { len: usize, width: u32, height: u32 },

    #[error("diff task failed: {0}")]
    Task(String),
}

impl DiffError {
    /// True for failures of the encode-or-write stage.
    pub fn is_encode_or_write(&self) -> bool {
        matches!(self, Self::Encode(_) | Self::Write { .. })
    }
}
