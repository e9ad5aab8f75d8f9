use std::fmt;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::DiffError;

/// Where an input image comes from.
pub enum ImageSource {
    Path(PathBuf),
    Stream(Box<dyn AsyncRead + Send + Unpin>),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Interpret a command-line argument: `-` is stdin, anything else a path.
    pub fn parse(arg: &str) -> Result<Self, DiffError> {
        match arg.trim() {
            "" => Err(DiffError::InvalidInputType(arg.to_owned())),
            "-" => Ok(Self::Stream(Box::new(tokio::io::stdin()))),
            _ => Ok(Self::Path(PathBuf::from(arg))),
        }
    }

    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Label used in error messages and logs.
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Stream(_) => "<stream>".to_owned(),
            Self::Bytes(_) => "<buffer>".to_owned(),
        }
    }

    /// Drain the source into memory.
    pub async fn read_all(self) -> Result<Vec<u8>, DiffError> {
        let name = self.name();
        let read = match self {
            Self::Path(path) => tokio::fs::read(&path).await,
            Self::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await.map(|_| buf)
            }
            Self::Bytes(bytes) => Ok(bytes),
        };
        let bytes = read.map_err(|source| DiffError::SourceRead {
            name: name.clone(),
            source,
        })?;
        debug!(source = %name, bytes = bytes.len(), "read image source");
        Ok(bytes)
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}
