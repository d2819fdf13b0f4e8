use std::path::PathBuf;
use std::time::Duration;

use symphonia::core::errors::Error as SymphoniaError;

/// Failure to enumerate the dataset root. Fatal to the whole pipeline.
#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
    #[error("Access denied: {0}")]
    AccessDenied(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("I/O error while reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DiscoveryError {
    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::PathNotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied(path),
            _ => Self::Io { path, source },
        }
    }
}

/// Failure of one extraction strategy on one file.
///
/// These never leave the extractor: they are rendered into `FileRecord::error`.
#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("Symphonia error: {0}")]
    Symphonia(#[from] SymphoniaError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No compatible audio track found")]
    NoTrack,
    #[error("Sample rate missing from stream parameters")]
    MissingSampleRate,
    #[error("Frame count missing from stream parameters")]
    MissingFrameCount,
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
    #[error("Stream contains no audio frames")]
    EmptyStream,
    #[error("Decoding exceeded the {0:?} timeout")]
    Timeout(Duration),
    #[error("Decoder panicked: {0}")]
    Panicked(String),
}

#[derive(thiserror::Error, Debug)]
pub enum TaxonomyError {
    #[error("Cannot open taxonomy table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed taxonomy table: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("Writing csv Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Writing json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("File discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("Saving results to {path} failed: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: SaveError,
    },
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}
