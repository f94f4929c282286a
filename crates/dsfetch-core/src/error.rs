//! Error taxonomy for fetch, extract, dataset and manifest failures.
//!
//! Only `ManifestError` is fatal to a run. Fetch and archive-level extract
//! errors end one dataset (`DatasetFailed`); entry errors end one entry.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure retrieving one URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL has no final path segment usable as a file name.
    #[error("{url}: cannot derive a file name from the URL path")]
    NoFileName { url: String },
    /// libcurl reported a transport error (DNS, connect, reset, ...).
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
    /// Server answered with a non-2xx status.
    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u32 },
    /// Local file could not be created, written, or renamed.
    #[error("GET {url}: {path}: {source}")]
    Io {
        url: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::NoFileName { url }
            | FetchError::Transport { url, .. }
            | FetchError::Http { url, .. }
            | FetchError::Io { url, .. } => url,
        }
    }
}

/// One archive member could not be extracted. Never fails the archive.
#[derive(Debug, Error)]
pub enum ExtractEntryError {
    #[error("entry {entry:?} escapes the destination directory")]
    UnsafePath { entry: String },
    #[error("entry {entry} unreadable: {source}")]
    Unreadable {
        /// `#<index>`; the member name is not readable.
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("entry {entry:?}: {source}")]
    Io {
        entry: String,
        #[source]
        source: io::Error,
    },
}

impl ExtractEntryError {
    /// Member name, or `#<index>` when the header itself could not be read.
    pub fn entry(&self) -> &str {
        match self {
            ExtractEntryError::UnsafePath { entry }
            | ExtractEntryError::Unreadable { entry, .. }
            | ExtractEntryError::Io { entry, .. } => entry,
        }
    }
}

/// The archive as a whole could not be processed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a readable zip archive: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("create {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("extraction task for {} did not complete: {reason}", path.display())]
    Task { path: PathBuf, reason: String },
}

/// The step that ended a dataset job early.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("download task did not complete: {0}")]
    Task(String),
}

/// A dataset job stopped before finishing its pipeline.
#[derive(Debug, Error)]
#[error("dataset {name} failed: {cause}")]
pub struct DatasetFailed {
    pub name: String,
    #[source]
    pub cause: StepError,
}

/// Manifest could not be read or failed validation.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("dataset #{index}: field `{field}` is empty")]
    EmptyField { index: usize, field: &'static str },
    #[error("dataset {name}: {images} image names but {urls} image URLs")]
    ImageCountMismatch {
        name: String,
        images: usize,
        urls: usize,
    },
    #[error("dataset {name} appears more than once")]
    Duplicate { name: String },
}
