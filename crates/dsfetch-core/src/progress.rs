//! Progress events sent from jobs to a single presentation consumer.
//!
//! Every fetch, extract and dataset step reports through a `ProgressSink`.
//! The CLI wires a `ChannelSink` to one task that owns all display state, so
//! concurrent jobs never share counters.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Started,
    /// Bytes received so far and the server's size hint, if any.
    Progress { done: u64, total: Option<u64> },
    Skipped,
    Done,
    Failed,
}

/// What an event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Dataset { name: String },
    Download { file: String },
    Extract { archive: PathBuf },
    Entry { archive: PathBuf, entry: String },
    Remove { archive: PathBuf },
}

impl Subject {
    pub fn download(file: impl Into<String>) -> Self {
        Subject::Download { file: file.into() }
    }

    pub fn extract(archive: &Path) -> Self {
        Subject::Extract {
            archive: archive.to_path_buf(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Dataset { name } => write!(f, "dataset {}", name),
            Subject::Download { file } => write!(f, "download {}", file),
            Subject::Extract { archive } => write!(f, "extract {}", archive.display()),
            Subject::Entry { archive, entry } => {
                write!(f, "entry {} in {}", entry, archive.display())
            }
            Subject::Remove { archive } => write!(f, "remove {}", archive.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub subject: Subject,
    pub detail: Option<String>,
}

impl ProgressEvent {
    pub fn new(kind: EventKind, subject: Subject) -> Self {
        Self {
            kind,
            subject,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Shared handle passed into jobs and blocking transfer threads.
pub type SharedSink = Arc<dyn ProgressSink>;

/// Forwards events to an unbounded channel. Sending never blocks, so it is
/// safe from curl callbacks on blocking threads.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end for the presentation consumer.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        // Receiver gone means nobody is displaying; the run continues.
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Fraction complete in [0.0, 1.0], or None when the total is unknown.
pub fn fraction(done: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(0) => Some(1.0),
        Some(t) => Some((done as f64 / t as f64).min(1.0)),
        None => None,
    }
}
