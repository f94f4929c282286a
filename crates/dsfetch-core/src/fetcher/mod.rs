//! Single-URL fetcher.
//!
//! Computes the local name from the URL path, skips the request when that
//! file already exists, and otherwise streams the body to disk through a
//! `.part` file. The existence check is the whole idempotence story: there is
//! no download registry.

mod filename;
mod transfer;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::FetchSettings;
use crate::error::{FetchError, StepError};
use crate::progress::{EventKind, ProgressEvent, ProgressSink, SharedSink, Subject};

pub use filename::archive_file_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The destination already existed; no request was made.
    Skipped { path: PathBuf },
    Downloaded { path: PathBuf, bytes: u64 },
}

impl FetchOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FetchOutcome::Skipped { path } | FetchOutcome::Downloaded { path, .. } => path,
        }
    }
}

/// libcurl-backed fetcher. Cheap to clone; clones share settings.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    settings: Arc<FetchSettings>,
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self::new(FetchSettings::default())
    }
}

impl CurlFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetches `url` into `dest_dir`, blocking the current thread.
    pub fn fetch_blocking(
        &self,
        url: &str,
        dest_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutcome, FetchError> {
        let file_name = archive_file_name(url).ok_or_else(|| FetchError::NoFileName {
            url: url.to_string(),
        })?;
        let path = dest_dir.join(&file_name);
        let subject = Subject::download(file_name.as_str());

        if path.exists() {
            tracing::debug!(path = %path.display(), "file exists, skipping download");
            sink.emit(
                ProgressEvent::new(EventKind::Skipped, subject).with_detail("file exists"),
            );
            return Ok(FetchOutcome::Skipped { path });
        }

        fs::create_dir_all(dest_dir).map_err(|source| FetchError::Io {
            url: url.to_string(),
            path: dest_dir.to_path_buf(),
            source,
        })?;

        tracing::info!(url, path = %path.display(), "downloading");
        sink.emit(ProgressEvent::new(EventKind::Started, subject.clone()).with_detail(url));

        match transfer::download_to(url, &path, &self.settings, sink, &file_name) {
            Ok(bytes) => {
                tracing::info!(path = %path.display(), bytes, "download complete");
                sink.emit(
                    ProgressEvent::new(EventKind::Done, subject).with_detail(format!("{} bytes", bytes)),
                );
                Ok(FetchOutcome::Downloaded { path, bytes })
            }
            Err(e) => {
                tracing::warn!("{}", e);
                sink.emit(ProgressEvent::new(EventKind::Failed, subject).with_detail(e.to_string()));
                Err(e)
            }
        }
    }

    /// Runs `fetch_blocking` on the blocking pool so async workers stay free.
    pub async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        sink: SharedSink,
    ) -> Result<FetchOutcome, StepError> {
        let fetcher = self.clone();
        let url = url.to_string();
        let dest_dir = dest_dir.to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || {
            fetcher.fetch_blocking(&url, &dest_dir, sink.as_ref())
        })
        .await
        .map_err(|e| StepError::Task(e.to_string()))??;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;

    #[test]
    fn existing_file_is_skipped_without_network() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lm_base.zip"), b"already here").unwrap();
        // Port 9 (discard) is never contacted because the file exists.
        let outcome = CurlFetcher::default()
            .fetch_blocking("http://127.0.0.1:9/lm_base.zip", dir.path(), &NullSink)
            .unwrap();
        assert_eq!(
            outcome,
            FetchOutcome::Skipped {
                path: dir.path().join("lm_base.zip")
            }
        );
    }

    #[test]
    fn url_without_file_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = CurlFetcher::default()
            .fetch_blocking("http://127.0.0.1:9/", dir.path(), &NullSink)
            .unwrap_err();
        assert!(matches!(err, FetchError::NoFileName { .. }));
        assert_eq!(err.url(), "http://127.0.0.1:9/");
    }
}
