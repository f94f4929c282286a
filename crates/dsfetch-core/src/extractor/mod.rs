//! Zip extraction.
//!
//! Members are extracted in container order. A member that cannot be
//! extracted is reported and skipped; only failing to open the archive itself
//! is an error. Optional removal of the archive happens after the pass.

mod entry;

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, StepError};
use crate::progress::{EventKind, ProgressEvent, ProgressSink, SharedSink, Subject};

pub use entry::EntryOutcome;

/// Counts for one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub entries: usize,
    pub extracted: usize,
    pub failed: usize,
}

/// Extracts every member of `archive_path` into `dest_dir`, creating it if needed.
/// Blocks the current thread.
pub fn extract_blocking(
    archive_path: &Path,
    dest_dir: &Path,
    sink: &dyn ProgressSink,
) -> Result<ExtractSummary, ExtractError> {
    let subject = Subject::extract(archive_path);
    let file = File::open(archive_path).map_err(|source| ExtractError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| ExtractError::Archive {
        path: archive_path.to_path_buf(),
        source,
    })?;
    fs::create_dir_all(dest_dir).map_err(|source| ExtractError::Destination {
        path: dest_dir.to_path_buf(),
        source,
    })?;

    let total = archive.len();
    tracing::info!(
        archive = %archive_path.display(),
        dest = %dest_dir.display(),
        entries = total,
        "extracting"
    );
    sink.emit(ProgressEvent::new(EventKind::Started, subject.clone()));

    let mut summary = ExtractSummary {
        entries: total,
        ..ExtractSummary::default()
    };
    for index in 0..total {
        match entry::extract_entry(&mut archive, index, dest_dir) {
            Ok(_) => summary.extracted += 1,
            Err(e) => {
                summary.failed += 1;
                let entry = e.entry().to_string();
                tracing::warn!(archive = %archive_path.display(), "skipping entry: {}", e);
                sink.emit(
                    ProgressEvent::new(
                        EventKind::Failed,
                        Subject::Entry {
                            archive: archive_path.to_path_buf(),
                            entry,
                        },
                    )
                    .with_detail(e.to_string()),
                );
            }
        }
        sink.emit(ProgressEvent::new(
            EventKind::Progress {
                done: index as u64 + 1,
                total: Some(total as u64),
            },
            subject.clone(),
        ));
    }

    tracing::info!(
        archive = %archive_path.display(),
        extracted = summary.extracted,
        failed = summary.failed,
        "extraction finished"
    );
    sink.emit(
        ProgressEvent::new(EventKind::Done, subject)
            .with_detail(format!("{} of {} entries", summary.extracted, total)),
    );
    Ok(summary)
}

/// Deletes an extracted archive. Returns false (after reporting) on failure.
pub fn remove_archive(archive_path: &Path, sink: &dyn ProgressSink) -> bool {
    let subject = Subject::Remove {
        archive: archive_path.to_path_buf(),
    };
    match fs::remove_file(archive_path) {
        Ok(()) => {
            tracing::debug!(archive = %archive_path.display(), "removed archive");
            sink.emit(ProgressEvent::new(EventKind::Done, subject));
            true
        }
        Err(e) => {
            tracing::warn!(archive = %archive_path.display(), "could not remove archive: {}", e);
            sink.emit(ProgressEvent::new(EventKind::Failed, subject).with_detail(e.to_string()));
            false
        }
    }
}

/// Extracts on the blocking pool, then removes the archive when `remove_after` is set.
pub async fn extract(
    archive_path: &Path,
    dest_dir: &Path,
    remove_after: bool,
    sink: SharedSink,
) -> Result<ExtractSummary, StepError> {
    let archive: PathBuf = archive_path.to_path_buf();
    let dest: PathBuf = dest_dir.to_path_buf();
    let summary = tokio::task::spawn_blocking(move || {
        let summary = extract_blocking(&archive, &dest, sink.as_ref())?;
        if remove_after {
            remove_archive(&archive, sink.as_ref());
        }
        Ok::<_, ExtractError>(summary)
    })
    .await
    .map_err(|e| ExtractError::Task {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    })??;
    Ok(summary)
}
