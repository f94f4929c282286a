//! Per-dataset download→extract pipeline.
//!
//! Steps run strictly in order: base archive (extracted flat into the save
//! dir), model archive (extracted into `<save_dir>/<name>/`), then image
//! archives in manifest order. The first fetch or archive-level error ends the
//! dataset; it is reported in the returned `DatasetReport`, never propagated.
//!
//! Image archives of one dataset all extract into the same directory, so a
//! file present in two of them ends up with the content of the later one.

use std::path::Path;

use crate::config::JobConfig;
use crate::error::{DatasetFailed, StepError};
use crate::extractor::{self, ExtractSummary};
use crate::fetcher::{CurlFetcher, FetchOutcome};
use crate::manifest::DatasetDescriptor;
use crate::progress::{EventKind, ProgressEvent, SharedSink, Subject};

/// What one dataset job did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub downloaded: usize,
    pub skipped: usize,
    pub bytes: u64,
    pub archives_extracted: usize,
    pub entries_extracted: usize,
    pub entries_failed: usize,
}

impl DatasetStats {
    fn record_fetch(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Skipped { .. } => self.skipped += 1,
            FetchOutcome::Downloaded { bytes, .. } => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
        }
    }

    fn record_extract(&mut self, summary: &ExtractSummary) {
        self.archives_extracted += 1;
        self.entries_extracted += summary.extracted;
        self.entries_failed += summary.failed;
    }
}

/// Terminal state of one dataset job.
#[derive(Debug)]
pub struct DatasetReport {
    pub name: String,
    pub result: Result<DatasetStats, DatasetFailed>,
}

impl DatasetReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs the full pipeline for `descriptor`. Always returns a report.
pub async fn run_dataset(
    descriptor: &DatasetDescriptor,
    config: &JobConfig,
    fetcher: &CurlFetcher,
    sink: SharedSink,
) -> DatasetReport {
    let subject = Subject::Dataset {
        name: descriptor.name.clone(),
    };
    tracing::info!(dataset = %descriptor.name, "dataset job started");
    sink.emit(ProgressEvent::new(EventKind::Started, subject.clone()));

    let result = match run_steps(descriptor, config, fetcher, &sink).await {
        Ok(stats) => {
            tracing::info!(
                dataset = %descriptor.name,
                downloaded = stats.downloaded,
                skipped = stats.skipped,
                "dataset job done"
            );
            sink.emit(ProgressEvent::new(EventKind::Done, subject));
            Ok(stats)
        }
        Err(cause) => {
            let failed = DatasetFailed {
                name: descriptor.name.clone(),
                cause,
            };
            tracing::warn!("{}", failed);
            sink.emit(
                ProgressEvent::new(EventKind::Failed, subject).with_detail(failed.cause.to_string()),
            );
            Err(failed)
        }
    };

    DatasetReport {
        name: descriptor.name.clone(),
        result,
    }
}

async fn run_steps(
    descriptor: &DatasetDescriptor,
    config: &JobConfig,
    fetcher: &CurlFetcher,
    sink: &SharedSink,
) -> Result<DatasetStats, StepError> {
    let mut stats = DatasetStats::default();
    let save_dir = config.save_dir.as_path();
    let dataset_dir = config.dataset_dir(&descriptor.name);
    let remove = config.remove_zip_after_extract;

    let step = Step {
        fetcher,
        sink,
        remove,
    };

    step.run(
        &mut stats,
        &descriptor.base_archive_url,
        &descriptor.base_archive_name,
        save_dir,
        Some(save_dir),
    )
    .await?;

    step.run(
        &mut stats,
        &descriptor.model_archive_url,
        &descriptor.model_archive_name,
        save_dir,
        Some(&dataset_dir),
    )
    .await?;

    if config.download_images {
        let extract_to = config.extract_images.then_some(dataset_dir.as_path());
        for image in &descriptor.images {
            step.run(
                &mut stats,
                &image.url,
                &image.archive_name,
                &dataset_dir,
                extract_to,
            )
            .await?;
        }
    }

    Ok(stats)
}

/// One fetch, optionally followed by one extraction.
struct Step<'a> {
    fetcher: &'a CurlFetcher,
    sink: &'a SharedSink,
    remove: bool,
}

impl Step<'_> {
    async fn run(
        &self,
        stats: &mut DatasetStats,
        url: &str,
        declared_name: &str,
        fetch_dir: &Path,
        extract_to: Option<&Path>,
    ) -> Result<(), StepError> {
        let outcome = self.fetcher.fetch(url, fetch_dir, self.sink.clone()).await?;
        stats.record_fetch(&outcome);

        let archive = outcome.path();
        if archive.file_name().and_then(|n| n.to_str()) != Some(declared_name) {
            tracing::warn!(
                url,
                declared = declared_name,
                actual = %archive.display(),
                "archive name in manifest differs from URL file name; using the downloaded file"
            );
        }

        if let Some(dest) = extract_to {
            let summary = extractor::extract(archive, dest, self.remove, self.sink.clone()).await?;
            stats.record_extract(&summary);
        }
        Ok(())
    }
}
