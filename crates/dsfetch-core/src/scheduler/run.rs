//! Run every selected dataset job under the concurrency gate.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::JobConfig;
use crate::error::{DatasetFailed, ManifestError, StepError};
use crate::fetcher::CurlFetcher;
use crate::job::{self, DatasetReport};
use crate::manifest::{DatasetDescriptor, ManifestProvider};
use crate::progress::SharedSink;

use super::summary::RunSummary;

/// Applies the whitelist, keeping manifest order. Whitelisted names that match
/// no dataset are logged.
pub fn select_datasets(
    descriptors: Vec<DatasetDescriptor>,
    config: &JobConfig,
) -> Vec<DatasetDescriptor> {
    if let Some(whitelist) = &config.whitelist {
        for name in whitelist {
            if !descriptors.iter().any(|d| &d.name == name) {
                tracing::warn!(dataset = %name, "whitelisted dataset not in manifest");
            }
        }
    }
    descriptors
        .into_iter()
        .filter(|d| config.includes(&d.name))
        .collect()
}

/// Runs one job per selected descriptor and waits for all of them.
/// At most `config.max_concurrent_jobs` job bodies run at once.
pub async fn run_all(
    descriptors: Vec<DatasetDescriptor>,
    config: &JobConfig,
    fetcher: &CurlFetcher,
    sink: SharedSink,
) -> RunSummary {
    let selected = select_datasets(descriptors, config);
    let max_concurrent = config.max_concurrent_jobs.clamp(1, Semaphore::MAX_PERMITS);
    tracing::info!(
        datasets = selected.len(),
        max_concurrent,
        save_dir = %config.save_dir.display(),
        "run started"
    );

    let gate = Arc::new(Semaphore::new(max_concurrent));
    let config = Arc::new(config.clone());
    let mut join_set = JoinSet::new();

    for descriptor in selected {
        let gate = Arc::clone(&gate);
        let config = Arc::clone(&config);
        let fetcher = fetcher.clone();
        let sink = sink.clone();
        join_set.spawn(async move {
            let name = descriptor.name.clone();
            let Ok(_permit) = gate.acquire_owned().await else {
                return task_failed(name, "concurrency gate closed".to_string());
            };
            // Inner task so a panic in one dataset becomes that dataset's report.
            let body = tokio::spawn(async move {
                job::run_dataset(&descriptor, &config, &fetcher, sink).await
            });
            match body.await {
                Ok(report) => report,
                Err(e) => task_failed(name, e.to_string()),
            }
        });
    }

    let mut summary = RunSummary::default();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(report) => summary.reports.push(report),
            // Outer tasks only await the gate and the inner task; they are never aborted.
            Err(e) => tracing::error!("dataset task join: {}", e),
        }
    }

    tracing::info!(
        succeeded = summary.succeeded().count(),
        failed = summary.failed().count(),
        "run finished"
    );
    summary
}

/// Loads descriptors from `provider` and runs them.
pub async fn run_manifest(
    provider: &dyn ManifestProvider,
    config: &JobConfig,
    fetcher: &CurlFetcher,
    sink: SharedSink,
) -> Result<RunSummary, ManifestError> {
    let descriptors = provider.datasets()?;
    Ok(run_all(descriptors, config, fetcher, sink).await)
}

fn task_failed(name: String, reason: String) -> DatasetReport {
    tracing::error!(dataset = %name, "dataset task aborted: {}", reason);
    DatasetReport {
        name: name.clone(),
        result: Err(DatasetFailed {
            name,
            cause: StepError::Task(reason),
        }),
    }
}
