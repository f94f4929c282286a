//! `dsfetch <save_dir>`: load the manifest and process every selected dataset.

use anyhow::{Context, Result};
use dsfetch_core::config::DsfetchConfig;
use dsfetch_core::fetcher::CurlFetcher;
use dsfetch_core::manifest::JsonManifest;
use dsfetch_core::progress::{ChannelSink, SharedSink};
use dsfetch_core::scheduler::{self, RunSummary};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::presenter::Presenter;
use super::Cli;

const MANIFEST_FILE: &str = "datasets.json";
/// Name used by older manifests; still picked up when `datasets.json` is absent.
const LEGACY_MANIFEST_FILE: &str = "bop_all.json";

pub async fn run_fetch(cli: &Cli, cfg: &DsfetchConfig) -> Result<()> {
    let manifest_path = match &cli.manifest {
        Some(path) => path.clone(),
        None => default_manifest_path(),
    };
    let job_cfg = cli.job_config(cfg);
    if job_cfg.extract_images && !job_cfg.download_images {
        tracing::warn!("--extract_images has no effect without --download_images");
    }
    std::fs::create_dir_all(&job_cfg.save_dir)
        .with_context(|| format!("create output directory {}", job_cfg.save_dir.display()))?;
    tracing::info!(
        manifest = %manifest_path.display(),
        save_dir = %job_cfg.save_dir.display(),
        jobs = job_cfg.max_concurrent_jobs,
        "starting run"
    );

    let provider = JsonManifest::new(&manifest_path);
    let fetcher = CurlFetcher::new(cfg.fetch_settings());
    let (sink, progress_rx) = ChannelSink::channel();
    let progress_handle = tokio::spawn(Presenter::new().drain(progress_rx));

    // The channel closes once every job has dropped its sink clone.
    let sink: SharedSink = Arc::new(sink);
    let result = scheduler::run_manifest(&provider, &job_cfg, &fetcher, sink).await;
    let _ = progress_handle.await;

    let summary =
        result.with_context(|| format!("load manifest {}", manifest_path.display()))?;
    print_summary(&summary);
    Ok(())
}

/// First existing manifest: beside the executable, then in the current
/// directory, preferring `datasets.json` over `bop_all.json` in each.
fn default_manifest_path() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let mut dirs: Vec<PathBuf> = exe_dir.into_iter().collect();
    dirs.push(PathBuf::new());
    pick_manifest(&dirs)
}

fn pick_manifest(dirs: &[PathBuf]) -> PathBuf {
    dirs.iter()
        .flat_map(|dir| [dir.join(MANIFEST_FILE), dir.join(LEGACY_MANIFEST_FILE)])
        .find(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from(MANIFEST_FILE))
}

fn print_summary(summary: &RunSummary) {
    let ok = summary.succeeded().count();
    let failed = summary.failed_names();
    if summary.is_empty() {
        println!("No datasets selected.");
        return;
    }
    println!("Finished: {} succeeded, {} failed.", ok, failed.len());
    for report in summary.failed() {
        if let Err(e) = &report.result {
            eprintln!("  {}: {}", report.name, e.cause);
        }
    }
}
