//! CLI for dsfetch.

mod presenter;
mod run;

use anyhow::Result;
use clap::Parser;
use dsfetch_core::config::{self, DsfetchConfig, JobConfig};
use std::path::PathBuf;

/// Download and extract every dataset listed in a manifest.
#[derive(Debug, Parser)]
#[command(name = "dsfetch")]
#[command(about = "dsfetch: bulk dataset downloader and extractor", long_about = None)]
pub struct Cli {
    /// Output directory.
    pub save_dir: PathBuf,

    /// Only fetch the datasets with these names.
    #[arg(long, num_args = 1.., value_name = "NAME")]
    pub whitelist: Vec<String>,

    /// Remove zip files after extraction.
    #[arg(long = "remove_zip", alias = "remove-zip")]
    pub remove_zip: bool,

    /// Download the per-image archives of every dataset.
    #[arg(long = "download_images", alias = "download-images")]
    pub download_images: bool,

    /// Extract downloaded image archives. Not recommended: they share one
    /// directory, so files with the same name overwrite each other.
    #[arg(long = "extract_images", alias = "extract-images")]
    pub extract_images: bool,

    /// Number of datasets processed at once (default: `default_jobs` from config, 8).
    #[arg(
        long = "num_thread",
        alias = "num-thread",
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub num_thread: Option<u32>,

    /// Manifest file (default: datasets.json, or the older bop_all.json,
    /// next to the executable, else in the current directory).
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        run::run_fetch(&cli, &cfg).await
    }

    /// Run options from flags, falling back to config for the job count.
    pub fn job_config(&self, cfg: &DsfetchConfig) -> JobConfig {
        let mut job = JobConfig::new(&self.save_dir);
        if !self.whitelist.is_empty() {
            job.whitelist = Some(self.whitelist.iter().cloned().collect());
        }
        job.remove_zip_after_extract = self.remove_zip;
        job.download_images = self.download_images;
        job.extract_images = self.extract_images;
        job.max_concurrent_jobs = self
            .num_thread
            .map(|n| n as usize)
            .unwrap_or(cfg.default_jobs)
            .max(1);
        job
    }
}
