use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Global settings loaded from `~/.config/dsfetch/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct DsfetchConfig {
    /// Dataset jobs allowed to run at once when `--num_thread` is not given.
    pub default_jobs: usize,
    /// User-Agent sent with every GET.
    pub user_agent: String,
    /// Maximum redirects followed per request.
    pub max_redirects: u32,
    /// Bytes between two progress events for one download.
    pub progress_step_bytes: u64,
    /// Static request headers (e.g. an access token some mirrors require).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for DsfetchConfig {
    fn default() -> Self {
        Self {
            default_jobs: 8,
            user_agent: "Mozilla/5.0".to_string(),
            max_redirects: 10,
            progress_step_bytes: 1024 * 1024,
            headers: BTreeMap::new(),
        }
    }
}

impl DsfetchConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            user_agent: self.user_agent.clone(),
            max_redirects: self.max_redirects,
            progress_step_bytes: self.progress_step_bytes.max(1),
            headers: self.headers.clone(),
        }
    }
}

/// Per-request settings handed to the fetcher.
#[derive(Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub max_redirects: u32,
    pub progress_step_bytes: u64,
    pub headers: BTreeMap<String, String>,
}

/// Header names with their values masked; values often carry tokens.
struct RedactedHeaders<'a>(&'a BTreeMap<String, String>);

impl fmt::Debug for RedactedHeaders<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|name| (name, "<redacted>")))
            .finish()
    }
}

impl fmt::Debug for DsfetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DsfetchConfig")
            .field("default_jobs", &self.default_jobs)
            .field("user_agent", &self.user_agent)
            .field("max_redirects", &self.max_redirects)
            .field("progress_step_bytes", &self.progress_step_bytes)
            .field("headers", &RedactedHeaders(&self.headers))
            .finish()
    }
}

impl fmt::Debug for FetchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchSettings")
            .field("user_agent", &self.user_agent)
            .field("max_redirects", &self.max_redirects)
            .field("progress_step_bytes", &self.progress_step_bytes)
            .field("headers", &RedactedHeaders(&self.headers))
            .finish()
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        DsfetchConfig::default().fetch_settings()
    }
}

/// Options for one run over a manifest.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Root output directory.
    pub save_dir: PathBuf,
    /// Dataset names to include; `None` runs every dataset.
    pub whitelist: Option<BTreeSet<String>>,
    /// Delete each archive once its extraction pass finishes.
    pub remove_zip_after_extract: bool,
    pub download_images: bool,
    /// Only meaningful together with `download_images`.
    pub extract_images: bool,
    pub max_concurrent_jobs: usize,
}

impl JobConfig {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            whitelist: None,
            remove_zip_after_extract: false,
            download_images: false,
            extract_images: false,
            max_concurrent_jobs: DsfetchConfig::default().default_jobs,
        }
    }

    /// Whether the dataset called `name` passes the whitelist.
    pub fn includes(&self, name: &str) -> bool {
        self.whitelist
            .as_ref()
            .map_or(true, |names| names.contains(name))
    }

    pub fn dataset_dir(&self, name: &str) -> PathBuf {
        self.save_dir.join(name)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dsfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DsfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DsfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: DsfetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
