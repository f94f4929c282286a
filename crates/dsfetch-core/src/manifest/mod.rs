//! Dataset manifest: descriptors and where they come from.
//!
//! The on-disk form is a JSON array; each record names a dataset and its
//! base, model and image archives. Records are validated once at load time.

mod record;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ManifestError;

/// One per-image archive of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArchive {
    pub archive_name: String,
    pub url: String,
}

/// Everything needed to fetch one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    pub name: String,
    pub base_archive_name: String,
    pub base_archive_url: String,
    pub model_archive_name: String,
    pub model_archive_url: String,
    /// In manifest order; processed in this order.
    pub images: Vec<ImageArchive>,
}

impl DatasetDescriptor {
    pub fn new(
        name: impl Into<String>,
        (base_archive_name, base_archive_url): (impl Into<String>, impl Into<String>),
        (model_archive_name, model_archive_url): (impl Into<String>, impl Into<String>),
    ) -> Self {
        Self {
            name: name.into(),
            base_archive_name: base_archive_name.into(),
            base_archive_url: base_archive_url.into(),
            model_archive_name: model_archive_name.into(),
            model_archive_url: model_archive_url.into(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, archive_name: impl Into<String>, url: impl Into<String>) -> Self {
        self.images.push(ImageArchive {
            archive_name: archive_name.into(),
            url: url.into(),
        });
        self
    }
}

/// Source of dataset descriptors for a run.
pub trait ManifestProvider {
    fn datasets(&self) -> Result<Vec<DatasetDescriptor>, ManifestError>;
}

/// Manifest read from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonManifest {
    path: PathBuf,
}

impl JsonManifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestProvider for JsonManifest {
    fn datasets(&self) -> Result<Vec<DatasetDescriptor>, ManifestError> {
        let data = fs::read_to_string(&self.path).map_err(|source| ManifestError::Read {
            path: self.path.clone(),
            source,
        })?;
        let datasets = parse_manifest(&data)?;
        tracing::debug!(
            path = %self.path.display(),
            count = datasets.len(),
            "loaded manifest"
        );
        Ok(datasets)
    }
}

impl ManifestProvider for Vec<DatasetDescriptor> {
    fn datasets(&self) -> Result<Vec<DatasetDescriptor>, ManifestError> {
        Ok(self.clone())
    }
}

/// Parses and validates a JSON manifest document.
pub fn parse_manifest(json: &str) -> Result<Vec<DatasetDescriptor>, ManifestError> {
    let records: Vec<record::DatasetRecord> = serde_json::from_str(json)?;
    let mut seen = HashSet::new();
    let mut datasets = Vec::with_capacity(records.len());
    for (index, rec) in records.into_iter().enumerate() {
        let descriptor = rec.into_descriptor(index)?;
        if !seen.insert(descriptor.name.clone()) {
            return Err(ManifestError::Duplicate {
                name: descriptor.name,
            });
        }
        datasets.push(descriptor);
    }
    Ok(datasets)
}
