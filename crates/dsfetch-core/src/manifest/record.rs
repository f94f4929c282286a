//! Wire form of one manifest entry and its validation.

use serde::Deserialize;

use super::{DatasetDescriptor, ImageArchive};
use crate::error::ManifestError;

#[derive(Debug, Deserialize)]
pub(super) struct DatasetRecord {
    dataset_name: String,
    base: String,
    base_url: String,
    model: String,
    model_url: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    image_urls: Vec<String>,
}

fn non_empty(index: usize, field: &'static str, value: String) -> Result<String, ManifestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ManifestError::EmptyField { index, field });
    }
    Ok(trimmed.to_string())
}

impl DatasetRecord {
    pub(super) fn into_descriptor(self, index: usize) -> Result<DatasetDescriptor, ManifestError> {
        let name = non_empty(index, "dataset_name", self.dataset_name)?;
        if self.images.len() != self.image_urls.len() {
            return Err(ManifestError::ImageCountMismatch {
                name,
                images: self.images.len(),
                urls: self.image_urls.len(),
            });
        }
        let images = self
            .images
            .into_iter()
            .zip(self.image_urls)
            .map(|(archive_name, url)| {
                Ok(ImageArchive {
                    archive_name: non_empty(index, "images", archive_name)?,
                    url: non_empty(index, "image_urls", url)?,
                })
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        Ok(DatasetDescriptor {
            name,
            base_archive_name: non_empty(index, "base", self.base)?,
            base_archive_url: non_empty(index, "base_url", self.base_url)?,
            model_archive_name: non_empty(index, "model", self.model)?,
            model_archive_url: non_empty(index, "model_url", self.model_url)?,
            images,
        })
    }
}
