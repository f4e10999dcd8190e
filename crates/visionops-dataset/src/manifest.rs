//! Dataset manifest consumed by the training step.

use crate::error::{DatasetError, DatasetResult};
use crate::layout::{DatasetLayout, Split};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Split locations and the class index to name mapping.
///
/// Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub test: String,
    pub train: String,
    pub val: String,
    pub nc: usize,
    pub names: BTreeMap<usize, String>,
}

impl Manifest {
    /// Build a manifest for the standard split layout. `class_names[i]` names
    /// class index `i`.
    #[must_use]
    pub fn new(class_names: &[String]) -> Self {
        Self {
            test: DatasetLayout::manifest_images_path(Split::Test),
            train: DatasetLayout::manifest_images_path(Split::Train),
            val: DatasetLayout::manifest_images_path(Split::Valid),
            nc: class_names.len(),
            names: class_names.iter().cloned().enumerate().collect(),
        }
    }

    /// Class names in index order.
    #[must_use]
    pub fn class_names(&self) -> Vec<String> {
        self.names.values().cloned().collect()
    }

    fn check(&self, path: &Path) -> DatasetResult<()> {
        let invalid = |message: String| DatasetError::Manifest { path: path.to_path_buf(), message };

        if self.nc != self.names.len() {
            return Err(invalid(format!("nc is {} but {} class names are listed", self.nc, self.names.len())));
        }
        if let Some((expected, found)) = self.names.keys().enumerate().find(|(i, k)| i != *k) {
            return Err(invalid(format!("class indices must be dense from 0, expected {expected} found {found}")));
        }
        Ok(())
    }
}

/// Write `yolo.yaml` at the dataset root and return its path.
pub fn write_manifest(dataset_root: &Path, class_names: &[String]) -> DatasetResult<PathBuf> {
    let layout = DatasetLayout::new(dataset_root);
    let path = layout.manifest_path();
    let manifest = Manifest::new(class_names);

    tracing::info!(path = %path.display(), classes = manifest.nc, "writing dataset manifest");
    let yaml = serde_yaml::to_string(&manifest)?;
    std::fs::write(&path, yaml)?;
    Ok(path)
}

/// Read a manifest back, checking `nc` against the listed names.
pub fn read_manifest(path: &Path) -> DatasetResult<Manifest> {
    let content = std::fs::read_to_string(path)?;
    let manifest: Manifest = serde_yaml::from_str(&content)
        .map_err(|e| DatasetError::Manifest { path: path.to_path_buf(), message: e.to_string() })?;
    manifest.check(path)?;
    Ok(manifest)
}
