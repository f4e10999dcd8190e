use crate::error::DatasetResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the manifest written at the dataset root.
pub const MANIFEST_FILE_NAME: &str = "yolo.yaml";

/// One of the three dataset partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Valid => "valid",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filesystem layout of a split dataset.
///
/// `<root>/<split>/images`, `<root>/<split>/labels` and `<root>/yolo.yaml`.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn split_dir(&self, split: Split) -> PathBuf {
        self.root.join(split.as_str())
    }

    #[must_use]
    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.split_dir(split).join("images")
    }

    #[must_use]
    pub fn labels_dir(&self, split: Split) -> PathBuf {
        self.split_dir(split).join("labels")
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    /// Path recorded in the manifest for a split. Always relative and
    /// `/`-separated, whatever the host platform.
    #[must_use]
    pub fn manifest_images_path(split: Split) -> String {
        format!("./{}/images", split.as_str())
    }

    pub fn ensure_split_dirs(&self) -> DatasetResult<()> {
        for split in Split::ALL {
            std::fs::create_dir_all(self.images_dir(split))?;
            std::fs::create_dir_all(self.labels_dir(split))?;
        }
        Ok(())
    }
}
