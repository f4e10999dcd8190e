use crate::error::{DatasetError, DatasetResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
pub const LABEL_EXTENSION: &str = "txt";

/// An image and its optional label file, identified by their shared stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub stem: String,
    pub image: PathBuf,
    pub label: Option<PathBuf>,
}

impl Sample {
    #[must_use]
    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }

    /// File name of the image, used as the sort key before shuffling.
    #[must_use]
    pub fn image_name(&self) -> String {
        self.image.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

#[must_use]
pub fn is_image(path: &Path) -> bool {
    has_extension(path, &IMAGE_EXTENSIONS)
}

#[must_use]
pub fn is_label(path: &Path) -> bool {
    has_extension(path, &[LABEL_EXTENSION])
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_lowercase();
    allowed.iter().any(|a| *a == ext)
}

#[must_use]
pub fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Regular files directly inside `dir` accepted by `keep`, sorted by name.
pub fn list_files<F>(dir: &Path, keep: F) -> DatasetResult<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if keep(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Find every sample directly under `root` (split subfolders are not entered).
pub fn discover_samples(root: &Path) -> DatasetResult<Vec<Sample>> {
    if !root.is_dir() {
        return Err(DatasetError::MissingRoot(root.to_path_buf()));
    }

    let samples = list_files(root, is_image)?
        .into_iter()
        .map(|image| {
            let stem = file_stem(&image);
            let label = root.join(format!("{stem}.{LABEL_EXTENSION}"));
            let label = label.is_file().then_some(label);
            Sample { stem, image, label }
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        root = %root.display(),
        samples = samples.len(),
        labeled = samples.iter().filter(|s| s.is_labeled()).count(),
        "discovered samples"
    );
    Ok(samples)
}

/// Whether annotations have been exported next to the images.
///
/// True when the root holds no images at all, or at least one label file.
/// False means images exist but not a single label does.
pub fn annotations_present(root: &Path) -> DatasetResult<bool> {
    if !root.is_dir() {
        return Err(DatasetError::MissingRoot(root.to_path_buf()));
    }
    let images = list_files(root, is_image)?;
    if images.is_empty() {
        return Ok(true);
    }
    let labels = list_files(root, is_label)?;
    if labels.is_empty() {
        tracing::warn!(root = %root.display(), images = images.len(), "no annotation files found next to images");
        return Ok(false);
    }
    Ok(true)
}
