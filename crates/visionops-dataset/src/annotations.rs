//! Unpacking an exported annotation archive into the flat corpus.

use crate::error::{DatasetError, DatasetResult};
use crate::sample::{is_label, list_files};
use std::fs::{self, File};
use std::path::Path;
use walkdir::WalkDir;

/// Scratch directory under the dataset root that the archive is unpacked into.
pub const EXTRACT_STAGING_DIR: &str = ".annotations-extract";

/// Replace the label files in `root` with the ones packed in `archive`.
///
/// Stale `*.txt` files directly under `root` are removed first. Every label
/// file in the archive, at any depth, lands flat in `root` under its file name;
/// other entries are dropped. Returns the number of labels placed.
pub fn extract_annotations(archive: &Path, root: &Path) -> DatasetResult<usize> {
    if !root.is_dir() {
        return Err(DatasetError::MissingRoot(root.to_path_buf()));
    }

    let mut zip = zip::ZipArchive::new(File::open(archive)?)?;

    let stale = list_files(root, is_label)?;
    for path in &stale {
        fs::remove_file(path)?;
    }

    let staging = root.join(EXTRACT_STAGING_DIR);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }

    let placed = zip.extract(&staging).map_err(DatasetError::from).and_then(|()| flatten_labels(&staging, root));
    let cleanup = fs::remove_dir_all(&staging);
    let placed = placed?;
    cleanup?;

    tracing::info!(
        archive = %archive.display(),
        root = %root.display(),
        removed = stale.len(),
        labels = placed,
        "annotations extracted"
    );
    Ok(placed)
}

fn flatten_labels(staging: &Path, root: &Path) -> DatasetResult<usize> {
    let mut placed = 0;
    for entry in WalkDir::new(staging).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_label(entry.path()) {
            continue;
        }
        let to = root.join(entry.file_name());
        fs::rename(entry.path(), &to).map_err(|source| DatasetError::Move {
            from: entry.path().to_path_buf(),
            to: to.clone(),
            source,
        })?;
        placed += 1;
    }
    Ok(placed)
}
