//! Deterministic train/valid/test partitioning of a flat corpus.

use crate::error::{DatasetError, DatasetResult};
use crate::layout::{DatasetLayout, Split};
use crate::sample::{discover_samples, Sample};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SEED: u64 = 42;

/// Target proportions. Whatever `train` and `valid` leave goes to `test`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitRatios {
    pub train: f64,
    pub valid: f64,
}

impl SplitRatios {
    pub fn new(train: f64, valid: f64) -> DatasetResult<Self> {
        for (name, value) in [("train", train), ("valid", valid)] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(DatasetError::InvalidRatio(format!("{name} ratio must be in (0, 1), got {value}")));
            }
        }
        if train + valid > 1.0 {
            return Err(DatasetError::InvalidRatio(format!(
                "train + valid must be <= 1, got {}",
                train + valid
            )));
        }
        Ok(Self { train, valid })
    }

    #[must_use]
    pub fn test(&self) -> f64 {
        (1.0 - self.train - self.valid).max(0.0)
    }

    /// `(n_train, n_valid, n_test)` for `n` samples. Rounding error always
    /// lands in test.
    #[must_use]
    pub fn counts(&self, n: usize) -> (usize, usize, usize) {
        let n_train = ((n as f64) * self.train).floor() as usize;
        let n_train = n_train.min(n);
        let n_valid = ((n as f64) * self.valid).floor() as usize;
        let n_valid = n_valid.min(n - n_train);
        (n_train, n_valid, n - n_train - n_valid)
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self { train: 0.6, valid: 0.2 }
    }
}

/// Assignment of samples to splits, computed without touching the disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionPlan {
    pub train: Vec<Sample>,
    pub valid: Vec<Sample>,
    pub test: Vec<Sample>,
}

impl PartitionPlan {
    #[must_use]
    pub fn samples(&self, split: Split) -> &[Sample] {
        match split {
            Split::Train => &self.train,
            Split::Valid => &self.valid,
            Split::Test => &self.test,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shuffle `samples` with `seed` and cut them into train, valid and test.
///
/// Samples are sorted by image file name first so the result depends only on
/// the set of samples and the seed, not on directory listing order.
#[must_use]
pub fn plan_partition(mut samples: Vec<Sample>, ratios: SplitRatios, seed: u64) -> PartitionPlan {
    samples.sort_by_cached_key(Sample::image_name);
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let (n_train, n_valid, _) = ratios.counts(samples.len());
    let test = samples.split_off(n_train + n_valid);
    let valid = samples.split_off(n_train);
    PartitionPlan { train: samples, valid, test }
}

/// Per-split result of a partition run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    pub images: usize,
    pub labels: usize,
    pub stems: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub total: usize,
    pub train: SplitSummary,
    pub valid: SplitSummary,
    pub test: SplitSummary,
}

impl PartitionSummary {
    #[must_use]
    pub fn split(&self, split: Split) -> &SplitSummary {
        match split {
            Split::Train => &self.train,
            Split::Valid => &self.valid,
            Split::Test => &self.test,
        }
    }

    fn split_mut(&mut self, split: Split) -> &mut SplitSummary {
        match split {
            Split::Train => &mut self.train,
            Split::Valid => &mut self.valid,
            Split::Test => &mut self.test,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartitionOutcome {
    /// No samples were found under the root; nothing was moved.
    Empty,
    Split(PartitionSummary),
}

/// Split the flat corpus under `root` into `<split>/images` and `<split>/labels`.
///
/// Must run once per corpus: moved samples are no longer found at the root.
pub fn partition(root: &Path, ratios: SplitRatios, seed: u64) -> DatasetResult<PartitionOutcome> {
    let samples = discover_samples(root)?;
    if samples.is_empty() {
        tracing::warn!(root = %root.display(), "no images found in the dataset, nothing to split");
        return Ok(PartitionOutcome::Empty);
    }

    let total = samples.len();
    tracing::info!(root = %root.display(), total, seed, "splitting dataset");
    let plan = plan_partition(samples, ratios, seed);
    let summary = apply_plan(root, &plan)?;

    tracing::info!(
        train = summary.train.images,
        valid = summary.valid.images,
        test = summary.test.images,
        "dataset split complete"
    );
    Ok(PartitionOutcome::Split(summary))
}

/// Move every planned sample into its split directories.
pub fn apply_plan(root: &Path, plan: &PartitionPlan) -> DatasetResult<PartitionSummary> {
    let layout = DatasetLayout::new(root);
    layout.ensure_split_dirs()?;

    let mut summary = PartitionSummary { total: plan.len(), ..PartitionSummary::default() };
    for split in Split::ALL {
        let images_dir = layout.images_dir(split);
        let labels_dir = layout.labels_dir(split);
        let entry = summary.split_mut(split);

        for sample in plan.samples(split) {
            // Images sharing a stem share one label file; only the first one to move takes it.
            if let Some(label) = sample.label.as_deref().filter(|l| l.is_file()) {
                move_into(label, &labels_dir)?;
                entry.labels += 1;
            }
            move_into(&sample.image, &images_dir)?;
            entry.images += 1;
            entry.stems.push(sample.stem.clone());
        }
        tracing::debug!(split = %split, images = entry.images, labels = entry.labels, "moved split files");
    }
    Ok(summary)
}

fn move_into(file: &Path, dir: &Path) -> DatasetResult<PathBuf> {
    let name = file.file_name().ok_or_else(|| DatasetError::Move {
        from: file.to_path_buf(),
        to: dir.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
    })?;
    let target = dir.join(name);
    std::fs::rename(file, &target).map_err(|source| DatasetError::Move {
        from: file.to_path_buf(),
        to: target.clone(),
        source,
    })?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample {
                stem: format!("image_{i:03}"),
                image: PathBuf::from(format!("image_{i:03}.jpg")),
                label: Some(PathBuf::from(format!("image_{i:03}.txt"))),
            })
            .collect()
    }

    #[test]
    fn test_ratio_validation() {
        assert!(SplitRatios::new(0.6, 0.2).is_ok());
        assert!(SplitRatios::new(0.0, 0.2).is_err());
        assert!(SplitRatios::new(0.6, 1.0).is_err());
        assert!(SplitRatios::new(0.7, 0.4).is_err());
        assert!(SplitRatios::new(f64::NAN, 0.1).is_err());
    }

    #[test]
    fn test_counts_floor_and_remainder() {
        let ratios = SplitRatios::new(0.6, 0.2).unwrap();
        assert_eq!(ratios.counts(10), (6, 2, 2));
        assert_eq!(ratios.counts(7), (4, 1, 2));
        assert_eq!(ratios.counts(1), (0, 0, 1));
        assert_eq!(ratios.counts(0), (0, 0, 0));
    }

    #[test]
    fn test_plan_is_total_and_disjoint() {
        for n in [0, 1, 2, 5, 13, 100] {
            let plan = plan_partition(samples(n), SplitRatios::new(0.7, 0.15).unwrap(), 3);
            assert_eq!(plan.len(), n);

            let mut seen = HashSet::new();
            for split in Split::ALL {
                for s in plan.samples(split) {
                    assert!(seen.insert(s.stem.clone()), "{} assigned twice", s.stem);
                }
            }
            assert_eq!(seen.len(), n);
        }
    }

    #[test]
    fn test_plan_is_deterministic_for_seed() {
        let ratios = SplitRatios::default();
        let a = plan_partition(samples(50), ratios, 42);
        let mut reversed = samples(50);
        reversed.reverse();
        let b = plan_partition(reversed, ratios, 42);
        assert_eq!(a, b);

        let c = plan_partition(samples(50), ratios, 43);
        assert_ne!(a, c);
    }

    #[test]
    fn test_test_ratio_is_remainder() {
        assert!((SplitRatios::default().test() - 0.2).abs() < 1e-9);
        assert!((SplitRatios::new(0.7, 0.3).unwrap().test()).abs() < 1e-9);
    }
}
