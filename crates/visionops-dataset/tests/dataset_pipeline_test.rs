//! End-to-end tests for split -> manifest -> validate on a real directory tree.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use visionops_dataset::{
    partition, read_manifest, validate, write_manifest, DatasetError, DatasetLayout, IssueKind, PartitionOutcome,
    Split, SplitRatios,
};

/// Helper to create a flat corpus of `n` labeled images.
fn flat_corpus(n: usize) -> TempDir {
    let temp = TempDir::new().unwrap();
    for i in 0..n {
        fs::write(temp.path().join(format!("image_{i}.jpg")), b"").unwrap();
        fs::write(temp.path().join(format!("image_{i}.txt")), "0 0.5 0.5 0.1 0.1\n").unwrap();
    }
    temp
}

fn stems_in(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path().file_stem().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn split_or_panic(outcome: PartitionOutcome) -> visionops_dataset::PartitionSummary {
    match outcome {
        PartitionOutcome::Split(summary) => summary,
        PartitionOutcome::Empty => panic!("expected a split"),
    }
}

#[test]
fn test_split_ten_samples_six_two_two() {
    let corpus = flat_corpus(10);
    let summary = split_or_panic(partition(corpus.path(), SplitRatios::new(0.6, 0.2).unwrap(), 42).unwrap());

    let layout = DatasetLayout::new(corpus.path());
    for split in Split::ALL {
        assert!(layout.images_dir(split).is_dir());
        assert!(layout.labels_dir(split).is_dir());
    }

    assert_eq!(stems_in(&layout.images_dir(Split::Train)).len(), 6);
    assert_eq!(stems_in(&layout.images_dir(Split::Valid)).len(), 2);
    assert_eq!(stems_in(&layout.images_dir(Split::Test)).len(), 2);
    assert_eq!(summary.total, 10);
    assert_eq!(summary.train.labels, 6);

    // Nothing is left at the root.
    let leftovers: Vec<_> = fs::read_dir(corpus.path()).unwrap().filter_map(Result::ok).filter(|e| e.path().is_file()).collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_split_labels_follow_images() {
    let corpus = flat_corpus(9);
    split_or_panic(partition(corpus.path(), SplitRatios::default(), 7).unwrap());

    let layout = DatasetLayout::new(corpus.path());
    let mut all = BTreeSet::new();
    for split in Split::ALL {
        let images = stems_in(&layout.images_dir(split));
        assert_eq!(images, stems_in(&layout.labels_dir(split)));
        for stem in images {
            assert!(all.insert(stem));
        }
    }
    assert_eq!(all.len(), 9);
}

#[test]
fn test_split_same_seed_same_assignment() {
    let a = flat_corpus(25);
    let b = flat_corpus(25);
    let ratios = SplitRatios::new(0.5, 0.3).unwrap();

    let sa = split_or_panic(partition(a.path(), ratios, 1234).unwrap());
    let sb = split_or_panic(partition(b.path(), ratios, 1234).unwrap());
    assert_eq!(sa, sb);

    for split in Split::ALL {
        assert_eq!(
            stems_in(&DatasetLayout::new(a.path()).images_dir(split)),
            stems_in(&DatasetLayout::new(b.path()).images_dir(split))
        );
    }
}

#[test]
fn test_unlabeled_images_move_without_synthetic_labels() {
    let corpus = flat_corpus(4);
    fs::write(corpus.path().join("negative.png"), b"").unwrap();

    let summary = split_or_panic(partition(corpus.path(), SplitRatios::default(), 42).unwrap());
    let labels: usize = Split::ALL.iter().map(|s| summary.split(*s).labels).sum();
    let images: usize = Split::ALL.iter().map(|s| summary.split(*s).images).sum();
    assert_eq!(images, 5);
    assert_eq!(labels, 4);

    let layout = DatasetLayout::new(corpus.path());
    assert!(Split::ALL.iter().all(|s| !layout.labels_dir(*s).join("negative.txt").exists()));

    // The unlabeled image is only a warning.
    let report = validate(corpus.path()).unwrap();
    assert_eq!(report.errors, 0);
    assert_eq!(report.warnings, 1);
}

#[test]
fn test_empty_corpus_is_reported_not_failed() {
    let temp = TempDir::new().unwrap();
    let outcome = partition(temp.path(), SplitRatios::default(), 42).unwrap();
    assert_eq!(outcome, PartitionOutcome::Empty);
    assert!(!DatasetLayout::new(temp.path()).split_dir(Split::Train).exists());
}

#[test]
fn test_manifest_written_for_split_dataset() {
    let corpus = flat_corpus(10);
    partition(corpus.path(), SplitRatios::default(), 42).unwrap();

    let classes = vec!["class1".to_string(), "class2".to_string()];
    let path = write_manifest(corpus.path(), &classes).unwrap();
    let manifest = read_manifest(&path).unwrap();
    assert_eq!(manifest.nc, classes.len());
    assert_eq!(manifest.class_names(), classes);
}

#[test]
fn test_validate_then_break_a_label() {
    let corpus = flat_corpus(10);
    partition(corpus.path(), SplitRatios::new(0.6, 0.2).unwrap(), 42).unwrap();

    let report = validate(corpus.path()).unwrap();
    assert_eq!(report.errors, 0);
    assert_eq!(report.warnings, 0);

    let layout = DatasetLayout::new(corpus.path());
    fs::write(layout.images_dir(Split::Train).join("invalid.jpg"), b"").unwrap();
    fs::write(layout.labels_dir(Split::Train).join("invalid.txt"), "invalid format").unwrap();

    match validate(corpus.path()) {
        Err(DatasetError::Validation { errors, report }) => {
            assert_eq!(errors, 1);
            let issue = report.issues_of(IssueKind::BadLabelLine).next().unwrap();
            assert_eq!(issue.split, Split::Train);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn test_images_sharing_a_stem_are_all_moved() {
    let corpus = flat_corpus(4);
    fs::write(corpus.path().join("image_0.png"), b"").unwrap();

    let summary = split_or_panic(partition(corpus.path(), SplitRatios::new(0.6, 0.2).unwrap(), 42).unwrap());
    assert_eq!(summary.total, 5);

    let images: usize = Split::ALL.iter().map(|s| summary.split(*s).images).sum();
    let labels: usize = Split::ALL.iter().map(|s| summary.split(*s).labels).sum();
    assert_eq!(images, 5);
    assert_eq!(labels, 4);

    let leftovers: Vec<_> = fs::read_dir(corpus.path()).unwrap().filter_map(Result::ok).filter(|e| e.path().is_file()).collect();
    assert!(leftovers.is_empty());
}
