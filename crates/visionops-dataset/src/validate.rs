//! Structural and label-format validation of a split dataset.

use crate::error::{DatasetError, DatasetResult};
use crate::layout::{DatasetLayout, Split};
use crate::sample::{file_stem, is_image, is_label, list_files};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Fields per label line: class index and four normalized box coordinates.
pub const LABEL_FIELDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// `images/` or `labels/` is missing for a split.
    MissingDirectory,
    /// An image has no label file. Legitimate for negative samples.
    MissingLabel,
    /// A label line does not have exactly five fields.
    BadLabelLine,
}

impl IssueKind {
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::MissingDirectory | Self::BadLabelLine => Severity::Error,
            Self::MissingLabel => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub split: Split,
    pub kind: IssueKind,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: usize,
    pub warnings: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }

    fn push(&mut self, issue: ValidationIssue) {
        match issue.kind.severity() {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.issues.push(issue);
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

/// First offending line of a label file, as `(line_number, field_count)`.
///
/// Blank lines are skipped; an empty file is a valid "no objects" label.
pub fn check_label_file(path: &Path) -> DatasetResult<Option<(usize, usize)>> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = line.split_whitespace().count();
        if fields != LABEL_FIELDS {
            return Ok(Some((idx + 1, fields)));
        }
    }
    Ok(None)
}

/// Collect every issue in the dataset without failing on errors.
pub fn inspect(dataset_root: &Path) -> DatasetResult<ValidationReport> {
    let layout = DatasetLayout::new(dataset_root);
    let mut report = ValidationReport::default();

    for split in Split::ALL {
        let images_dir = layout.images_dir(split);
        let labels_dir = layout.labels_dir(split);

        let missing: Vec<&PathBuf> = [&images_dir, &labels_dir].into_iter().filter(|d| !d.is_dir()).collect();
        if let Some(dir) = missing.first() {
            tracing::error!(split = %split, dir = %dir.display(), "images or labels folder not found");
            report.push(ValidationIssue {
                split,
                kind: IssueKind::MissingDirectory,
                path: (*dir).clone(),
                line: None,
                message: format!("images or labels folder not found for {split} split"),
            });
            continue;
        }

        let images = list_files(&images_dir, is_image)?;
        let labels = list_files(&labels_dir, is_label)?;
        let label_stems: BTreeSet<String> = labels.iter().map(|p| file_stem(p)).collect();

        let unlabeled: Vec<&PathBuf> = images.iter().filter(|img| !label_stems.contains(&file_stem(img))).collect();
        if !unlabeled.is_empty() {
            tracing::warn!(split = %split, count = unlabeled.len(), "images are missing label files");
        }
        for image in unlabeled {
            report.push(ValidationIssue {
                split,
                kind: IssueKind::MissingLabel,
                path: image.clone(),
                line: None,
                message: format!("no label file for {}", file_stem(image)),
            });
        }

        for label in &labels {
            if let Some((line, fields)) = check_label_file(label)? {
                tracing::error!(split = %split, file = %label.display(), line, fields, "incorrect label format");
                report.push(ValidationIssue {
                    split,
                    kind: IssueKind::BadLabelLine,
                    path: label.clone(),
                    line: Some(line),
                    message: format!("expected {LABEL_FIELDS} fields, found {fields}"),
                });
            }
        }
        tracing::debug!(split = %split, images = images.len(), labels = labels.len(), "split checked");
    }

    Ok(report)
}

/// Validate a split dataset.
///
/// Every split is checked and tallied before deciding. Warnings never fail
/// validation; any error yields [`DatasetError::Validation`].
pub fn validate(dataset_root: &Path) -> DatasetResult<ValidationReport> {
    tracing::info!(root = %dataset_root.display(), "validating dataset");
    let report = inspect(dataset_root)?;

    if report.errors > 0 {
        tracing::error!(errors = report.errors, warnings = report.warnings, "dataset validation failed");
        return Err(DatasetError::Validation { errors: report.errors, report: Box::new(report) });
    }

    tracing::info!(warnings = report.warnings, "dataset validation successful");
    Ok(report)
}
