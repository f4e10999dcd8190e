//! VisionOps Dataset
//!
//! Preparation of a flat image + YOLO label corpus for training:
//! - Unpacking exported annotations (`extract_annotations`)
//! - Discovering samples (`discover_samples`)
//! - Deterministic train/valid/test partitioning (`partition`)
//! - Writing and reading the `yolo.yaml` manifest
//! - Structural and label-format validation (`validate`)

pub mod annotations;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod sample;
pub mod split;
pub mod validate;

pub use annotations::{extract_annotations, EXTRACT_STAGING_DIR};
pub use error::{DatasetError, DatasetResult};
pub use layout::{DatasetLayout, Split, MANIFEST_FILE_NAME};
pub use manifest::{read_manifest, write_manifest, Manifest};
pub use sample::{annotations_present, discover_samples, Sample};
pub use split::{
    apply_plan, partition, plan_partition, PartitionOutcome, PartitionPlan, PartitionSummary, SplitRatios,
    SplitSummary, DEFAULT_SEED,
};
pub use validate::{check_label_file, inspect, validate, IssueKind, Severity, ValidationIssue, ValidationReport};
