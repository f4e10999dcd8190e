//! VisionOps Registry
//!
//! Model registry primitives for trained detector weights:
//! - Training runs and their metrics (`TrainingRun`, `RunMetrics`)
//! - The `ModelRegistry` seam with in-memory and file-backed implementations
//! - Champion/challenger promotion (`PromotionEngine`)
//! - Artifact locations for serving the promoted weights

pub mod artifacts;
pub mod error;
pub mod file;
pub mod metrics;
pub mod promotion;
pub mod registry;
pub mod run;

pub use artifacts::{make_artifact, normalize_endpoint, weights_uri, ArtifactLocation, ModelArtifact, WEIGHTS_SUBPATH};
pub use error::{RegistryError, RegistryResult};
pub use file::{FileRegistry, RegistryLayout};
pub use metrics::{normalize_metric_name, RunMetrics};
pub use promotion::{
    decide, resolve_alias_artifact, Decision, PromotionEngine, PromotionOutcome, PromotionPolicy, ResolvedArtifact,
    CHALLENGER_ALIAS, CHAMPION_ALIAS, STATUS_TAG,
};
pub use registry::{AliasLookup, InMemoryRegistry, ModelRegistry, ModelVersion, RegisteredModel, RegistryState};
pub use run::{RunId, TrainingRun};
