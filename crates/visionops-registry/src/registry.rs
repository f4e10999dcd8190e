//! The model registry seam and its state model.

use crate::artifacts::{make_artifact, ModelArtifact};
use crate::error::{RegistryError, RegistryResult};
use crate::metrics::RunMetrics;
use crate::run::{RunId, TrainingRun};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// One registered version of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub model_name: String,
    /// 1-based, increasing per model.
    pub version: u64,
    pub run_id: RunId,
    pub artifact: ModelArtifact,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Result of looking up an alias. A missing alias is an expected state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasLookup {
    Found(ModelVersion),
    NotFound,
}

impl AliasLookup {
    #[must_use]
    pub fn found(self) -> Option<ModelVersion> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound => None,
        }
    }
}

/// Operations the promotion protocol needs from an experiment/model registry.
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    fn id(&self) -> &'static str;

    async fn get_alias(&self, model_name: &str, alias: &str) -> RegistryResult<AliasLookup>;

    async fn get_metrics(&self, run_id: &RunId) -> RegistryResult<RunMetrics>;

    /// Point `alias` at `version`, taking it away from any previous holder.
    async fn set_alias(&self, model_name: &str, alias: &str, version: u64) -> RegistryResult<()>;

    async fn set_tag(&self, model_name: &str, version: u64, key: &str, value: &str) -> RegistryResult<()>;

    async fn register_version(&self, run_id: &RunId, artifact_uri: &str, model_name: &str) -> RegistryResult<ModelVersion>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<ModelVersion>,
    #[serde(default)]
    pub aliases: BTreeMap<String, u64>,
}

impl RegisteredModel {
    #[must_use]
    pub fn version(&self, version: u64) -> Option<&ModelVersion> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// Aliases currently held by `version`.
    #[must_use]
    pub fn aliases_of(&self, version: u64) -> Vec<&str> {
        self.aliases.iter().filter(|(_, v)| **v == version).map(|(a, _)| a.as_str()).collect()
    }
}

/// Everything a local registry stores: runs and registered models.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryState {
    #[serde(default)]
    pub runs: BTreeMap<String, TrainingRun>,
    #[serde(default)]
    pub models: BTreeMap<String, RegisteredModel>,
}

impl RegistryState {
    pub fn log_run(&mut self, run: TrainingRun) -> TrainingRun {
        self.runs.insert(run.run_id.0.clone(), run.clone());
        run
    }

    pub fn run(&self, run_id: &RunId) -> RegistryResult<&TrainingRun> {
        self.runs.get(run_id.as_str()).ok_or_else(|| RegistryError::RunNotFound(run_id.to_string()))
    }

    pub fn model(&self, model_name: &str) -> RegistryResult<&RegisteredModel> {
        self.models.get(model_name).ok_or_else(|| RegistryError::ModelNotFound(model_name.to_string()))
    }

    fn model_mut(&mut self, model_name: &str) -> RegistryResult<&mut RegisteredModel> {
        self.models.get_mut(model_name).ok_or_else(|| RegistryError::ModelNotFound(model_name.to_string()))
    }

    #[must_use]
    pub fn get_alias(&self, model_name: &str, alias: &str) -> AliasLookup {
        let Some(model) = self.models.get(model_name) else {
            return AliasLookup::NotFound;
        };
        model
            .aliases
            .get(alias)
            .and_then(|v| model.version(*v))
            .map_or(AliasLookup::NotFound, |v| AliasLookup::Found(v.clone()))
    }

    pub fn get_metrics(&self, run_id: &RunId) -> RegistryResult<RunMetrics> {
        Ok(self.run(run_id)?.metrics.clone())
    }

    pub fn set_alias(&mut self, model_name: &str, alias: &str, version: u64) -> RegistryResult<()> {
        let model = self.model_mut(model_name)?;
        if model.version(version).is_none() {
            return Err(RegistryError::VersionNotFound { model: model_name.to_string(), version });
        }
        model.aliases.insert(alias.to_string(), version);
        Ok(())
    }

    pub fn set_tag(&mut self, model_name: &str, version: u64, key: &str, value: &str) -> RegistryResult<()> {
        let model = self.model_mut(model_name)?;
        let entry = model
            .versions
            .iter_mut()
            .find(|v| v.version == version)
            .ok_or_else(|| RegistryError::VersionNotFound { model: model_name.to_string(), version })?;
        entry.tags.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn register_version(&mut self, run_id: &RunId, artifact_uri: &str, model_name: &str) -> RegistryResult<ModelVersion> {
        self.run(run_id)?;
        let artifact = make_artifact(artifact_uri)?;

        let model = self
            .models
            .entry(model_name.to_string())
            .or_insert_with(|| RegisteredModel { name: model_name.to_string(), ..RegisteredModel::default() });
        let version = model.versions.iter().map(|v| v.version).max().unwrap_or(0) + 1;

        let entry = ModelVersion {
            model_name: model_name.to_string(),
            version,
            run_id: run_id.clone(),
            artifact,
            tags: BTreeMap::new(),
            created_at: Utc::now(),
        };
        model.versions.push(entry.clone());
        Ok(entry)
    }
}

/// Registry held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: Mutex<RegistryState>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_run(&self, run: TrainingRun) -> RegistryResult<TrainingRun> {
        self.with_state(|s| Ok(s.log_run(run)))
    }

    /// Copy of the current state, for inspection.
    pub fn snapshot(&self) -> RegistryResult<RegistryState> {
        self.with_state(|s| Ok(s.clone()))
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RegistryState) -> RegistryResult<T>) -> RegistryResult<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RegistryError::Unavailable("registry state lock poisoned".to_string()))?;
        f(&mut state)
    }
}

#[async_trait]
impl ModelRegistry for InMemoryRegistry {
    fn id(&self) -> &'static str {
        "memory"
    }

    async fn get_alias(&self, model_name: &str, alias: &str) -> RegistryResult<AliasLookup> {
        self.with_state(|s| Ok(s.get_alias(model_name, alias)))
    }

    async fn get_metrics(&self, run_id: &RunId) -> RegistryResult<RunMetrics> {
        self.with_state(|s| s.get_metrics(run_id))
    }

    async fn set_alias(&self, model_name: &str, alias: &str, version: u64) -> RegistryResult<()> {
        self.with_state(|s| s.set_alias(model_name, alias, version))
    }

    async fn set_tag(&self, model_name: &str, version: u64, key: &str, value: &str) -> RegistryResult<()> {
        self.with_state(|s| s.set_tag(model_name, version, key, value))
    }

    async fn register_version(&self, run_id: &RunId, artifact_uri: &str, model_name: &str) -> RegistryResult<ModelVersion> {
        self.with_state(|s| s.register_version(run_id, artifact_uri, model_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_run() -> (RegistryState, RunId) {
        let mut state = RegistryState::default();
        let run = state.log_run(TrainingRun::new("yolo11n", RunMetrics::new().with("m", 0.5)));
        (state, run.run_id)
    }

    #[test]
    fn test_register_versions_increment() {
        let (mut state, run_id) = state_with_run();
        let v1 = state.register_version(&run_id, "s3://b/one/weights/best.pt", "yolo11n").unwrap();
        let v2 = state.register_version(&run_id, "s3://b/two/weights/best.pt", "yolo11n").unwrap();
        let other = state.register_version(&run_id, "s3://b/three/weights/best.pt", "other").unwrap();

        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
        assert_eq!(other.version, 1);
    }

    #[test]
    fn test_register_requires_known_run() {
        let mut state = RegistryState::default();
        let err = state.register_version(&RunId::from("missing"), "s3://b/k", "yolo11n").unwrap_err();
        assert!(matches!(err, RegistryError::RunNotFound(_)));
    }

    #[test]
    fn test_alias_moves_between_versions() {
        let (mut state, run_id) = state_with_run();
        assert_eq!(state.get_alias("yolo11n", "Champion"), AliasLookup::NotFound);

        state.register_version(&run_id, "s3://b/one", "yolo11n").unwrap();
        state.register_version(&run_id, "s3://b/two", "yolo11n").unwrap();
        state.set_alias("yolo11n", "Champion", 1).unwrap();
        state.set_alias("yolo11n", "Champion", 2).unwrap();

        let holder = state.get_alias("yolo11n", "Champion").found().unwrap();
        assert_eq!(holder.version, 2);
        assert!(state.model("yolo11n").unwrap().aliases_of(1).is_empty());
    }

    #[test]
    fn test_alias_and_tag_require_existing_version() {
        let (mut state, run_id) = state_with_run();
        assert!(matches!(state.set_alias("yolo11n", "Champion", 1), Err(RegistryError::ModelNotFound(_))));

        state.register_version(&run_id, "s3://b/one", "yolo11n").unwrap();
        assert!(matches!(state.set_alias("yolo11n", "Champion", 9), Err(RegistryError::VersionNotFound { .. })));
        assert!(matches!(state.set_tag("yolo11n", 9, "status", "Champion"), Err(RegistryError::VersionNotFound { .. })));

        state.set_tag("yolo11n", 1, "status", "Champion").unwrap();
        let model = state.model("yolo11n").unwrap();
        assert_eq!(model.version(1).unwrap().tags.get("status").map(String::as_str), Some("Champion"));
    }

    #[tokio::test]
    async fn test_in_memory_registry_metrics() {
        let registry = InMemoryRegistry::new();
        let run = registry.log_run(TrainingRun::new("yolo11n", RunMetrics::new().with("m", 0.25))).unwrap();

        let metrics = registry.get_metrics(&run.run_id).await.unwrap();
        assert_eq!(metrics.get("m"), Some(0.25));
        assert!(matches!(registry.get_metrics(&RunId::from("nope")).await, Err(RegistryError::RunNotFound(_))));
    }
}
