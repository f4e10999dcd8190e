//! Registry persisted as a JSON document inside a workspace.

use crate::error::RegistryResult;
use crate::metrics::RunMetrics;
use crate::registry::{AliasLookup, ModelRegistry, ModelVersion, RegisteredModel, RegistryState};
use crate::run::{RunId, TrainingRun};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Filesystem layout for the local registry.
///
/// Default layout is `<workspace>/.visionops/registry/registry.json`.
#[derive(Debug, Clone)]
pub struct RegistryLayout {
    root: PathBuf,
}

impl RegistryLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn for_workspace_root(workspace_root: &Path) -> Self {
        Self::new(workspace_root.join(".visionops").join("registry"))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.root.join("registry.json")
    }
}

/// Registry whose state lives in a single JSON file, loaded and saved on
/// every operation. Assumes a single writer.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    layout: RegistryLayout,
}

impl FileRegistry {
    #[must_use]
    pub fn new(layout: RegistryLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub fn for_workspace_root(workspace_root: &Path) -> Self {
        Self::new(RegistryLayout::for_workspace_root(workspace_root))
    }

    #[must_use]
    pub fn layout(&self) -> &RegistryLayout {
        &self.layout
    }

    /// Current state; an absent file is an empty registry.
    pub fn load(&self) -> RegistryResult<RegistryState> {
        let path = self.layout.state_path();
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RegistryState::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, state: &RegistryState) -> RegistryResult<()> {
        std::fs::create_dir_all(self.layout.root())?;
        let path = self.layout.state_path();
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn update<T>(&self, f: impl FnOnce(&mut RegistryState) -> RegistryResult<T>) -> RegistryResult<T> {
        let mut state = self.load()?;
        let out = f(&mut state)?;
        self.save(&state)?;
        Ok(out)
    }

    pub fn log_run(&self, run: TrainingRun) -> RegistryResult<TrainingRun> {
        let run = self.update(|s| Ok(s.log_run(run)))?;
        tracing::info!(run_id = %run.run_id, run_name = %run.run_name, metrics = run.metrics.len(), "logged training run");
        Ok(run)
    }

    pub fn run(&self, run_id: &RunId) -> RegistryResult<TrainingRun> {
        Ok(self.load()?.run(run_id)?.clone())
    }

    pub fn model(&self, model_name: &str) -> RegistryResult<RegisteredModel> {
        Ok(self.load()?.model(model_name)?.clone())
    }
}

#[async_trait]
impl ModelRegistry for FileRegistry {
    fn id(&self) -> &'static str {
        "file"
    }

    async fn get_alias(&self, model_name: &str, alias: &str) -> RegistryResult<AliasLookup> {
        Ok(self.load()?.get_alias(model_name, alias))
    }

    async fn get_metrics(&self, run_id: &RunId) -> RegistryResult<RunMetrics> {
        self.load()?.get_metrics(run_id)
    }

    async fn set_alias(&self, model_name: &str, alias: &str, version: u64) -> RegistryResult<()> {
        self.update(|s| s.set_alias(model_name, alias, version))
    }

    async fn set_tag(&self, model_name: &str, version: u64, key: &str, value: &str) -> RegistryResult<()> {
        self.update(|s| s.set_tag(model_name, version, key, value))
    }

    async fn register_version(&self, run_id: &RunId, artifact_uri: &str, model_name: &str) -> RegistryResult<ModelVersion> {
        let version = self.update(|s| s.register_version(run_id, artifact_uri, model_name))?;
        tracing::info!(model = model_name, version = version.version, run_id = %run_id, "registered model version");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let temp = TempDir::new().unwrap();
        let layout = RegistryLayout::for_workspace_root(temp.path());
        assert!(layout.root().to_string_lossy().contains(".visionops"));
        assert!(layout.state_path().ends_with("registry.json"));
    }

    #[test]
    fn test_missing_file_is_empty_registry() {
        let temp = TempDir::new().unwrap();
        let registry = FileRegistry::for_workspace_root(temp.path());
        let state = registry.load().unwrap();
        assert!(state.runs.is_empty());
        assert!(state.models.is_empty());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let registry = FileRegistry::for_workspace_root(temp.path());
        let run = registry.log_run(TrainingRun::new("yolo11n", RunMetrics::new().with("m", 0.3))).unwrap();
        let version = registry.register_version(&run.run_id, "s3://mlflow/x/weights/best.pt", "yolo11n").await.unwrap();
        registry.set_alias("yolo11n", "Champion", version.version).await.unwrap();

        let reopened = FileRegistry::for_workspace_root(temp.path());
        let champion = reopened.get_alias("yolo11n", "Champion").await.unwrap().found().unwrap();
        assert_eq!(champion.run_id, run.run_id);
        assert_eq!(reopened.get_metrics(&run.run_id).await.unwrap().get("m"), Some(0.3));
    }
}
