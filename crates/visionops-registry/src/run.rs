use crate::metrics::RunMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a training run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A finished training run: its metrics and where its artifacts were stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRun {
    pub run_id: RunId,
    pub run_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metrics: RunMetrics,
    /// Root under which the run's artifacts were uploaded (`s3://...` or a local path).
    #[serde(default)]
    pub artifact_uri: Option<String>,
}

impl TrainingRun {
    #[must_use]
    pub fn new(run_name: impl Into<String>, metrics: RunMetrics) -> Self {
        Self { run_id: RunId::new(), run_name: run_name.into(), created_at: Utc::now(), metrics, artifact_uri: None }
    }

    #[must_use]
    pub fn with_artifact_uri(mut self, uri: impl Into<String>) -> Self {
        self.artifact_uri = Some(uri.into());
        self
    }
}
