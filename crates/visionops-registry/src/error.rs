use thiserror::Error;

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("registered model not found: {0}")]
    ModelNotFound(String),

    #[error("model {model} has no version {version}")]
    VersionNotFound { model: String, version: u64 },

    #[error("model {model} has no alias {alias}")]
    AliasNotFound { model: String, alias: String },

    #[error("invalid metric: {0}")]
    InvalidMetric(String),

    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("registry unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
