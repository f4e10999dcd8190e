//! Pipeline configuration file support.
//!
//! Configuration is layered: built-in defaults, then the global file
//! (`~/.visionops/config.toml`), then the local file (`./visionops.toml`
//! or an explicit path), then environment variables. The merged layers are
//! resolved into a [`PipelineConfig`], which is validated before anyone
//! gets to use it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key metric logged by the detector's tracking integration.
pub const DEFAULT_KEY_METRIC: &str = "metrics/mAP50-95B";

const DEFAULT_DATASET_ROOT: &str = "data/dataset";
const DEFAULT_TRAIN_RATIO: f64 = 0.6;
const DEFAULT_VALID_RATIO: f64 = 0.2;
const DEFAULT_SEED: u64 = 42;
const DEFAULT_MODEL_NAME: &str = "yolo11n";
const DEFAULT_EPOCHS: u32 = 1;
const DEFAULT_DEVICE: &str = "cpu";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("failed to parse configuration file: {0}")]
    ParseError(String),

    /// A required value is absent.
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),

    /// A value is present but unusable.
    #[error("invalid configuration value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// One layer of configuration as written on disk. Every field is optional so
/// layers can be merged before defaults are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub dataset: DatasetSection,

    #[serde(default)]
    pub training: TrainingSection,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub object_store: Option<ObjectStoreSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSection {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub train_ratio: Option<f64>,
    #[serde(default)]
    pub valid_ratio: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub classes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingSection {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub key_metric: Option<String>,
    #[serde(default)]
    pub epochs: Option<u32>,
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Workspace root that holds `.visionops/registry`.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectStoreSection {
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl ConfigFile {
    /// Load one configuration layer from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".visionops")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from("visionops.toml")
    }

    /// Merge another layer into this one. Values set in `other` win.
    pub fn merge(&mut self, other: &Self) {
        let d = &other.dataset;
        if d.root.is_some() {
            self.dataset.root.clone_from(&d.root);
        }
        if d.train_ratio.is_some() {
            self.dataset.train_ratio = d.train_ratio;
        }
        if d.valid_ratio.is_some() {
            self.dataset.valid_ratio = d.valid_ratio;
        }
        if d.seed.is_some() {
            self.dataset.seed = d.seed;
        }
        if d.classes.is_some() {
            self.dataset.classes.clone_from(&d.classes);
        }

        let t = &other.training;
        if t.model_name.is_some() {
            self.training.model_name.clone_from(&t.model_name);
        }
        if t.key_metric.is_some() {
            self.training.key_metric.clone_from(&t.key_metric);
        }
        if t.epochs.is_some() {
            self.training.epochs = t.epochs;
        }
        if t.device.is_some() {
            self.training.device.clone_from(&t.device);
        }

        if other.registry.root.is_some() {
            self.registry.root.clone_from(&other.registry.root);
        }

        if let Some(ref store) = other.object_store {
            let target = self.object_store.get_or_insert_with(ObjectStoreSection::default);
            if store.endpoint_url.is_some() {
                target.endpoint_url.clone_from(&store.endpoint_url);
            }
            if store.access_key_id.is_some() {
                target.access_key_id.clone_from(&store.access_key_id);
            }
            if store.secret_access_key.is_some() {
                target.secret_access_key.clone_from(&store.secret_access_key);
            }
        }
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(root) = get("VISIONOPS_DATASET_ROOT") {
            self.dataset.root = Some(PathBuf::from(root));
        }
        if let Some(name) = get("VISIONOPS_MODEL_NAME") {
            self.training.model_name = Some(name);
        }
        if let Some(root) = get("VISIONOPS_REGISTRY_ROOT") {
            self.registry.root = Some(PathBuf::from(root));
        }

        let endpoint = get("MLFLOW_S3_ENDPOINT_URL");
        let access = get("AWS_ACCESS_KEY_ID");
        let secret = get("AWS_SECRET_ACCESS_KEY");
        if endpoint.is_some() || access.is_some() || secret.is_some() {
            let store = self.object_store.get_or_insert_with(ObjectStoreSection::default);
            if endpoint.is_some() {
                store.endpoint_url = endpoint;
            }
            if access.is_some() {
                store.access_key_id = access;
            }
            if secret.is_some() {
                store.secret_access_key = secret;
            }
        }
    }

    /// Apply defaults and validate, producing the configuration components use.
    pub fn resolve(self) -> ConfigResult<PipelineConfig> {
        let dataset = DatasetConfig {
            root: self.dataset.root.unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_ROOT)),
            train_ratio: self.dataset.train_ratio.unwrap_or(DEFAULT_TRAIN_RATIO),
            valid_ratio: self.dataset.valid_ratio.unwrap_or(DEFAULT_VALID_RATIO),
            seed: self.dataset.seed.unwrap_or(DEFAULT_SEED),
            classes: self.dataset.classes.unwrap_or_default(),
        };

        let training = TrainingConfig {
            model_name: self.training.model_name.unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            key_metric: self.training.key_metric.unwrap_or_else(|| DEFAULT_KEY_METRIC.to_string()),
            epochs: self.training.epochs.unwrap_or(DEFAULT_EPOCHS),
            device: self.training.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
        };

        let registry = RegistryConfig { root: self.registry.root.unwrap_or_else(|| PathBuf::from(".")) };

        let object_store = match self.object_store {
            None => None,
            Some(store) => Some(ObjectStoreConfig {
                endpoint_url: store.endpoint_url.ok_or(ConfigError::Missing("object_store.endpoint_url"))?,
                access_key_id: store.access_key_id.ok_or(ConfigError::Missing("object_store.access_key_id"))?,
                secret_access_key: store
                    .secret_access_key
                    .ok_or(ConfigError::Missing("object_store.secret_access_key"))?,
            }),
        };

        let config = PipelineConfig { dataset, training, registry, object_store };
        config.validate()?;
        Ok(config)
    }
}

/// Fully resolved configuration for the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub dataset: DatasetConfig,
    pub training: TrainingConfig,
    pub registry: RegistryConfig,
    pub object_store: Option<ObjectStoreConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetConfig {
    pub root: PathBuf,
    pub train_ratio: f64,
    pub valid_ratio: f64,
    pub seed: u64,
    /// Class names in index order.
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingConfig {
    pub model_name: String,
    pub key_metric: String,
    pub epochs: u32,
    pub device: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectStoreConfig {
    pub endpoint_url: String,
    pub access_key_id: String,
    #[serde(skip_serializing)]
    pub secret_access_key: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        // Defaults always validate, so resolving an empty layer cannot fail.
        Self {
            dataset: DatasetConfig {
                root: PathBuf::from(DEFAULT_DATASET_ROOT),
                train_ratio: DEFAULT_TRAIN_RATIO,
                valid_ratio: DEFAULT_VALID_RATIO,
                seed: DEFAULT_SEED,
                classes: Vec::new(),
            },
            training: TrainingConfig {
                model_name: DEFAULT_MODEL_NAME.to_string(),
                key_metric: DEFAULT_KEY_METRIC.to_string(),
                epochs: DEFAULT_EPOCHS,
                device: DEFAULT_DEVICE.to_string(),
            },
            registry: RegistryConfig { root: PathBuf::from(".") },
            object_store: None,
        }
    }
}

impl PipelineConfig {
    /// Discover and load configuration.
    ///
    /// Loads, in increasing precedence:
    /// 1. Global config (~/.visionops/config.toml), if present
    /// 2. `explicit` if given (must exist), otherwise ./visionops.toml if present
    /// 3. Environment variables
    pub fn discover_and_load(explicit: Option<&Path>) -> ConfigResult<Self> {
        let mut layers = ConfigFile::default();

        let global_path = ConfigFile::default_global_path();
        if global_path.exists() {
            layers.merge(&ConfigFile::load_from_file(&global_path)?);
        }

        match explicit {
            Some(path) => layers.merge(&ConfigFile::load_from_file(path)?),
            None => {
                let local_path = ConfigFile::default_local_path();
                if local_path.exists() {
                    layers.merge(&ConfigFile::load_from_file(&local_path)?);
                }
            }
        }

        layers.apply_env();
        let config = layers.resolve()?;
        tracing::debug!(model = %config.training.model_name, dataset = %config.dataset.root.display(), "configuration loaded");
        Ok(config)
    }

    /// Check every invariant the components rely on.
    pub fn validate(&self) -> ConfigResult<()> {
        let d = &self.dataset;
        check_ratio("dataset.train_ratio", d.train_ratio)?;
        check_ratio("dataset.valid_ratio", d.valid_ratio)?;
        if d.train_ratio + d.valid_ratio > 1.0 {
            return Err(ConfigError::Invalid {
                field: "dataset.valid_ratio",
                message: format!("train_ratio + valid_ratio must be <= 1 (got {})", d.train_ratio + d.valid_ratio),
            });
        }
        if d.root.as_os_str().is_empty() {
            return Err(ConfigError::Missing("dataset.root"));
        }
        if let Some(idx) = d.classes.iter().position(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid { field: "dataset.classes", message: format!("class name at index {idx} is empty") });
        }

        let t = &self.training;
        if t.model_name.trim().is_empty() {
            return Err(ConfigError::Missing("training.model_name"));
        }
        if t.key_metric.trim().is_empty() {
            return Err(ConfigError::Missing("training.key_metric"));
        }
        if t.epochs == 0 {
            return Err(ConfigError::Invalid { field: "training.epochs", message: "must be >= 1".to_string() });
        }

        if let Some(ref store) = self.object_store {
            if store.endpoint_url.trim().is_empty() {
                return Err(ConfigError::Missing("object_store.endpoint_url"));
            }
            if store.access_key_id.trim().is_empty() {
                return Err(ConfigError::Missing("object_store.access_key_id"));
            }
            if store.secret_access_key.trim().is_empty() {
                return Err(ConfigError::Missing("object_store.secret_access_key"));
            }
        }
        Ok(())
    }

    /// Class names, failing if none are configured.
    pub fn require_classes(&self) -> ConfigResult<&[String]> {
        if self.dataset.classes.is_empty() {
            return Err(ConfigError::Missing("dataset.classes"));
        }
        Ok(&self.dataset.classes)
    }
}

fn check_ratio(field: &'static str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(ConfigError::Invalid { field, message: format!("must be in (0, 1), got {value}") });
    }
    Ok(())
}
