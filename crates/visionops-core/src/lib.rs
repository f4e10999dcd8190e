//! VisionOps Core
//!
//! Shared configuration for the dataset and registry components:
//! - Layered TOML configuration (`ConfigFile`)
//! - The resolved, validated `PipelineConfig` handed to each component

pub mod config;

pub use config::{
    ConfigError, ConfigFile, ConfigResult, DatasetConfig, ObjectStoreConfig, PipelineConfig, RegistryConfig,
    TrainingConfig, DEFAULT_KEY_METRIC,
};
