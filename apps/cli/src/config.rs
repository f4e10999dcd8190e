//! CLI configuration loading.

use anyhow::Context;
use std::path::{Path, PathBuf};
use visionops_core::PipelineConfig;

/// Load and validate the pipeline configuration.
///
/// Configuration precedence:
/// 1. CLI arguments (applied by each command)
/// 2. Environment variables
/// 3. `--config` file, or ./visionops.toml
/// 4. Global config file (~/.visionops/config.toml)
/// 5. Defaults
pub fn load_config(explicit: Option<&Path>, workspace: Option<PathBuf>) -> anyhow::Result<PipelineConfig> {
    let mut config = PipelineConfig::discover_and_load(explicit).context("Failed to load configuration")?;
    if let Some(workspace) = workspace {
        config.registry.root = workspace;
    }
    Ok(config)
}
