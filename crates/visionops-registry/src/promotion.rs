//! Champion/challenger promotion of freshly trained model versions.
//!
//! Each call corresponds to exactly one newly trained run:
//! - no `Champion` alias yet: the new version is crowned `Champion`;
//! - otherwise the key metric of the new run is compared with the champion's
//!   run, and only a strictly better run is given the `Challenger` alias.
//!
//! The new version carries a `status` tag mirroring the alias it received,
//! since aliases are overwritten and keep no history.

use crate::artifacts::ArtifactLocation;
use crate::error::{RegistryError, RegistryResult};
use crate::metrics::RunMetrics;
use crate::registry::{AliasLookup, ModelRegistry, ModelVersion};
use crate::run::RunId;
use serde::Serialize;

pub const CHAMPION_ALIAS: &str = "Champion";
pub const CHALLENGER_ALIAS: &str = "Challenger";
pub const STATUS_TAG: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// No champion exists; the run becomes champion.
    Crown,
    /// The run beats the champion.
    Challenge,
    /// The champion is at least as good; nothing changes.
    Retain,
}

/// Compare a run against the current champion (if any) on `key_metric`.
///
/// Missing metrics score `0`. Ties go to the champion.
#[must_use]
pub fn decide(champion: Option<&RunMetrics>, current: &RunMetrics, key_metric: &str) -> Decision {
    let Some(champion) = champion else {
        return Decision::Crown;
    };
    if current.key_metric(key_metric) > champion.key_metric(key_metric) {
        Decision::Challenge
    } else {
        Decision::Retain
    }
}

#[derive(Debug, Clone)]
pub struct PromotionPolicy {
    pub key_metric: String,
}

impl PromotionPolicy {
    #[must_use]
    pub fn new(key_metric: impl Into<String>) -> Self {
        Self { key_metric: key_metric.into() }
    }
}

/// What happened to the freshly registered version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PromotionOutcome {
    Crowned {
        version: ModelVersion,
    },
    Challenger {
        version: ModelVersion,
        champion_version: u64,
        current_score: f64,
        champion_score: f64,
    },
    Retained {
        version: ModelVersion,
        champion_version: u64,
        current_score: f64,
        champion_score: f64,
    },
}

impl PromotionOutcome {
    #[must_use]
    pub fn version(&self) -> &ModelVersion {
        match self {
            Self::Crowned { version } | Self::Challenger { version, .. } | Self::Retained { version, .. } => version,
        }
    }

    /// Alias assigned to the new version, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&'static str> {
        match self {
            Self::Crowned { .. } => Some(CHAMPION_ALIAS),
            Self::Challenger { .. } => Some(CHALLENGER_ALIAS),
            Self::Retained { .. } => None,
        }
    }
}

pub struct PromotionEngine<R> {
    registry: R,
    policy: PromotionPolicy,
}

impl<R: ModelRegistry> PromotionEngine<R> {
    #[must_use]
    pub fn new(registry: R, policy: PromotionPolicy) -> Self {
        Self { registry, policy }
    }

    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    #[must_use]
    pub fn policy(&self) -> &PromotionPolicy {
        &self.policy
    }

    /// Register the run's weights under `model_name` and assign aliases.
    ///
    /// Registry failures are returned unchanged; only a missing `Champion`
    /// alias is treated as a state.
    pub async fn promote(&self, model_name: &str, run_id: &RunId, artifact_uri: &str) -> RegistryResult<PromotionOutcome> {
        let mut version = self.registry.register_version(run_id, artifact_uri, model_name).await?;
        tracing::debug!(registry = self.registry.id(), model = model_name, version = version.version, "registered candidate version");

        let champion = match self.registry.get_alias(model_name, CHAMPION_ALIAS).await? {
            AliasLookup::Found(v) => v,
            AliasLookup::NotFound => {
                tracing::info!(model = model_name, version = version.version, "no champion yet, crowning current model");
                self.assign(&mut version, CHAMPION_ALIAS).await?;
                return Ok(PromotionOutcome::Crowned { version });
            }
        };

        let current_metrics = self.registry.get_metrics(run_id).await?;
        let champion_metrics = self.registry.get_metrics(&champion.run_id).await?;
        let key = self.policy.key_metric.as_str();
        let current_score = current_metrics.key_metric(key);
        let champion_score = champion_metrics.key_metric(key);
        tracing::debug!(key, current_score, champion_score, champion_version = champion.version, "comparing against champion");

        match decide(Some(&champion_metrics), &current_metrics, key) {
            Decision::Challenge => {
                tracing::info!(
                    model = model_name,
                    version = version.version,
                    current_score,
                    champion_score,
                    "current model is better than champion, setting alias Challenger"
                );
                self.assign(&mut version, CHALLENGER_ALIAS).await?;
                Ok(PromotionOutcome::Challenger {
                    version,
                    champion_version: champion.version,
                    current_score,
                    champion_score,
                })
            }
            Decision::Retain | Decision::Crown => {
                tracing::info!(
                    model = model_name,
                    version = version.version,
                    current_score,
                    champion_score,
                    "current model is not better than champion, not setting alias"
                );
                Ok(PromotionOutcome::Retained {
                    version,
                    champion_version: champion.version,
                    current_score,
                    champion_score,
                })
            }
        }
    }

    /// Point `alias` at `version` and mirror it in the `status` tag.
    async fn assign(&self, version: &mut ModelVersion, alias: &str) -> RegistryResult<()> {
        self.registry.set_alias(&version.model_name, alias, version.version).await?;
        self.registry.set_tag(&version.model_name, version.version, STATUS_TAG, alias).await?;
        version.tags.insert(STATUS_TAG.to_string(), alias.to_string());
        Ok(())
    }
}

/// The version an alias points at and where its weights live.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedArtifact {
    pub alias: String,
    pub version: ModelVersion,
    pub location: ArtifactLocation,
}

/// Resolve an alias to downloadable weights. Unlike promotion, a missing
/// alias is an error here: there is nothing to serve.
pub async fn resolve_alias_artifact<R: ModelRegistry + ?Sized>(
    registry: &R,
    model_name: &str,
    alias: &str,
) -> RegistryResult<ResolvedArtifact> {
    let version = registry.get_alias(model_name, alias).await?.found().ok_or_else(|| RegistryError::AliasNotFound {
        model: model_name.to_string(),
        alias: alias.to_string(),
    })?;
    let location = ArtifactLocation::parse(&version.artifact.uri)?;
    Ok(ResolvedArtifact { alias: alias.to_string(), version, location })
}
