use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Location of the best weights inside a run's artifact root.
pub const WEIGHTS_SUBPATH: &str = "weights/best.pt";

/// Weights registered for a model version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub uri: String,
    /// Content hash, recorded when the artifact is a readable local file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

pub fn sha256_file(path: &Path) -> RegistryResult<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Describe an artifact, hashing it when it is a local file.
pub fn make_artifact(uri: &str) -> RegistryResult<ModelArtifact> {
    if uri.trim().is_empty() {
        return Err(RegistryError::InvalidArtifact("artifact uri is empty".to_string()));
    }

    let sha256 = match ArtifactLocation::parse(uri)? {
        ArtifactLocation::Local { path } if path.is_file() => Some(sha256_file(&path)?),
        _ => None,
    };
    Ok(ModelArtifact { uri: uri.to_string(), sha256 })
}

/// `<artifact_root>/weights/best.pt`.
#[must_use]
pub fn weights_uri(artifact_root: &str) -> String {
    format!("{}/{WEIGHTS_SUBPATH}", artifact_root.trim_end_matches('/'))
}

/// Host and port of an object-store endpoint, without the scheme.
#[must_use]
pub fn normalize_endpoint(endpoint_url: &str) -> &str {
    let trimmed = endpoint_url.trim();
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);
    host.trim_end_matches('/')
}

/// Where an artifact URI points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactLocation {
    ObjectStore { bucket: String, key: String },
    Local { path: PathBuf },
}

impl ArtifactLocation {
    /// `s3://bucket/key` is an object-store location; anything else (with an
    /// optional `file://` prefix) is a local path.
    pub fn parse(uri: &str) -> RegistryResult<Self> {
        let uri = uri.trim();
        if let Some(rest) = uri.strip_prefix("s3://") {
            let (bucket, key) = rest
                .split_once('/')
                .filter(|(b, k)| !b.is_empty() && !k.is_empty())
                .ok_or_else(|| RegistryError::InvalidArtifact(format!("expected s3://<bucket>/<key>, got '{uri}'")))?;
            return Ok(Self::ObjectStore { bucket: bucket.to_string(), key: key.to_string() });
        }

        let path = uri.strip_prefix("file://").unwrap_or(uri);
        if path.is_empty() {
            return Err(RegistryError::InvalidArtifact("artifact uri is empty".to_string()));
        }
        Ok(Self::Local { path: PathBuf::from(path) })
    }
}

impl std::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ObjectStore { bucket, key } => write!(f, "s3://{bucket}/{key}"),
            Self::Local { path } => write!(f, "{}", path.display()),
        }
    }
}
