use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Metric name to value for one training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunMetrics(pub BTreeMap<String, f64>);

impl RunMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Value of the comparison metric. An absent metric scores `0`.
    #[must_use]
    pub fn key_metric(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a flat JSON object of metric name to number.
    pub fn from_json_file(path: &Path) -> RegistryResult<Self> {
        let bytes = std::fs::read(path)?;
        let metrics: Self = serde_json::from_slice(&bytes)?;
        metrics.check_finite()?;
        Ok(metrics)
    }

    /// Read the last epoch of a detector `results.csv`.
    ///
    /// Headers are trimmed and parentheses stripped, so `metrics/mAP50-95(B)`
    /// is stored as `metrics/mAP50-95B`. Non-numeric cells are skipped.
    pub fn from_results_csv(path: &Path) -> RegistryResult<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let headers = reader.headers()?.clone();

        let mut last = None;
        for record in reader.records() {
            last = Some(record?);
        }
        let Some(last) = last else {
            return Err(RegistryError::InvalidMetric(format!("{} has no result rows", path.display())));
        };

        let mut metrics = Self::new();
        for (header, cell) in headers.iter().zip(last.iter()) {
            if let Ok(value) = cell.parse::<f64>() {
                if value.is_finite() {
                    metrics.insert(normalize_metric_name(header), value);
                }
            }
        }
        Ok(metrics)
    }

    /// Parse a `name=value` pair.
    pub fn parse_pair(pair: &str) -> RegistryResult<(String, f64)> {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| RegistryError::InvalidMetric(format!("expected name=value, got '{pair}'")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::InvalidMetric(format!("empty metric name in '{pair}'")));
        }
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|e| RegistryError::InvalidMetric(format!("{name}: {e}")))?;
        if !value.is_finite() {
            return Err(RegistryError::InvalidMetric(format!("{name}: value must be finite")));
        }
        Ok((name.to_string(), value))
    }

    fn check_finite(&self) -> RegistryResult<()> {
        match self.0.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, _)) => Err(RegistryError::InvalidMetric(format!("{name}: value must be finite"))),
            None => Ok(()),
        }
    }
}

impl FromIterator<(String, f64)> for RunMetrics {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[must_use]
pub fn normalize_metric_name(name: &str) -> String {
    name.trim().replace(['(', ')'], "")
}
