use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::FEATURE_COUNT;

/// Fitted feature transform exported next to the predictor.
///
/// Stored as JSON, e.g.
/// `{"kind": "standard", "mean": [..4], "scale": [..4]}` or
/// `{"kind": "min_max", "min": [..4], "scale": [..4]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .with_context(|| format!("failed to read scaler file {}", path.display()))?;
        let scaler: Scaler = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse scaler file {}", path.display()))?;
        scaler.validate()?;
        Ok(scaler)
    }

    /// Every parameter vector must have one entry per feature, and a standard
    /// scaler must not divide by zero.
    pub fn validate(&self) -> Result<()> {
        let (offsets, scale) = match self {
            Scaler::Standard { mean, scale } => (mean, scale),
            Scaler::MinMax { min, scale } => (min, scale),
        };
        if offsets.len() != FEATURE_COUNT || scale.len() != FEATURE_COUNT {
            bail!(
                "scaler expects {FEATURE_COUNT} features, got {} offsets and {} scale factors",
                offsets.len(),
                scale.len()
            );
        }
        if matches!(self, Scaler::Standard { .. }) && scale.iter().any(|s| *s == 0.0) {
            bail!("standard scaler has a zero scale factor");
        }
        Ok(())
    }

    pub fn transform(&self, features: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = *features;
        match self {
            Scaler::Standard { mean, scale } => {
                for (i, x) in out.iter_mut().enumerate() {
                    *x = (*x - mean[i]) / scale[i];
                }
            }
            Scaler::MinMax { min, scale } => {
                for (i, x) in out.iter_mut().enumerate() {
                    *x = *x * scale[i] + min[i];
                }
            }
        }
        out
    }
}
