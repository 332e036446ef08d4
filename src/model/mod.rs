pub mod predictor;
pub mod scaler;

use std::{path::Path, sync::Arc};

use anyhow::{ensure, Result};
use tracing::{error, info};

pub use predictor::{OnnxPredictor, Predictor};
pub use scaler::Scaler;

/// Number of model inputs: temperature, humidity, air flow, MRT, in that order.
pub const FEATURE_COUNT: usize = 4;

/// Scaler and predictor loaded together at startup.
pub struct PmvModel {
    scaler: Scaler,
    predictor: Box<dyn Predictor>,
}

impl PmvModel {
    pub fn new(scaler: Scaler, predictor: Box<dyn Predictor>) -> Self {
        Self { scaler, predictor }
    }

    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self> {
        let predictor = OnnxPredictor::load(model_path)?;
        let scaler = Scaler::load(scaler_path)?;
        Ok(Self::new(scaler, Box::new(predictor)))
    }

    /// Scale the raw readings and run the regressor. The result is neither
    /// clamped nor rounded.
    pub fn predict_raw(&self, features: &[f64; FEATURE_COUNT]) -> Result<f64> {
        let scaled = self.scaler.transform(features);
        let raw = self.predictor.predict(&scaled)?;
        ensure!(raw.is_finite(), "model produced a non-finite prediction: {raw}");
        Ok(raw)
    }
}

/// Process-wide model handle. Empty when the artifacts failed to load; the
/// server keeps running and prediction requests are refused until restart.
#[derive(Clone, Default)]
pub struct ModelState {
    inner: Option<Arc<PmvModel>>,
}

impl ModelState {
    pub fn loaded(model: PmvModel) -> Self {
        Self { inner: Some(Arc::new(model)) }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Load both artifacts, logging instead of failing when either is missing
    /// or malformed.
    pub fn load(model_path: &Path, scaler_path: &Path) -> Self {
        match PmvModel::load(model_path, scaler_path) {
            Ok(model) => {
                info!(
                    model = %model_path.display(),
                    scaler = %scaler_path.display(),
                    "Model and scaler loaded"
                );
                Self::loaded(model)
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to load model or scaler; /predict disabled");
                Self::unavailable()
            }
        }
    }

    pub fn get(&self) -> Option<&PmvModel> {
        self.inner.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.is_some()
    }
}
