use std::path::Path;

use anyhow::{Context, Result};
use tract_onnx::prelude::*;

use super::FEATURE_COUNT;

/// Regression step of the pipeline: scaled features in, raw PMV out.
pub trait Predictor: Send + Sync {
    fn predict(&self, scaled: &[f64; FEATURE_COUNT]) -> Result<f64>;
}

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX regression graph with a single `[1, 4]` f32 input.
///
/// The first element of the first output is taken as the prediction, which
/// covers both `[1]` and `[1, 1]` shaped regressor outputs.
pub struct OnnxPredictor {
    plan: OnnxPlan,
}

impl OnnxPredictor {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("failed to read ONNX model {}", path.display()))?
            .with_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())
            .context("failed to set predictor input shape")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to make ONNX model runnable")?;
        Ok(Self { plan })
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, scaled: &[f64; FEATURE_COUNT]) -> Result<f64> {
        let data: Vec<f32> = scaled.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_shape(&[1, FEATURE_COUNT], &data)?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .context("model inference failed")?;

        let first = outputs.first().context("model produced no outputs")?;
        let values = first.cast_to::<f32>()?;
        let raw = values
            .as_slice::<f32>()?
            .first()
            .copied()
            .context("model output tensor is empty")?;
        Ok(raw as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // y = x . [0.5, 0.25, -1.0, 0.125] + 0.0625, see testdata/gen_linear.py
    const LINEAR_2D: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/model/testdata/linear_2d.onnx");
    const LINEAR_1D: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/model/testdata/linear_1d.onnx");

    #[test]
    fn column_output_model_predicts() {
        let predictor = OnnxPredictor::load(LINEAR_2D).unwrap();
        assert_eq!(predictor.predict(&[1.0, 2.0, 3.0, 4.0]).unwrap(), -1.4375);
        assert_eq!(predictor.predict(&[0.0; 4]).unwrap(), 0.0625);
    }

    #[test]
    fn flat_output_model_predicts() {
        let predictor = OnnxPredictor::load(LINEAR_1D).unwrap();
        assert_eq!(predictor.predict(&[1.0, 2.0, 3.0, 4.0]).unwrap(), -1.4375);
        assert_eq!(predictor.predict(&[2.0, 0.0, 0.0, 0.0]).unwrap(), 1.0625);
    }

    #[test]
    fn plan_is_reusable_across_calls() {
        let predictor = OnnxPredictor::load(LINEAR_2D).unwrap();
        let first = predictor.predict(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        let second = predictor.predict(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, -0.0625);
    }

    #[test]
    fn non_onnx_file_fails_to_load() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/src/model/testdata/scaler.json");
        assert!(OnnxPredictor::load(path).is_err());
    }

    #[test]
    fn load_missing_model_fails_with_path() {
        let err = OnnxPredictor::load("/nonexistent/model_pmv.onnx").err().unwrap();
        assert!(format!("{err:#}").contains("/nonexistent/model_pmv.onnx"));
    }
}
