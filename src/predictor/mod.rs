//! Opaque forecast models
//!
//! A loaded model only exposes [`Predictor::predict`]: one value per input
//! row, in input order. Models are deserialized by [`ModelLoader`]; when a
//! model cannot be used the pipeline falls back to [`ZeroPredictor`].

pub mod linear;
pub mod loader;

pub use linear::{ConstantModel, LinearModel};
pub use loader::{ModelLoader, SerializedModel};

use crate::Result;
use crate::models::FeatureFrame;

/// Inference entry point of a pre-trained model
pub trait Predictor: Send + Sync + std::fmt::Debug {
    /// Predict one value per row of `frame`
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Placeholder model predicting zero for every row
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroPredictor;

impl Predictor for ZeroPredictor {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>> {
        Ok(vec![0.0; frame.row_count()])
    }

    fn describe(&self) -> String {
        "zero placeholder".to_string()
    }
}
