//! Model deserialization
//!
//! Models are stored as JSON documents tagged by `kind`:
//!
//! ```json
//! {"kind": "linear", "target": "pm10", "intercept": 4.2,
//!  "coefficients": {"humidity": 0.31, "temperature": -0.12}}
//! ```

use super::{ConstantModel, LinearModel, Predictor};
use crate::models::Pollutant;
use crate::{PmcastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument, warn};

/// On-disk model representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SerializedModel {
    Linear(LinearModel),
    Constant(ConstantModel),
}

impl SerializedModel {
    /// Column name the model was trained to predict
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            SerializedModel::Linear(model) => &model.target,
            SerializedModel::Constant(model) => &model.target,
        }
    }

    #[must_use]
    pub fn into_predictor(self) -> Box<dyn Predictor> {
        match self {
            SerializedModel::Linear(model) => Box::new(model),
            SerializedModel::Constant(model) => Box::new(model),
        }
    }
}

/// Loads serialized models from local files
pub struct ModelLoader;

impl ModelLoader {
    /// Read and decode a model document
    pub fn read(path: impl AsRef<Path>) -> Result<SerializedModel> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        if looks_like_windows_absolute(&path_str) && !cfg!(windows) {
            warn!("Model path {} is a Windows absolute path", path_str);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| PmcastError::model_load(&path_str, e.to_string()))?;

        serde_json::from_str(&content)
            .map_err(|e| PmcastError::model_load(&path_str, e.to_string()))
    }

    /// Load the model for `pollutant`, rejecting models trained for another target
    #[instrument(skip_all, fields(pollutant = %pollutant))]
    pub fn load(path: impl AsRef<Path>, pollutant: Pollutant) -> Result<Box<dyn Predictor>> {
        let path = path.as_ref();
        let model = Self::read(path)?;

        if model.target() != pollutant.column() {
            return Err(PmcastError::model_load(
                path.display().to_string(),
                format!(
                    "model predicts '{}', expected '{}'",
                    model.target(),
                    pollutant.column()
                ),
            ));
        }

        let predictor = model.into_predictor();
        info!("Loaded {}", predictor.describe());
        Ok(predictor)
    }
}

fn looks_like_windows_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}
