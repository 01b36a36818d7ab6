//! Built-in model families

use super::Predictor;
use crate::models::FeatureFrame;
use crate::{PmcastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Linear regression over named feature columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub target: String,
    #[serde(default)]
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
}

impl Predictor for LinearModel {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>> {
        let mut predictions = vec![self.intercept; frame.row_count()];

        for (name, weight) in &self.coefficients {
            let column = frame.column(name).ok_or_else(|| {
                PmcastError::prediction(format!(
                    "model for '{}' expects feature '{name}', frame has {:?}",
                    self.target,
                    frame.column_names()
                ))
            })?;
            for (prediction, value) in predictions.iter_mut().zip(column) {
                *prediction += weight * value;
            }
        }

        Ok(predictions)
    }

    fn describe(&self) -> String {
        format!(
            "linear model for {} over {} features",
            self.target,
            self.coefficients.len()
        )
    }
}

/// Model predicting the same value for every row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantModel {
    pub target: String,
    pub value: f64,
}

impl Predictor for ConstantModel {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>> {
        Ok(vec![self.value; frame.row_count()])
    }

    fn describe(&self) -> String {
        format!("constant model for {} ({})", self.target, self.value)
    }
}
