//! Seven-day forecast produced once per process start

use super::Pollutant;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One future day of the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// Calendar day this row predicts
    pub date: NaiveDate,
    /// Relative humidity in percent (placeholder input)
    pub humidity: f64,
    /// Temperature in Celsius (placeholder input)
    pub temperature: f64,
    /// Derived lag/interaction features, empty for calendar-only models
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, f64>,
    /// Predicted concentration per pollutant
    pub predictions: BTreeMap<Pollutant, f64>,
}

impl ForecastRow {
    #[must_use]
    pub fn prediction(&self, pollutant: Pollutant) -> Option<f64> {
        self.predictions.get(&pollutant).copied()
    }
}

/// How the values of one pollutant were obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionStatus {
    /// Values came from the loaded model
    Model,
    /// Model failed to load or predict, values are zeros
    Degraded { reason: String },
}

/// Prediction status of one pollutant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantOutcome {
    pub pollutant: Pollutant,
    #[serde(flatten)]
    pub status: PredictionStatus,
}

/// Complete forecast: ordered rows plus per-pollutant status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Day the forecast was generated (first row's date)
    pub generated_on: NaiveDate,
    /// Rows sorted by date, one per day
    pub rows: Vec<ForecastRow>,
    /// Pollutants in configuration order
    pub outcomes: Vec<PollutantOutcome>,
}

impl Forecast {
    /// Today's row
    #[must_use]
    pub fn today(&self) -> Option<&ForecastRow> {
        self.rows.first()
    }

    /// Forecast pollutants in configuration order
    pub fn pollutants(&self) -> impl Iterator<Item = Pollutant> + '_ {
        self.outcomes.iter().map(|o| o.pollutant)
    }

    /// Predicted values of one pollutant in row order (zero where missing)
    #[must_use]
    pub fn series(&self, pollutant: Pollutant) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.prediction(pollutant).unwrap_or(0.0))
            .collect()
    }

    /// Outcomes whose values are placeholders
    pub fn degraded(&self) -> impl Iterator<Item = &PollutantOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PredictionStatus::Degraded { .. }))
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded().next().is_some()
    }
}
