//! Feature synthesis for the seven-day forecast
//!
//! Builds the model input for each future day. Humidity and temperature are
//! placeholder conditions rather than measurements; a pollutant's model may
//! additionally need lag features of its target and a humidity/temperature
//! interaction term.

use crate::models::{FeatureFrame, Pollutant};
use crate::{PmcastError, Result};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of days predicted per run
pub const FORECAST_HORIZON: usize = 7;

/// Placeholder relative humidity (%) per forecast day
pub const DEFAULT_HUMIDITY: [f64; FORECAST_HORIZON] = [50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0];

/// Placeholder temperature (°C) per forecast day
pub const DEFAULT_TEMPERATURE: [f64; FORECAST_HORIZON] = [25.0, 26.0, 27.0, 28.0, 29.0, 30.0, 31.0];

/// Placeholder target history used to derive lag features
pub const DEFAULT_LAG_SEED: [f64; FORECAST_HORIZON] = [40.0, 42.0, 45.0, 43.0, 41.0, 39.0, 38.0];

/// Deepest supported lag
pub const MAX_LAG_DEPTH: usize = 2;

/// Name of the pointwise humidity × temperature column
pub const INTERACTION_COLUMN: &str = "humidity_temperature";

/// Hand-specified weather inputs for the forecast window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    #[serde(default = "default_humidity")]
    pub humidity: Vec<f64>,
    #[serde(default = "default_temperature")]
    pub temperature: Vec<f64>,
}

fn default_humidity() -> Vec<f64> {
    DEFAULT_HUMIDITY.to_vec()
}

fn default_temperature() -> Vec<f64> {
    DEFAULT_TEMPERATURE.to_vec()
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            humidity: default_humidity(),
            temperature: default_temperature(),
        }
    }
}

impl Conditions {
    /// Both series must cover the full horizon with finite values
    pub fn validate(&self) -> Result<()> {
        check_series("humidity", &self.humidity)?;
        check_series("temperature", &self.temperature)?;
        Ok(())
    }
}

fn check_series(name: &str, values: &[f64]) -> Result<()> {
    if values.len() != FORECAST_HORIZON {
        return Err(PmcastError::config(format!(
            "{name} must have exactly {FORECAST_HORIZON} values, got {}",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PmcastError::config(format!("{name} contains non-finite values")));
    }
    Ok(())
}

/// How a pollutant's model input is derived from the base rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeaturePrep {
    /// `day`, `month`, `year`, `humidity`, `temperature`
    #[default]
    Calendar,
    /// `humidity`, `temperature`, target lags `1..=depth` and the interaction term
    LagInteraction {
        #[serde(default = "default_lag_depth")]
        depth: usize,
    },
}

fn default_lag_depth() -> usize {
    MAX_LAG_DEPTH
}

impl FeaturePrep {
    pub fn validate(&self) -> Result<()> {
        if let FeaturePrep::LagInteraction { depth } = self {
            if !(1..=MAX_LAG_DEPTH).contains(depth) {
                return Err(PmcastError::config(format!(
                    "lag depth must be between 1 and {MAX_LAG_DEPTH}, got {depth}"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn needs_seed(&self) -> bool {
        matches!(self, FeaturePrep::LagInteraction { .. })
    }

    /// Lag preparation needs a full, finite seed series; others ignore it
    pub fn check_seed(&self, seed: &[f64]) -> Result<()> {
        if self.needs_seed() {
            check_series("lag seed", seed)?;
        }
        Ok(())
    }
}

/// Date plus placeholder conditions for one forecast day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseRow {
    pub date: NaiveDate,
    pub humidity: f64,
    pub temperature: f64,
}

/// Builds base rows and per-pollutant feature frames
#[derive(Debug, Clone)]
pub struct FeatureSynthesizer {
    conditions: Conditions,
}

impl FeatureSynthesizer {
    pub fn new(conditions: Conditions) -> Result<Self> {
        conditions.validate()?;
        Ok(Self { conditions })
    }

    /// Consecutive calendar days starting at `start`
    pub fn forecast_dates(start: NaiveDate) -> Result<Vec<NaiveDate>> {
        (0..FORECAST_HORIZON as u64)
            .map(|offset| {
                start.checked_add_days(Days::new(offset)).ok_or_else(|| {
                    PmcastError::general(format!("date overflow adding {offset} days to {start}"))
                })
            })
            .collect()
    }

    /// Seven base rows on consecutive days from `start`
    pub fn synthesize(&self, start: NaiveDate) -> Result<Vec<BaseRow>> {
        let dates = Self::forecast_dates(start)?;
        Ok(dates
            .into_iter()
            .zip(&self.conditions.humidity)
            .zip(&self.conditions.temperature)
            .map(|((date, &humidity), &temperature)| BaseRow {
                date,
                humidity,
                temperature,
            })
            .collect())
    }

    /// Model input for one pollutant.
    ///
    /// `seed` is the target history lags are derived from; it is only read
    /// by [`FeaturePrep::LagInteraction`].
    pub fn frame(
        &self,
        start: NaiveDate,
        prep: &FeaturePrep,
        pollutant: Pollutant,
        seed: &[f64],
    ) -> Result<FeatureFrame> {
        prep.validate()?;
        let rows = self.synthesize(start)?;
        let mut frame = FeatureFrame::new(rows.iter().map(|r| r.date).collect());

        match prep {
            FeaturePrep::Calendar => {
                frame.insert("day", rows.iter().map(|r| f64::from(r.date.day())).collect())?;
                frame.insert("month", rows.iter().map(|r| f64::from(r.date.month())).collect())?;
                frame.insert("year", rows.iter().map(|r| f64::from(r.date.year())).collect())?;
                frame.insert("humidity", self.conditions.humidity.clone())?;
                frame.insert("temperature", self.conditions.temperature.clone())?;
            }
            FeaturePrep::LagInteraction { depth } => {
                prep.check_seed(seed)?;
                frame.insert("humidity", self.conditions.humidity.clone())?;
                frame.insert("temperature", self.conditions.temperature.clone())?;
                for periods in 1..=*depth {
                    let lagged = backfill(&shift(seed, periods))?;
                    frame.insert(lag_column(pollutant, periods), lagged)?;
                }
                frame.insert(
                    INTERACTION_COLUMN,
                    interaction(&self.conditions.humidity, &self.conditions.temperature),
                )?;
            }
        }

        debug!(
            pollutant = pollutant.column(),
            columns = ?frame.column_names(),
            "Synthesized feature frame"
        );
        Ok(frame)
    }
}

/// Column name of the `periods`-step lag of `pollutant`
#[must_use]
pub fn lag_column(pollutant: Pollutant, periods: usize) -> String {
    format!("{}_lag{periods}", pollutant.feature_prefix())
}

/// Shift values down by `periods`, leaving leading gaps
#[must_use]
pub fn shift(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(periods).map(|src| values[src]))
        .collect()
}

/// Fill each gap with the next known value
pub fn backfill(values: &[Option<f64>]) -> Result<Vec<f64>> {
    let mut filled = vec![0.0; values.len()];
    let mut next_known = None;
    for (i, value) in values.iter().enumerate().rev() {
        if value.is_some() {
            next_known = *value;
        }
        filled[i] = next_known.ok_or_else(|| {
            PmcastError::prediction(format!("no known value to back-fill position {i}"))
        })?;
    }
    Ok(filled)
}

/// Pointwise product of two equally long series
#[must_use]
pub fn interaction(left: &[f64], right: &[f64]) -> Vec<f64> {
    left.iter().zip(right).map(|(a, b)| a * b).collect()
}
