//! Forecast pipeline
//!
//! Synthesizes the feature frames, runs every configured pollutant model and
//! merges the predictions into one [`Forecast`]. Model failures never abort a
//! run: the affected pollutant is filled with zeros and marked degraded.

use crate::config::{PmcastConfig, PollutantConfig};
use crate::features::{Conditions, DEFAULT_LAG_SEED, FeaturePrep, FeatureSynthesizer};
use crate::models::{
    FeatureFrame, Forecast, ForecastRow, Pollutant, PollutantOutcome, PredictionStatus,
};
use crate::predictor::{ModelLoader, Predictor, ZeroPredictor};
use crate::{PmcastError, Result};
use chrono::{Local, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, instrument, warn};

/// Columns already stored on every row; everything else is a derived feature
const BASE_COLUMNS: [&str; 5] = ["day", "month", "year", "humidity", "temperature"];

/// Model plus feature preparation for one pollutant
#[derive(Debug)]
pub struct PollutantStage {
    pollutant: Pollutant,
    predictor: Box<dyn Predictor>,
    prep: FeaturePrep,
    lag_seed: Vec<f64>,
    load_error: Option<String>,
}

impl PollutantStage {
    #[must_use]
    pub fn new(pollutant: Pollutant, predictor: Box<dyn Predictor>, prep: FeaturePrep) -> Self {
        Self {
            pollutant,
            predictor,
            prep,
            lag_seed: DEFAULT_LAG_SEED.to_vec(),
            load_error: None,
        }
    }

    /// Stage whose model could not be loaded; predicts zeros
    #[must_use]
    pub fn degraded<S: Into<String>>(pollutant: Pollutant, prep: FeaturePrep, reason: S) -> Self {
        Self {
            load_error: Some(reason.into()),
            ..Self::new(pollutant, Box::new(ZeroPredictor), prep)
        }
    }

    #[must_use]
    pub fn with_lag_seed(mut self, lag_seed: Vec<f64>) -> Self {
        self.lag_seed = lag_seed;
        self
    }

    /// Load the configured model, degrading to zeros when loading fails
    pub fn from_config(config: &PollutantConfig) -> Self {
        let stage = match ModelLoader::load(&config.model_path, config.pollutant) {
            Ok(predictor) => Self::new(config.pollutant, predictor, config.features.clone()),
            Err(e) => {
                warn!("Using zero predictions for {}: {}", config.pollutant, e);
                Self::degraded(config.pollutant, config.features.clone(), e.to_string())
            }
        };
        stage.with_lag_seed(config.lag_seed.clone())
    }

    #[must_use]
    pub fn pollutant(&self) -> Pollutant {
        self.pollutant
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.load_error.is_some()
    }

    fn frame(&self, synthesizer: &FeatureSynthesizer, start: NaiveDate) -> Result<FeatureFrame> {
        synthesizer.frame(start, &self.prep, self.pollutant, &self.lag_seed)
    }

    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>> {
        let predictions = self.predictor.predict(frame)?;
        if predictions.len() != frame.row_count() {
            return Err(PmcastError::prediction(format!(
                "{} returned {} values for {} rows",
                self.predictor.describe(),
                predictions.len(),
                frame.row_count()
            )));
        }
        if let Some(row) = predictions.iter().position(|v| !v.is_finite()) {
            return Err(PmcastError::prediction(format!(
                "{} returned non-finite value {} for {}",
                self.predictor.describe(),
                predictions[row],
                frame.dates()[row]
            )));
        }
        Ok(predictions)
    }
}

/// Stage result merged into the forecast rows
struct StageResult {
    values: Vec<f64>,
    features: Vec<(String, Vec<f64>)>,
    status: PredictionStatus,
}

/// Synthesize, predict, merge
#[derive(Debug)]
pub struct ForecastPipeline {
    synthesizer: FeatureSynthesizer,
    stages: Vec<PollutantStage>,
}

/// Assembles a [`ForecastPipeline`]
#[derive(Debug, Default)]
pub struct ForecastPipelineBuilder {
    conditions: Conditions,
    stages: Vec<PollutantStage>,
}

impl ForecastPipelineBuilder {
    #[must_use]
    pub fn conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    #[must_use]
    pub fn pollutant(mut self, stage: PollutantStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Result<ForecastPipeline> {
        if self.stages.is_empty() {
            return Err(PmcastError::config("at least one pollutant is required"));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.pollutant) {
                return Err(PmcastError::config(format!(
                    "pollutant {} added more than once",
                    stage.pollutant
                )));
            }
            stage.prep.validate()?;
        }

        Ok(ForecastPipeline {
            synthesizer: FeatureSynthesizer::new(self.conditions)?,
            stages: self.stages,
        })
    }
}

impl ForecastPipeline {
    #[must_use]
    pub fn builder() -> ForecastPipelineBuilder {
        ForecastPipelineBuilder::default()
    }

    /// Load every configured model and assemble the pipeline
    pub fn from_config(config: &PmcastConfig) -> Result<Self> {
        config
            .pollutants
            .iter()
            .map(PollutantStage::from_config)
            .fold(
                Self::builder().conditions(config.conditions.clone()),
                ForecastPipelineBuilder::pollutant,
            )
            .build()
    }

    #[must_use]
    pub fn stages(&self) -> &[PollutantStage] {
        &self.stages
    }

    /// Forecast starting from the local calendar date
    pub fn run_today(&self) -> Result<Forecast> {
        self.run(Local::now().date_naive())
    }

    /// Forecast the horizon starting at `start`
    #[instrument(skip(self), fields(pollutants = self.stages.len()))]
    pub fn run(&self, start: NaiveDate) -> Result<Forecast> {
        let mut rows: Vec<ForecastRow> = self
            .synthesizer
            .synthesize(start)?
            .into_iter()
            .map(|base| ForecastRow {
                date: base.date,
                humidity: base.humidity,
                temperature: base.temperature,
                features: BTreeMap::new(),
                predictions: BTreeMap::new(),
            })
            .collect();

        let mut outcomes = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let result = self.run_stage(stage, start, rows.len());

            for (row, value) in rows.iter_mut().zip(&result.values) {
                row.predictions.insert(stage.pollutant, *value);
            }
            for (name, values) in result.features {
                for (row, value) in rows.iter_mut().zip(values) {
                    row.features.insert(name.clone(), value);
                }
            }

            outcomes.push(PollutantOutcome {
                pollutant: stage.pollutant,
                status: result.status,
            });
        }

        let forecast = Forecast {
            generated_on: start,
            rows,
            outcomes,
        };
        info!(
            "Forecast generated from {} ({} degraded)",
            start,
            forecast.degraded().count()
        );
        Ok(forecast)
    }

    fn run_stage(&self, stage: &PollutantStage, start: NaiveDate, row_count: usize) -> StageResult {
        let frame = match stage.frame(&self.synthesizer, start) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Feature preparation for {} failed: {}", stage.pollutant, e);
                return StageResult {
                    values: vec![0.0; row_count],
                    features: Vec::new(),
                    status: PredictionStatus::Degraded {
                        reason: e.to_string(),
                    },
                };
            }
        };

        let features = frame
            .columns()
            .iter()
            .filter(|c| !BASE_COLUMNS.contains(&c.name.as_str()))
            .map(|c| (c.name.clone(), c.values.clone()))
            .collect();

        if let Some(reason) = &stage.load_error {
            return StageResult {
                values: ZeroPredictor.predict(&frame).unwrap_or_else(|_| vec![0.0; row_count]),
                features,
                status: PredictionStatus::Degraded {
                    reason: reason.clone(),
                },
            };
        }

        match stage.predict(&frame) {
            Ok(values) => StageResult {
                values,
                features,
                status: PredictionStatus::Model,
            },
            Err(e) => {
                warn!("Prediction for {} failed: {}", stage.pollutant, e);
                StageResult {
                    values: vec![0.0; row_count],
                    features,
                    status: PredictionStatus::Degraded {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }
}
