//! Data models for the pmcast dashboard
//!
//! This module contains the core domain models organized by concern:
//! - Pollutant: forecast targets and their units
//! - Frame: the feature table handed to a model
//! - Forecast: predicted rows and per-pollutant status

pub mod forecast;
pub mod frame;
pub mod pollutant;

// Re-export all public types for convenient access
pub use forecast::{Forecast, ForecastRow, PollutantOutcome, PredictionStatus};
pub use frame::{FeatureColumn, FeatureFrame};
pub use pollutant::{CONCENTRATION_UNIT, Pollutant};
