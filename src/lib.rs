//! `pmcast` - seven-day particulate matter forecast dashboard
//!
//! This library provides model loading, feature synthesis, batch prediction
//! and presentation for a PM10 / PM2.5 forecast page, plus a standalone CSV
//! upload viewer.

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod predictor;
pub mod presenter;
pub mod render;
pub mod telemetry;
pub mod upload;
pub mod web;

// Re-export core types for public API
pub use config::PmcastConfig;
pub use error::PmcastError;
pub use features::{Conditions, FORECAST_HORIZON, FeaturePrep, FeatureSynthesizer};
pub use models::{FeatureFrame, Forecast, ForecastRow, Pollutant, PredictionStatus};
pub use pipeline::{ForecastPipeline, PollutantStage};
pub use predictor::{ModelLoader, Predictor, ZeroPredictor};
pub use presenter::{ChartKind, DashboardView, Presenter};
pub use upload::UploadOutcome;
pub use web::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PmcastError>;
