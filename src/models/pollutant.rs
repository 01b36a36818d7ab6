//! Forecast targets and their display metadata

use serde::{Deserialize, Serialize};
use std::fmt;

/// Concentration unit shared by all particulate-matter targets
pub const CONCENTRATION_UNIT: &str = "µg/m³";

/// Particulate-matter metric predicted by a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    /// Particles up to 10 µm
    #[serde(rename = "pm10")]
    Pm10,
    /// Particles up to 2.5 µm
    #[serde(rename = "pm2.5")]
    Pm25,
}

impl Pollutant {
    /// Column name the predictions are stored under
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Pollutant::Pm10 => "pm10",
            Pollutant::Pm25 => "pm2.5",
        }
    }

    /// Identifier safe to embed in feature column names
    #[must_use]
    pub fn feature_prefix(self) -> &'static str {
        match self {
            Pollutant::Pm10 => "pm10",
            Pollutant::Pm25 => "pm2_5",
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Pm10 => "PM10",
            Pollutant::Pm25 => "PM2.5",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        CONCENTRATION_UNIT
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
