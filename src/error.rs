//! Error types and handling for `pmcast`

use thiserror::Error;

/// Main error type for the `pmcast` dashboard
#[derive(Error, Debug)]
pub enum PmcastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A serialized model could not be read or decoded
    #[error("Failed to load model from {path}: {message}")]
    ModelLoad { path: String, message: String },

    /// A model rejected its input or returned an unusable output
    #[error("Prediction error: {message}")]
    Prediction { message: String },

    /// Uploaded file could not be decoded or parsed
    #[error("Upload error: {message}")]
    Upload { message: String },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl PmcastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new model loading error
    pub fn model_load<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new prediction error
    pub fn prediction<S: Into<String>>(message: S) -> Self {
        Self::Prediction {
            message: message.into(),
        }
    }

    /// Create a new upload error
    pub fn upload<S: Into<String>>(message: S) -> Self {
        Self::Upload {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PmcastError::Config { .. } => {
                "Configuration error. Please check your pmcast.toml and PMCAST__ variables."
                    .to_string()
            }
            PmcastError::ModelLoad { path, .. } => {
                format!("Model file {path} could not be loaded. Showing placeholder values.")
            }
            PmcastError::Prediction { .. } => {
                "The forecast model failed. Showing placeholder values.".to_string()
            }
            PmcastError::Upload { message } => message.clone(),
            PmcastError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = PmcastError::config("missing pollutant");
        assert!(matches!(config_err, PmcastError::Config { .. }));

        let load_err = PmcastError::model_load("models/pm10.json", "not found");
        assert!(matches!(load_err, PmcastError::ModelLoad { .. }));
        assert!(load_err.to_string().contains("models/pm10.json"));

        let predict_err = PmcastError::prediction("shape mismatch");
        assert!(matches!(predict_err, PmcastError::Prediction { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = PmcastError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let load_err = PmcastError::model_load("pm10.json", "gone");
        assert!(load_err.user_message().contains("placeholder"));

        let upload_err = PmcastError::upload("bad payload");
        assert_eq!(upload_err.user_message(), "bad payload");
    }
}
