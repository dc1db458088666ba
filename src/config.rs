//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::constants::{DEFAULT_ARTIFACT_PATH, DEFAULT_PORT, DEFAULT_SIMULATION_DATA};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Artifact bundle written by the trainer
    pub artifact_path: PathBuf,

    /// Unlabeled traffic replayed by `/simulate`
    pub simulation_data_path: PathBuf,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            simulation_data_path: PathBuf::from(DEFAULT_SIMULATION_DATA),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            artifact_path: env::var("ARTIFACT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_path),

            simulation_data_path: env::var("SIMULATION_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.simulation_data_path),

            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.artifact_path, PathBuf::from("artifacts/model_artifacts.json"));
        assert_eq!(config.environment, "development");
    }
}
