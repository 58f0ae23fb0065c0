//! Experiment configuration - TOML file with per-field defaults

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::controller::{AntiWindup, OutputBounds, PidController, PidGains};
use crate::error::{ConfigError, ControllerError};
use crate::logger::DEFAULT_LOG_FILE;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub controller: ControllerConfig,
    pub logger: LoggerConfig,
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub setpoint: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub output_min: f64,
    pub output_max: f64,
    pub anti_windup: AntiWindup,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let gains = PidGains::default();
        Self {
            setpoint: 0.5,
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            output_min: 0.0,
            output_max: 1.0,
            anti_windup: AntiWindup::default(),
        }
    }
}

impl ControllerConfig {
    pub fn build(&self) -> Result<PidController, ControllerError> {
        let bounds = OutputBounds::new(self.output_min, self.output_max)?;
        Ok(
            PidController::new(self.setpoint, PidGains::new(self.kp, self.ki, self.kd), bounds)
                .with_anti_windup(self.anti_windup),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_file: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub iterations: u64,
    pub sample_interval_ms: u64,
    pub seed: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            sample_interval_ms: 1000,
            seed: 42,
        }
    }
}

// ============================================================================
// CONFIG FILE LOADING
// ============================================================================

/// Parse and validate a TOML document.
pub fn parse_config(text: &str) -> Result<ExperimentConfig, ConfigError> {
    let config: ExperimentConfig = toml::from_str(text)?;
    config.controller.build()?;
    Ok(config)
}

/// Load from `path`. A missing file yields the defaults; anything else that
/// goes wrong is an error.
pub fn load_config(path: impl AsRef<Path>) -> Result<ExperimentConfig, ConfigError> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(s) => parse_config(&s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(ExperimentConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
