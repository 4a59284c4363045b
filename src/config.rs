//! Settings for driving a CTRNN.
//!
//! Supports YAML settings files with sensible defaults; every section may be
//! omitted.

use crate::neural::ParameterMapper;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Genome-to-parameter ranges
    #[serde(default)]
    pub mapping: ParameterMapper,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stepping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Integration step (delta time) shared by all nodes
    pub time_step: f64,
    /// Default number of steps for a run
    pub steps: u64,
    /// Steps between output reports
    pub report_interval: u64,
    /// Steps between checkpoints (0 disables periodic checkpoints)
    pub checkpoint_interval: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 0.1,
            steps: 1000,
            report_interval: 100,
            checkpoint_interval: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate settings values
    pub fn validate(&self) -> Result<(), String> {
        let dt = self.simulation.time_step;
        if !dt.is_finite() || dt <= 0.0 {
            return Err("time_step must be a positive number".to_string());
        }
        if self.simulation.report_interval == 0 {
            return Err("report_interval must be > 0".to_string());
        }
        self.mapping.validate().map_err(|e| e.to_string())?;
        Ok(())
    }
}
