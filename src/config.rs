//! TOML configuration file.
//!
//! Every section and field is optional; a missing file is only an error when
//! a path was given explicitly.
//!
//! ```toml
//! [profile]
//! mode = "ground"
//! architecture = "riscv"
//! max_thrust_override_n = 3500
//!
//! [demo]
//! ticks = 3
//! format = "table"
//!
//! [environment]
//! drift_c_per_tick = 5
//! fault_after_ticks = 3
//! ```

use crate::fault_injection::EnvironmentConfig;
use crate::profile::{Architecture, Mode, ProfileSelection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_DEMO_TICKS: u32 = 3;
pub const MAX_DEMO_TICKS: u32 = 10_000;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Compact,
}

impl core::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "compact" => Ok(OutputFormat::Compact),
            other => Err(ConfigError::ValidationError(format!(
                "unknown output format '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSection {
    pub mode: Option<Mode>,
    pub architecture: Option<Architecture>,
    pub max_thrust_override_n: Option<u32>,
}

impl ProfileSection {
    pub fn selection(&self) -> ProfileSelection {
        let mut selection = ProfileSelection {
            max_thrust_override_n: self.max_thrust_override_n,
            ..ProfileSelection::default()
        };
        if let Some(mode) = self.mode {
            selection = selection.with_mode(mode);
        }
        if let Some(architecture) = self.architecture {
            selection = selection.with_architecture(architecture);
        }
        selection
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSection {
    pub ticks: u32,
    pub format: OutputFormat,
    /// Run the signal-fault / final-tick sequence after the drift ticks.
    pub exercise_fault: bool,
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_DEMO_TICKS,
            format: OutputFormat::default(),
            exercise_fault: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrustgateConfig {
    pub profile: ProfileSection,
    pub demo: DemoSection,
    pub environment: EnvironmentConfig,
}

impl ThrustgateConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.demo.ticks > MAX_DEMO_TICKS {
            return Err(ConfigError::ValidationError(format!(
                "demo.ticks {} exceeds {MAX_DEMO_TICKS}",
                self.demo.ticks
            )));
        }
        if self.environment.fault_after_ticks == Some(0) {
            return Err(ConfigError::ValidationError(
                "environment.fault_after_ticks must be at least 1".to_string(),
            ));
        }
        if self.environment.sensor_dropout_at_tick == Some(0) {
            return Err(ConfigError::ValidationError(
                "environment.sensor_dropout_at_tick must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
