//! Host-level configuration.
//!
//! # Responsibility
//! - Parse the JSON configuration object a host passes at startup.
//! - Validate breakpoint ordering and the sweep period before use.
//!
//! # Invariants
//! - A validated config always resolves to `tablet < desktop`.
//! - A validated config never has a zero sweep interval.

use crate::model::props::{classify_assets, AssetItem};
use crate::model::viewport::{BreakpointConfig, BreakpointOverrides};
use crate::registry::DEFAULT_SWEEP_INTERVAL;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

fn default_sweep_interval_ms() -> u64 {
    DEFAULT_SWEEP_INTERVAL.as_millis() as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    #[serde(default)]
    pub breakpoints: BreakpointOverrides,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Stylesheet URLs or inline CSS injected into every fragment.
    #[serde(default)]
    pub style: Vec<String>,
    /// Script URLs or inline sources run once per host.
    #[serde(default)]
    pub script: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            breakpoints: BreakpointOverrides::default(),
            sweep_interval_ms: default_sweep_interval_ms(),
            style: Vec::new(),
            script: Vec::new(),
        }
    }
}

impl ScopeConfig {
    /// Parses and validates a JSON config object.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let resolved = self.breakpoints.resolve();
        if !resolved.is_valid() {
            return Err(ConfigError::InvalidBreakpoints {
                tablet: resolved.tablet,
                desktop: resolved.desktop,
            });
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }
        Ok(())
    }

    pub fn breakpoint_config(&self) -> BreakpointConfig {
        self.breakpoints.resolve()
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn styles(&self) -> Vec<AssetItem> {
        classify_assets(&self.style)
    }

    pub fn scripts(&self) -> Vec<AssetItem> {
        classify_assets(&self.script)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Malformed(String),
    InvalidBreakpoints { tablet: u32, desktop: u32 },
    ZeroSweepInterval,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "config is malformed: {message}"),
            Self::InvalidBreakpoints { tablet, desktop } => write!(
                f,
                "tablet breakpoint {tablet} must be below desktop breakpoint {desktop}"
            ),
            Self::ZeroSweepInterval => write!(f, "sweep interval must be non-zero"),
        }
    }
}

impl Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}
