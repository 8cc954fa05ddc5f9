//! Tunables for a construction session.
//!
//! Every field has a default, so an empty JSON object (or no file at all) yields a usable
//! configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Placement attempts before a transient failure is surfaced.
pub const DEFAULT_PLACE_ATTEMPTS: u32 = 3;

/// Item used by the pour primitive.
pub const DEFAULT_LIQUID_ITEM: &str = "water_bucket";

/// Block name the environment reports for an empty cell.
pub const AIR: &str = "air";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub place_attempts: u32,
    /// Upper bound on waiting for a look-at acknowledgment before placing anyway.
    pub look_settle_ms: u64,
    /// Wait after pouring so the liquid can spread.
    pub pour_settle_ms: u64,
    /// Wait after each acquisition request.
    pub provision_settle_ms: u64,
    pub liquid_item: String,
    pub eye_height: f64,
    /// Refuse placement when the insertion cell is already filled.
    pub check_target_empty: bool,
    pub navigate_tolerance: f64,
    /// Acquisition command; `{item}` and `{count}` are substituted.
    pub acquire_command: String,
    pub air_block: String,
    /// Polling interval for repetitive actions such as timed jumping.
    pub tick_ms: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            place_attempts: DEFAULT_PLACE_ATTEMPTS,
            look_settle_ms: 200,
            pour_settle_ms: 1000,
            provision_settle_ms: 500,
            liquid_item: DEFAULT_LIQUID_ITEM.to_string(),
            eye_height: 1.62,
            check_target_empty: false,
            navigate_tolerance: 1.0,
            acquire_command: "/give @s {item} {count}".to_string(),
            air_block: AIR.to_string(),
            tick_ms: 50,
        }
    }
}

impl BuildConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.place_attempts == 0 {
            return Err(ConfigError::Invalid(
                "place_attempts must be at least 1".to_string(),
            ));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be positive".to_string()));
        }
        if !self.acquire_command.contains("{item}") || !self.acquire_command.contains("{count}") {
            return Err(ConfigError::Invalid(format!(
                "acquire_command `{}` must contain {{item}} and {{count}}",
                self.acquire_command
            )));
        }
        Ok(())
    }

    pub fn look_settle(&self) -> Duration {
        Duration::from_millis(self.look_settle_ms)
    }

    pub fn pour_settle(&self) -> Duration {
        Duration::from_millis(self.pour_settle_ms)
    }

    pub fn provision_settle(&self) -> Duration {
        Duration::from_millis(self.provision_settle_ms)
    }

    /// Never shorter than one millisecond, so tick-counted loops always advance.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Renders the acquisition command for one item.
    pub fn acquire_command_for(&self, item: &str, count: u32) -> String {
        self.acquire_command
            .replace("{item}", item)
            .replace("{count}", &count.to_string())
    }
}
