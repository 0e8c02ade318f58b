//! Vault configuration.

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::env;

/// Half-width, in multiples of the tick spacing, of a freshly registered range.
pub const DEFAULT_TICK_WIDTH: u32 = 100;

/// Environment variable overriding [`DEFAULT_TICK_WIDTH`].
pub const TICK_WIDTH_ENV: &str = "TICK_VAULT_DEFAULT_TICK_WIDTH";

/// Configuration for the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Half-width used when a pool is registered.
    pub default_tick_width: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            default_tick_width: DEFAULT_TICK_WIDTH,
        }
    }
}

impl VaultConfig {
    /// Builds a configuration from the environment, falling back to defaults
    /// for unset variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = env::var(TICK_WIDTH_ENV) {
            config.default_tick_width = parse_tick_width(&raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Sets the default tick width.
    #[must_use]
    pub fn with_default_tick_width(mut self, width: u32) -> Self {
        self.default_tick_width = width;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_tick_width == 0 {
            return Err(VaultError::InvalidTickWidth);
        }
        Ok(())
    }
}

fn parse_tick_width(raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|e| VaultError::Config(format!("{TICK_WIDTH_ENV}={raw:?}: {e}")))
}
