//! Configuration management for the contract deployer
//!
//! Loads optional TOML settings with environment variable substitution.
//! Every field has a default, so running without a config file deploys to
//! Arbitrum Sepolia with the stock fee heuristics.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at the config file
pub const CONFIG_ENV: &str = "DEPLOYER_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "deployer.toml";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpc_url: String,
    pub artifact_path: PathBuf,
    pub output_path: PathBuf,
    /// Block explorer base used for the address link in logs
    pub explorer_url: Option<String>,
    pub gas: GasConfig,
    pub confirmation: ConfirmationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    /// Gas limit used when estimation fails
    pub default_gas_limit: u64,
    /// Safety margin applied to the network estimate (120 = +20%)
    pub gas_limit_multiplier_percent: u64,
    /// `max_fee_per_gas` = observed gas price × this
    pub max_fee_multiplier: u64,
    pub max_priority_fee_wei: u64,
    /// Abort instead of falling back to `default_gas_limit`
    pub strict_gas_estimation: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".to_string(),
            artifact_path: PathBuf::from("target/wasm32-unknown-unknown/release/dataloom.wasm"),
            output_path: PathBuf::from("deployed-address.txt"),
            explorer_url: Some("https://sepolia.arbiscan.io".to_string()),
            gas: GasConfig::default(),
            confirmation: ConfirmationConfig::default(),
        }
    }
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            default_gas_limit: 10_000_000,
            gas_limit_multiplier_percent: 120,
            max_fee_multiplier: 2,
            // 0.1 gwei
            max_priority_fee_wei: 100_000_000,
            strict_gas_estimation: false,
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            poll_interval_ms: 1_000,
        }
    }
}

impl ConfirmationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Settings {
    /// Load settings from an explicit path, `$DEPLOYER_CONFIG`, or
    /// `deployer.toml` in the working directory.
    ///
    /// Only the implicit default path may be absent; an explicitly named
    /// file that cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (config_path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => match env::var(CONFIG_ENV) {
                Ok(path) => (PathBuf::from(path), true),
                Err(_) => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
            },
        };

        if !required && !config_path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", config_path);
            let settings = Self::default();
            settings.validate()?;
            return Ok(settings);
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml(&config_str)
    }

    /// Parse settings from TOML text after `${VAR}` substitution
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            anyhow::bail!("rpc_url must not be empty");
        }
        if self.gas.gas_limit_multiplier_percent < 100 {
            anyhow::bail!(
                "gas_limit_multiplier_percent must be at least 100, got {}",
                self.gas.gas_limit_multiplier_percent
            );
        }
        if self.gas.max_fee_multiplier == 0 {
            anyhow::bail!("max_fee_multiplier must be positive");
        }
        if self.gas.default_gas_limit == 0 {
            anyhow::bail!("default_gas_limit must be positive");
        }
        if self.confirmation.poll_interval_ms == 0 {
            anyhow::bail!("confirmation.poll_interval_ms must be positive");
        }
        if self.confirmation.timeout_secs == 0 {
            tracing::warn!("confirmation.timeout_secs is 0 - every deployment will time out");
        }

        Ok(())
    }

    /// Explorer link for an address, if an explorer is configured
    pub fn explorer_address_url(&self, address: &str) -> Option<String> {
        self.explorer_url
            .as_deref()
            .map(|base| format!("{}/address/{}", base.trim_end_matches('/'), address))
    }
}

lazy_static! {
    static ref ENV_VAR_PATTERN: Regex =
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid");
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
