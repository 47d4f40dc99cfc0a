// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridPulse.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result, bail};
use gridpulse_core::GridConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    /// `[upstream]`, `[defaults]`, `[emission_factors]` and `[extraction]`
    #[serde(flatten)]
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Dashboard assets served as-is
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            static_dir: default_static_dir(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Parse a config file. Values are checked by [`ServerConfig::load`], not here
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config TOML")
    }

    /// Config file if present, otherwise defaults; environment overrides on top
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`ServerConfig::load`] with a custom environment lookup. Validation runs once,
    /// after the overrides
    pub fn load_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Apply `ISO_NE_API_URL`, `ISO_USERNAME`, `ISO_PASSWORD`, `LOG_LEVEL` and `PORT`
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ISO_NE_API_URL") {
            self.grid.upstream.base_url = url;
        }
        if let Some(username) = lookup("ISO_USERNAME") {
            self.grid.upstream.username = username;
        }
        if let Some(password) = lookup("ISO_PASSWORD") {
            self.grid.upstream.password = password;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.server.log_level = level.to_lowercase();
        }
        if let Some(port) = lookup("PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            self.server.port = port;
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.bind_address.trim().is_empty() {
            bail!("server.bind_address must be set");
        }
        if self.server.log_level.trim().is_empty() {
            bail!("server.log_level must be set");
        }
        self.grid.validate()
    }
}
