//! Configuration file support for granary.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `GRANARY_`, e.g., `GRANARY_GITHUB_TOKEN`)
//! 2. Local config file (./granary.toml)
//! 3. XDG config file (~/.config/granary/config.toml)
//! 4. Legacy environment variables (`GITHUB_PAT`, `POSTGRES_URL`)
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."          # or use GRANARY_GITHUB_TOKEN env var
//! api_base = "https://github.example.com/api/v3/"  # GitHub Enterprise only
//!
//! [warehouse]
//! url = "postgres://localhost/warehouse"  # or use GRANARY_WAREHOUSE_URL env var
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// A required setting was not found in any configuration source.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {key}: set {hint} or add it to granary.toml")]
    Missing {
        key: &'static str,
        hint: &'static str,
    },
}

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub configuration.
    pub github: GithubSection,
    /// Warehouse database configuration.
    pub warehouse: WarehouseSection,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GithubSection {
    /// GitHub API token.
    /// Can also be set via GRANARY_GITHUB_TOKEN, or the legacy GITHUB_PAT.
    pub token: Option<String>,
    /// API base URL override for GitHub Enterprise. File-only setting.
    pub api_base: Option<String>,
}

/// Warehouse database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WarehouseSection {
    /// Postgres connection URL.
    /// Can also be set via GRANARY_WAREHOUSE_URL, or the legacy POSTGRES_URL.
    pub url: Option<String>,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. XDG config file (~/.config/granary/config.toml)
    /// 2. Local config file (./granary.toml)
    /// 3. Environment variables with GRANARY_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        // Add XDG config file if it exists
        if let Some(proj_dirs) = ProjectDirs::from("", "", "granary") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Add local config file (higher priority than XDG)
        let local_config = PathBuf::from("granary.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./granary.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // Add GRANARY_ prefixed environment variables
        // e.g., GRANARY_WAREHOUSE_URL -> warehouse.url
        builder = builder.add_source(
            Environment::with_prefix("GRANARY")
                .separator("_")
                .try_parsing(true),
        );

        // Build the config and deserialize
        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the GitHub token, falling back to the legacy GITHUB_PAT variable.
    pub fn github_token(&self) -> Result<String, ConfigError> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_PAT").ok())
            .ok_or(ConfigError::Missing {
                key: "GitHub token",
                hint: "GRANARY_GITHUB_TOKEN (or legacy GITHUB_PAT)",
            })
    }

    /// Get the warehouse URL, falling back to the legacy POSTGRES_URL variable.
    pub fn warehouse_url(&self) -> Result<String, ConfigError> {
        self.warehouse
            .url
            .clone()
            .or_else(|| std::env::var("POSTGRES_URL").ok())
            .ok_or(ConfigError::Missing {
                key: "warehouse database URL",
                hint: "GRANARY_WAREHOUSE_URL (or legacy POSTGRES_URL)",
            })
    }

    /// Get the API base override, if one is configured.
    pub fn api_base(&self) -> Option<String> {
        self.github.api_base.clone()
    }
}
