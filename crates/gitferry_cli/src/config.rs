//! Configuration file support for the gitferry CLI.
//!
//! Configuration is loaded with the following precedence (highest to
//! lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `GITFERRY_`, e.g.,
//!    `GITFERRY_GITHUB_TOKEN`)
//! 3. Config file (~/.config/gitferry/config.toml or ./gitferry.toml)
//! 4. Built-in defaults
//!
//! The active repository itself (`[repository]`) is persisted by the
//! engine's own store; this file only carries CLI-side tuning.
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use GITFERRY_GITHUB_TOKEN env var
//!
//! [transfer]
//! requests_per_second = 10
//! max_attempts = 3
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level CLI configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// Transfer tuning.
    pub transfer: TransferConfig,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token, used by `configure` when no flag is given.
    /// Can also be set via GITFERRY_GITHUB_TOKEN environment variable.
    pub token: Option<String>,
}

/// Transfer tuning options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Proactive rate limit for API requests.
    pub requests_per_second: u32,
    /// Maximum attempts per remote write.
    pub max_attempts: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            max_attempts: 3,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/gitferry/config.toml)
    /// 3. Local config file (./gitferry.toml)
    /// 4. Environment variables with GITFERRY_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "gitferry") {
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

        let local_config = PathBuf::from("gitferry.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./gitferry.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("GITFERRY")
                .separator("_")
                .try_parsing(true),
        );

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

    /// Get the GitHub token from config or environment.
    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone()
    }
}
