//! Persistence of the active repository configuration.
//!
//! The engine only needs one document: the caller's `RepositoryConfig`.
//! It is kept in a TOML file under the user's config directory, edited
//! section-scoped so unrelated settings and comments survive.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;
use toml_edit::{DocumentMut, value};

use crate::remote::{DEFAULT_BRANCH, RepositoryConfig};

/// Errors from configuration persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config file: {0}")]
    Parse(String),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Storage for the active repository configuration.
pub trait ConfigStore {
    /// Load the persisted configuration, if any.
    fn load(&self) -> Result<Option<RepositoryConfig>, StoreError>;

    /// Persist a configuration, replacing any previous one.
    fn save(&self, config: &RepositoryConfig) -> Result<(), StoreError>;

    /// Remove the persisted configuration, keeping unrelated settings.
    fn clear(&self) -> Result<(), StoreError>;
}

/// TOML-file-backed configuration store.
///
/// Writes only the `[repository]` table of the file, preserving
/// formatting and any other content.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    /// Create a store over an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store over the default config file location.
    pub fn from_default_path() -> Result<Self, StoreError> {
        Ok(Self::new(Self::default_path().ok_or(StoreError::NoConfigDir)?))
    }

    /// The default config file path (`~/.config/gitferry/config.toml` on
    /// Linux, platform equivalent elsewhere).
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gitferry").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<DocumentMut, StoreError> {
        let content = if self.path.exists() {
            fs::read_to_string(&self.path)?
        } else {
            String::new()
        };
        content
            .parse()
            .map_err(|e| StoreError::Parse(format!("{e}")))
    }

    fn write_document(&self, doc: &DocumentMut) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, doc.to_string())?;
        Ok(())
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<Option<RepositoryConfig>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let doc = self.read_document()?;
        let Some(table) = doc.get("repository").and_then(|item| item.as_table()) else {
            return Ok(None);
        };

        let get = |key: &str| {
            table
                .get(key)
                .and_then(|item| item.as_str())
                .map(String::from)
        };

        match (get("token"), get("owner"), get("repo")) {
            (Some(token), Some(owner), Some(repo)) => {
                let branch = get("branch").unwrap_or_else(|| DEFAULT_BRANCH.to_string());
                Ok(Some(RepositoryConfig {
                    token,
                    owner,
                    repo,
                    branch,
                }))
            }
            _ => Ok(None),
        }
    }

    fn save(&self, config: &RepositoryConfig) -> Result<(), StoreError> {
        let mut doc = self.read_document()?;

        if !doc.contains_key("repository") {
            doc["repository"] = toml_edit::table();
        }
        doc["repository"]["token"] = value(config.token.as_str());
        doc["repository"]["owner"] = value(config.owner.as_str());
        doc["repository"]["repo"] = value(config.repo.as_str());
        doc["repository"]["branch"] = value(config.branch.as_str());

        self.write_document(&doc)
    }

    fn clear(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }

        let mut doc = self.read_document()?;
        if doc.remove("repository").is_some() {
            self.write_document(&doc)?;
        }
        Ok(())
    }
}
