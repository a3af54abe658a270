//! Configuration for Recall.
//!
//! Everything lives under the recall home directory (`$RECALL_HOME`, or
//! `~/.recall`):
//!
//! - `config.kdl` - user preferences (see [`schema`])
//! - `.env` - environment defaults such as `TODOIST_API_TOKEN`
//! - `reminders.jsonl` - the local backend's log
//!
//! `.env` never overrides variables already present in the environment.
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    BACKEND_ENV, ConfigOverrides, Resolved, ResolvedConfig, TODOIST_TOKEN_ENV, ValueSource,
    resolve_config,
};
pub use schema::{OutputFormat, RecallConfig};

use crate::storage::{AppleStore, Backend, BackendType, LocalStore, TodoistStore};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "RECALL_HOME";

/// Config file name inside the home directory.
pub const CONFIG_FILE: &str = "config.kdl";

/// Dotenv file name inside the home directory.
pub const ENV_FILE: &str = ".env";

/// Locate the recall home directory.
pub fn recall_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|h| h.join(".recall"))
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

/// Load `<home>/.env` into the process environment, if present.
pub fn load_env_file(home: &Path) {
    let path = home.join(ENV_FILE);
    if !path.exists() {
        return;
    }
    match dotenv::from_path(&path) {
        Ok(()) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to load environment file"),
    }
}

/// Open the backend selected by the resolved configuration.
pub fn open_backend(config: &ResolvedConfig) -> Result<Backend> {
    debug!(backend = %config.backend(), source = %config.backend.source, "Opening backend");

    match config.backend() {
        BackendType::Local => Ok(Backend::Local(LocalStore::open(&config.data_file.value)?)),
        BackendType::Apple => Ok(Backend::Apple(AppleStore::new(Some(
            &config.apple_list.value,
        )))),
        BackendType::Todoist => {
            let token = config.token().ok_or_else(|| {
                Error::Config(format!(
                    "{} is required for the todoist backend (set it in the environment or {})",
                    TODOIST_TOKEN_ENV,
                    config.home.join(ENV_FILE).display()
                ))
            })?;
            let project = config.todoist_project.as_ref().map(|p| p.value.as_str());
            Ok(Backend::Todoist(TodoistStore::new(token, project)))
        }
    }
}
