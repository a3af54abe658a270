//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`RECALL_BACKEND`, `TODOIST_API_TOKEN`)
//! 3. config.kdl in the recall home
//! 4. Built-in defaults

use super::schema::{OutputFormat, RecallConfig};
use crate::storage::apple::DEFAULT_LIST;
use crate::storage::jsonl::DEFAULT_DATA_FILE;
use crate::storage::BackendType;
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Environment variable selecting the backend.
pub const BACKEND_ENV: &str = "RECALL_BACKEND";

/// Environment variable holding the Todoist API token.
pub const TODOIST_TOKEN_ENV: &str = "TODOIST_API_TOKEN";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Recall home directory (config.kdl, .env, default data file)
    pub home: PathBuf,
    /// Selected backend
    pub backend: Resolved<BackendType>,
    /// JSONL log path for the local backend
    pub data_file: Resolved<PathBuf>,
    /// Output format preference
    pub output_format: Resolved<OutputFormat>,
    /// Reminders.app list name
    pub apple_list: Resolved<String>,
    /// Todoist project name, if restricted to one
    pub todoist_project: Option<Resolved<String>>,
    /// Todoist API token
    pub todoist_token: Option<Resolved<String>>,
}

impl ResolvedConfig {
    /// Defaults rooted at `home`.
    pub fn defaults(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            backend: Resolved::new(BackendType::Local, ValueSource::Default),
            data_file: Resolved::new(home.join(DEFAULT_DATA_FILE), ValueSource::Default),
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
            apple_list: Resolved::new(DEFAULT_LIST.to_string(), ValueSource::Default),
            todoist_project: None,
            todoist_token: None,
        }
    }

    /// Get the backend value.
    pub fn backend(&self) -> BackendType {
        self.backend.value
    }

    /// Get the output format value.
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    /// Get the token value, if set.
    pub fn token(&self) -> Option<&str> {
        self.todoist_token.as_ref().map(|r| r.value.as_str())
    }

    /// Get the masked token for display purposes.
    pub fn masked_token(&self) -> Option<String> {
        self.token().map(mask_token)
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Backend override from `--backend`
    pub backend: Option<BackendType>,
    /// Output format override from `--human`
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set backend override.
    pub fn with_backend(mut self, backend: BackendType) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set output format override.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Resolve configuration for `home` from the process environment.
pub fn resolve_config(home: &Path, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let file = RecallConfig::load(&home.join(super::CONFIG_FILE))?;
    resolve_with(home, &file, overrides, |name| std::env::var(name).ok())
}

/// Resolve configuration from explicit sources.
///
/// `env` looks up environment variables; empty values count as unset.
pub fn resolve_with(
    home: &Path,
    file: &RecallConfig,
    overrides: &ConfigOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let env = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut result = ResolvedConfig::defaults(home);

    // Resolve backend
    if let Some(backend) = overrides.backend {
        result.backend = Resolved::new(backend, ValueSource::CliFlag);
    } else if let Some(raw) = env(BACKEND_ENV) {
        let backend = BackendType::parse(&raw)
            .ok_or_else(|| Error::Config(format!("Unknown backend in {}: {}", BACKEND_ENV, raw)))?;
        result.backend = Resolved::new(backend, ValueSource::EnvVar(BACKEND_ENV.to_string()));
    } else if let Some(backend) = file.backend {
        result.backend = Resolved::new(backend, ValueSource::ConfigFile);
    }

    // Resolve data_file
    if let Some(ref data_file) = file.data_file {
        result.data_file = Resolved::new(home.join(data_file), ValueSource::ConfigFile);
    }

    // Resolve output_format
    if let Some(format) = overrides.output_format {
        result.output_format = Resolved::new(format, ValueSource::CliFlag);
    } else if let Some(format) = file.output_format {
        result.output_format = Resolved::new(format, ValueSource::ConfigFile);
    }

    if let Some(ref list) = file.apple_list {
        result.apple_list = Resolved::new(list.clone(), ValueSource::ConfigFile);
    }

    result.todoist_project = file
        .todoist_project
        .as_ref()
        .map(|p| Resolved::new(p.clone(), ValueSource::ConfigFile));

    result.todoist_token = env(TODOIST_TOKEN_ENV)
        .map(|t| Resolved::new(t, ValueSource::EnvVar(TODOIST_TOKEN_ENV.to_string())));

    Ok(result)
}

/// Show the first and last four characters of a token.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        format!("{}...", chars.iter().take(4).collect::<String>())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
