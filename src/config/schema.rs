//! KDL schema for config.kdl.
//!
//! ```kdl
//! backend "local"          // local | apple | todoist
//! data-file "reminders.jsonl"
//! output-format "human"    // json | human
//! apple-list "Recall"
//! todoist-project "Work"
//! ```
//!
//! Unknown nodes are ignored so older binaries can read newer files.

use crate::storage::BackendType;
use crate::{Error, Result};
use kdl::KdlDocument;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl. Every field is optional; unset
/// fields fall through to environment variables or defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecallConfig {
    /// Which backend to use
    pub backend: Option<BackendType>,

    /// JSONL log location, relative to the recall home unless absolute
    pub data_file: Option<String>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Reminders.app list used by the apple backend
    pub apple_list: Option<String>,

    /// Todoist project name used by the todoist backend
    pub todoist_project: Option<String>,
}

impl RecallConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read config.kdl. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };

        let doc: KdlDocument = content
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {}: {}", path.display(), e)))?;
        Self::from_kdl(&doc)
    }

    /// Parse config from a KDL document.
    pub fn from_kdl(doc: &KdlDocument) -> Result<Self> {
        let mut config = Self::new();

        if let Some(s) = string_value(doc, "backend") {
            config.backend = Some(
                BackendType::parse(s)
                    .ok_or_else(|| Error::Config(format!("Unknown backend in config.kdl: {}", s)))?,
            );
        }

        config.data_file = string_value(doc, "data-file").map(str::to_string);

        if let Some(s) = string_value(doc, "output-format") {
            config.output_format = Some(OutputFormat::parse(s).ok_or_else(|| {
                Error::Config(format!("Unknown output-format in config.kdl: {}", s))
            })?);
        }

        config.apple_list = string_value(doc, "apple-list").map(str::to_string);
        config.todoist_project = string_value(doc, "todoist-project").map(str::to_string);

        Ok(config)
    }
}

/// First string argument of a top-level node.
fn string_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?
        .entries()
        .first()?
        .value()
        .as_string()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("xml"), None);
    }

    #[test]
    fn test_config_from_kdl_empty() {
        let doc = KdlDocument::new();
        let config = RecallConfig::from_kdl(&doc).unwrap();
        assert_eq!(config, RecallConfig::default());
    }

    #[test]
    fn test_config_from_kdl_full() {
        let kdl = r#"
            backend "todoist"
            data-file "/tmp/elsewhere.jsonl"
            output-format "human"
            apple-list "Errands"
            todoist-project "Work"
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = RecallConfig::from_kdl(&doc).unwrap();

        assert_eq!(config.backend, Some(BackendType::Todoist));
        assert_eq!(config.data_file.as_deref(), Some("/tmp/elsewhere.jsonl"));
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.apple_list.as_deref(), Some("Errands"));
        assert_eq!(config.todoist_project.as_deref(), Some("Work"));
    }

    #[test]
    fn test_config_ignores_unknown_nodes() {
        let doc: KdlDocument = r#"
            editor "nvim"
            backend "apple"
        "#
        .parse()
        .unwrap();
        let config = RecallConfig::from_kdl(&doc).unwrap();
        assert_eq!(config.backend, Some(BackendType::Apple));
    }

    #[test]
    fn test_config_rejects_unknown_backend() {
        let doc: KdlDocument = r#"backend "sqlite""#.parse().unwrap();
        let err = RecallConfig::from_kdl(&doc).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = RecallConfig::load(&dir.path().join("config.kdl")).unwrap();
        assert_eq!(config, RecallConfig::default());
    }

    #[test]
    fn test_load_unparseable_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        fs::write(&path, "backend \"local\n{{{").unwrap();

        let err = RecallConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {:?}", err);
    }
}
