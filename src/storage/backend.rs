//! Store contract shared by every backend.
//!
//! This module defines the operations a reminder backend must provide:
//! - `LocalStore` - Append-only JSONL file (default)
//! - `AppleStore` - Apple Reminders via `osascript`
//! - `TodoistStore` - Todoist REST API

use super::filter::ListFilter;
use crate::Result;
use crate::models::Reminder;

/// Trait for reminder storage backends.
///
/// Every operation that addresses a reminder by ID fails with
/// [`Error::NotFound`](crate::Error::NotFound) when the backend has no live
/// record for it, so callers can stay backend-agnostic.
pub trait ReminderStore: Send + Sync {
    /// Persist a new reminder.
    fn add(&self, reminder: &Reminder) -> Result<()>;

    /// Fetch the current version of a reminder.
    fn get(&self, id: &str) -> Result<Reminder>;

    /// List live reminders matching the filter. `None` returns everything,
    /// completed reminders included.
    fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<Reminder>>;

    /// Replace the stored reminder with the same ID.
    fn update(&self, reminder: &Reminder) -> Result<()>;

    /// Remove a reminder.
    fn delete(&self, id: &str) -> Result<()>;

    /// Mark a reminder as completed.
    fn complete(&self, id: &str) -> Result<()>;

    /// Get the backend type name.
    fn backend_type(&self) -> BackendType;
}

/// Available backend types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendType {
    /// Local JSONL file - ~/.recall/reminders.jsonl
    #[default]
    Local,
    /// Apple Reminders.app list (macOS only)
    Apple,
    /// Todoist REST API
    Todoist,
}

impl BackendType {
    /// Parse a backend type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "jsonl" | "file" => Some(Self::Local),
            "apple" | "reminders" => Some(Self::Apple),
            "todoist" => Some(Self::Todoist),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Apple => "apple",
            Self::Todoist => "todoist",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_parse() {
        assert_eq!(BackendType::parse("local"), Some(BackendType::Local));
        assert_eq!(BackendType::parse("jsonl"), Some(BackendType::Local));
        assert_eq!(BackendType::parse("Apple"), Some(BackendType::Apple));
        assert_eq!(BackendType::parse("reminders"), Some(BackendType::Apple));
        assert_eq!(BackendType::parse("TODOIST"), Some(BackendType::Todoist));
        assert_eq!(BackendType::parse("sqlite"), None);
    }

    #[test]
    fn test_backend_type_display() {
        assert_eq!(BackendType::Local.to_string(), "local");
        assert_eq!(BackendType::Apple.to_string(), "apple");
        assert_eq!(BackendType::Todoist.to_string(), "todoist");
    }
}
