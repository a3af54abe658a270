//! Data models for Recall.
//!
//! This module defines the core data structures:
//! - `Reminder` - A task with a schedule, notes, links, tags and completion state
//! - `Priority` - The canonical 0-3 priority scale every backend maps onto

pub mod id;

pub use id::{generate_id, validate_id};

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reminder priority. `None` means "unset".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    #[default]
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    /// Parse a priority word or number, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "0" => Some(Priority::None),
            "low" | "1" => Some(Priority::Low),
            "medium" | "med" | "2" => Some(Priority::Medium),
            "high" | "3" => Some(Priority::High),
            _ => None,
        }
    }

    /// Whether the priority is unset.
    pub fn is_none(&self) -> bool {
        *self == Priority::None
    }

    /// Numeric value on the canonical 0-3 scale.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// String representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Compact marker for list output ("", "!", "!!", "!!!").
    pub fn marker(&self) -> &'static str {
        match self {
            Priority::None => "",
            Priority::Low => "!",
            Priority::Medium => "!!",
            Priority::High => "!!!",
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::None),
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            other => Err(format!("priority must be 0-3, got {}", other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.value()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reminder tracked by Recall.
///
/// Each mutator refreshes `updated_at`. Backends that translate records from
/// an external system build the struct directly instead, so translation never
/// counts as a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique identifier (e.g., "1768773271812-7727a989")
    pub id: String,

    /// Reminder title
    pub title: String,

    /// Deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,

    /// Free-form notes or instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Related links, in insertion order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    /// Tags for categorization (case preserved)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Priority level
    #[serde(default, skip_serializing_if = "Priority::is_none")]
    pub priority: Priority,

    /// Completion flag
    pub completed: bool,

    /// When the reminder was completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// Create a new reminder with a fresh ID.
    ///
    /// Fails with `InvalidInput` if the title is blank.
    pub fn new(title: impl Into<String>) -> Result<Self> {
        let title = title.into();
        validate_title(&title)?;

        let now = Utc::now();
        Ok(Self {
            id: generate_id(),
            title,
            due: None,
            notes: None,
            links: Vec::new(),
            tags: Vec::new(),
            priority: Priority::None,
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Mark the reminder as completed.
    ///
    /// Completion is one-way; completing an already completed reminder keeps
    /// the original `completed_at`.
    pub fn complete(&mut self) {
        if self.completed {
            return;
        }
        let now = self.touch();
        self.completed = true;
        self.completed_at = Some(now);
    }

    /// Replace the title.
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        validate_title(&title)?;
        self.title = title;
        self.touch();
        Ok(())
    }

    /// Add a link.
    pub fn add_link(&mut self, link: impl Into<String>) {
        self.links.push(link.into());
        self.touch();
    }

    /// Add a tag.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
        self.touch();
    }

    /// Set the due date.
    pub fn set_due(&mut self, due: DateTime<Utc>) {
        self.due = Some(due);
        self.touch();
    }

    /// Set the notes.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = Some(notes.into());
        self.touch();
    }

    /// Set the priority.
    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.touch();
    }

    /// Whether the reminder carries `tag`, ignoring case.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }

    /// Refresh `updated_at`, never letting it fall behind `created_at`.
    fn touch(&mut self) -> DateTime<Utc> {
        let now = Utc::now().max(self.created_at).max(self.updated_at);
        self.updated_at = now;
        now
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("title must not be empty".to_string()));
    }
    Ok(())
}
