//! Storage layer for reminders.
//!
//! ## Storage Backends
//!
//! Recall supports multiple storage backends behind one contract
//! ([`ReminderStore`]):
//!
//! - **Local backend** (default): append-only JSONL log at `~/.recall/reminders.jsonl`
//! - **Apple backend**: a list in Reminders.app, driven through `osascript`
//! - **Todoist backend**: the Todoist REST API
//!
//! The local log is the source of truth for its records: every line is a full
//! snapshot and the last line for an ID wins. Update, delete and complete
//! rewrite the file compacted, so it only grows between mutations.

pub mod apple;
pub mod backend;
pub mod filter;
pub mod jsonl;
pub mod todoist;

pub use apple::AppleStore;
pub use backend::{BackendType, ReminderStore};
pub use filter::ListFilter;
pub use jsonl::{CompactResult, LocalStore};
pub use todoist::TodoistStore;

use crate::Result;
use crate::models::Reminder;

/// An opened backend, selected at runtime from configuration.
pub enum Backend {
    Local(LocalStore),
    Apple(AppleStore),
    Todoist(TodoistStore),
}

impl Backend {
    /// The local store, if this is the local backend.
    pub fn as_local(&self) -> Option<&LocalStore> {
        match self {
            Self::Local(store) => Some(store),
            _ => None,
        }
    }

    fn store(&self) -> &dyn ReminderStore {
        match self {
            Self::Local(store) => store,
            Self::Apple(store) => store,
            Self::Todoist(store) => store,
        }
    }
}

impl ReminderStore for Backend {
    fn add(&self, reminder: &Reminder) -> Result<()> {
        self.store().add(reminder)
    }

    fn get(&self, id: &str) -> Result<Reminder> {
        self.store().get(id)
    }

    fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<Reminder>> {
        self.store().list(filter)
    }

    fn update(&self, reminder: &Reminder) -> Result<()> {
        self.store().update(reminder)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.store().delete(id)
    }

    fn complete(&self, id: &str) -> Result<()> {
        self.store().complete(id)
    }

    fn backend_type(&self) -> BackendType {
        self.store().backend_type()
    }
}
