//! Command implementations for the `rc` CLI.
//!
//! Each command takes the opened backend, does its work through the
//! [`ReminderStore`] contract and returns a result that can be printed as JSON
//! or for humans. Argument parsing lives in [`crate::cli`]; due-date phrases
//! in [`due`].

pub mod due;

pub use due::{DueWindow, parse_due, parse_priority};

use crate::config::{ResolvedConfig, ValueSource};
use crate::models::{Reminder, validate_id};
use crate::storage::{Backend, BackendType, ListFilter, ReminderStore};
use crate::{Error, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Warn when a local-log ID does not look like one `rc` generated. The lookup
/// still goes ahead; imported records may carry any non-empty ID.
fn check_local_id(store: &dyn ReminderStore, id: &str) {
    if store.backend_type() != BackendType::Local {
        return;
    }
    if let Err(e) = validate_id(id) {
        warn!(id, error = %e, "Unexpected reminder ID format");
    }
}

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Human rendering of one reminder, as shown by `list` and `show`.
fn format_reminder(r: &Reminder, show_id: bool) -> String {
    let mut lines = Vec::new();

    let status = if r.completed { "[x]" } else { "[ ]" };
    let due = r
        .due
        .map(|d| format!(" (due: {})", d.with_timezone(&Local).format("%a %b %-d")))
        .unwrap_or_default();
    let priority = if r.priority.is_none() {
        String::new()
    } else {
        format!(" {}", r.priority.marker())
    };
    lines.push(format!("{} {}{}{}", status, r.title, due, priority));

    if show_id {
        lines.push(format!("    ID: {}", r.id));
    }
    if let Some(ref notes) = r.notes {
        lines.push(format!("    Note: {}", notes));
    }
    if !r.tags.is_empty() {
        lines.push(format!("    Tags: {}", r.tags.join(", ")));
    }
    for link in &r.links {
        lines.push(format!("    Link: {}", link));
    }

    lines.join("\n")
}

// === Add ===

/// Fields accepted by `rc add`.
#[derive(Debug, Clone, Default)]
pub struct AddInput {
    pub title: String,
    pub due: Option<String>,
    pub notes: Option<String>,
    pub links: Vec<String>,
    pub tags: Vec<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddResult {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
}

impl Output for AddResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match self.due {
            Some(due) => format!(
                "Added: {} (due {})",
                self.title,
                due.with_timezone(&Local).format("%a %b %-d %-I:%M %p")
            ),
            None => format!("Added: {}", self.title),
        }
    }
}

/// Create a reminder and store it.
pub fn add(store: &dyn ReminderStore, input: AddInput, now: DateTime<Local>) -> Result<AddResult> {
    let mut reminder = Reminder::new(input.title)?;

    if let Some(ref due) = input.due {
        reminder.set_due(parse_due(due, now)?);
    }
    if let Some(notes) = input.notes.filter(|n| !n.is_empty()) {
        reminder.set_notes(notes);
    }
    for link in input.links {
        reminder.add_link(link);
    }
    for tag in input.tags {
        reminder.add_tag(tag);
    }
    if let Some(ref priority) = input.priority {
        reminder.set_priority(parse_priority(priority)?);
    }

    store.add(&reminder)?;
    debug!(id = %reminder.id, backend = %store.backend_type(), "Added reminder");

    Ok(AddResult {
        id: reminder.id,
        title: reminder.title,
        due: reminder.due,
    })
}

// === List ===

/// Options accepted by `rc list`.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub window: Option<DueWindow>,
    pub tags: Vec<String>,
    pub all: bool,
    pub completed_only: bool,
    pub search: Option<String>,
    pub show_ids: bool,
}

impl ListOptions {
    /// Store filter for these options, relative to `now`.
    pub fn filter(&self, now: DateTime<Local>) -> ListFilter {
        let mut filter = ListFilter {
            include_completed: self.all || self.completed_only,
            tags: self.tags.clone(),
            search: self.search.clone(),
            ..Default::default()
        };
        if let Some((after, before)) = self.window.and_then(|w| w.bounds(now)) {
            filter.due_after = Some(after);
            filter.due_before = Some(before);
        }
        filter
    }
}

#[derive(Debug, Serialize)]
pub struct ListResult {
    pub count: usize,
    pub reminders: Vec<Reminder>,
    #[serde(skip)]
    pub show_ids: bool,
}

impl Output for ListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.reminders.is_empty() {
            return "No reminders found.".to_string();
        }
        self.reminders
            .iter()
            .map(|r| format_reminder(r, self.show_ids))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Order for display: by due date (undated last), then by creation time.
pub fn sort_for_display(reminders: &mut [Reminder]) {
    reminders.sort_by(|a, b| {
        (a.due.is_none(), a.due, a.created_at).cmp(&(b.due.is_none(), b.due, b.created_at))
    });
}

/// List reminders.
pub fn list(store: &dyn ReminderStore, options: &ListOptions, now: DateTime<Local>) -> Result<ListResult> {
    let filter = options.filter(now);
    let mut reminders = store.list(Some(&filter))?;

    if options.completed_only {
        reminders.retain(|r| r.completed);
    }
    sort_for_display(&mut reminders);

    Ok(ListResult {
        count: reminders.len(),
        reminders,
        show_ids: options.show_ids,
    })
}

// === Show ===

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ShowResult {
    pub reminder: Reminder,
}

impl Output for ShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let r = &self.reminder;
        let mut out = format_reminder(r, true);
        if !r.priority.is_none() {
            out.push_str(&format!("\n    Priority: {}", r.priority));
        }
        out.push_str(&format!(
            "\n    Created: {}",
            r.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ));
        if let Some(done) = r.completed_at {
            out.push_str(&format!(
                "\n    Completed: {}",
                done.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            ));
        }
        out
    }
}

/// Show one reminder.
pub fn show(store: &dyn ReminderStore, id: &str) -> Result<ShowResult> {
    check_local_id(store, id);
    Ok(ShowResult {
        reminder: store.get(id)?,
    })
}

// === Update ===

/// Changes accepted by `rc update`. Links and tags are appended.
#[derive(Debug, Clone, Default)]
pub struct UpdateInput {
    pub title: Option<String>,
    pub due: Option<String>,
    pub notes: Option<String>,
    pub links: Vec<String>,
    pub tags: Vec<String>,
    pub priority: Option<String>,
}

impl UpdateInput {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.due.is_none()
            && self.notes.is_none()
            && self.links.is_empty()
            && self.tags.is_empty()
            && self.priority.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateResult {
    pub id: String,
    pub updated_fields: Vec<&'static str>,
}

impl Output for UpdateResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Updated {}: {}", self.id, self.updated_fields.join(", "))
    }
}

/// Fetch a reminder, apply the changes and store it back.
pub fn update(
    store: &dyn ReminderStore,
    id: &str,
    input: UpdateInput,
    now: DateTime<Local>,
) -> Result<UpdateResult> {
    if input.is_empty() {
        return Err(Error::InvalidInput(
            "Nothing to update (pass at least one field flag)".to_string(),
        ));
    }

    check_local_id(store, id);
    let mut reminder = store.get(id)?;
    let mut updated_fields = Vec::new();

    if let Some(title) = input.title {
        reminder.set_title(title)?;
        updated_fields.push("title");
    }
    if let Some(ref due) = input.due {
        reminder.set_due(parse_due(due, now)?);
        updated_fields.push("due");
    }
    if let Some(notes) = input.notes {
        reminder.set_notes(notes);
        updated_fields.push("notes");
    }
    if !input.links.is_empty() {
        for link in input.links {
            reminder.add_link(link);
        }
        updated_fields.push("links");
    }
    if !input.tags.is_empty() {
        for tag in input.tags {
            reminder.add_tag(tag);
        }
        updated_fields.push("tags");
    }
    if let Some(ref priority) = input.priority {
        reminder.set_priority(parse_priority(priority)?);
        updated_fields.push("priority");
    }

    store.update(&reminder)?;
    debug!(id = %reminder.id, fields = ?updated_fields, "Updated reminder");

    Ok(UpdateResult {
        id: reminder.id,
        updated_fields,
    })
}

// === Complete / Delete ===

#[derive(Debug, Serialize)]
pub struct CompleteResult {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl Output for CompleteResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Completed: {}", self.title)
    }
}

/// Mark a reminder as done.
pub fn complete(store: &dyn ReminderStore, id: &str) -> Result<CompleteResult> {
    check_local_id(store, id);
    let reminder = store.get(id)?;
    store.complete(id)?;
    Ok(CompleteResult {
        id: reminder.id,
        title: reminder.title,
        completed: true,
    })
}

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub title: String,
    pub deleted: bool,
}

impl Output for DeleteResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted: {}", self.title)
    }
}

/// Remove a reminder.
pub fn delete(store: &dyn ReminderStore, id: &str) -> Result<DeleteResult> {
    check_local_id(store, id);
    let reminder = store.get(id)?;
    store.delete(id)?;
    Ok(DeleteResult {
        id: reminder.id,
        title: reminder.title,
        deleted: true,
    })
}

// === Compact ===

#[derive(Debug, Serialize)]
pub struct CompactOutput {
    #[serde(flatten)]
    pub stats: crate::storage::CompactResult,
}

impl Output for CompactOutput {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let s = &self.stats;
        format!(
            "Compacted {} entries to {} ({} malformed lines dropped, {} bytes saved)",
            s.original_entries, s.final_entries, s.skipped_lines, s.space_saved_bytes
        )
    }
}

/// Rewrite the local log down to its live records.
pub fn compact(backend: &Backend) -> Result<CompactOutput> {
    let store = backend.as_local().ok_or_else(|| {
        Error::InvalidInput(format!(
            "compact is only supported by the {} backend (current: {})",
            BackendType::Local,
            backend.backend_type()
        ))
    })?;
    Ok(CompactOutput {
        stats: store.compact()?,
    })
}

// === Config ===

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub source: ValueSource,
}

#[derive(Debug, Serialize)]
pub struct ConfigShowResult {
    pub home: String,
    pub settings: Vec<ConfigEntry>,
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("home: {}", self.home)];
        for entry in &self.settings {
            lines.push(format!("{}: {} ({})", entry.key, entry.value, entry.source));
        }
        lines.join("\n")
    }
}

/// Report the resolved configuration. The token is masked.
pub fn config_show(config: &ResolvedConfig) -> ConfigShowResult {
    let mut settings = vec![
        ConfigEntry {
            key: "backend",
            value: config.backend().to_string(),
            source: config.backend.source.clone(),
        },
        ConfigEntry {
            key: "data-file",
            value: config.data_file.value.display().to_string(),
            source: config.data_file.source.clone(),
        },
        ConfigEntry {
            key: "output-format",
            value: config.output_format().to_string(),
            source: config.output_format.source.clone(),
        },
        ConfigEntry {
            key: "apple-list",
            value: config.apple_list.value.clone(),
            source: config.apple_list.source.clone(),
        },
    ];
    if let Some(ref project) = config.todoist_project {
        settings.push(ConfigEntry {
            key: "todoist-project",
            value: project.value.clone(),
            source: project.source.clone(),
        });
    }
    if let (Some(masked), Some(token)) = (config.masked_token(), config.todoist_token.as_ref()) {
        settings.push(ConfigEntry {
            key: "todoist-token",
            value: masked,
            source: token.source.clone(),
        });
    }

    ConfigShowResult {
        home: config.home.display().to_string(),
        settings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Resolved;
    use crate::models::Priority;
    use crate::test_utils::TestEnv;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 10, 15, 30, 0).unwrap()
    }

    fn add_titled(store: &dyn ReminderStore, title: &str) -> AddResult {
        add(
            store,
            AddInput {
                title: title.to_string(),
                ..Default::default()
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_add_with_all_fields() {
        let env = TestEnv::new();
        let store = env.open_store();

        let result = add(
            &store,
            AddInput {
                title: "Pay rent".to_string(),
                due: Some("2024-01-15".to_string()),
                notes: Some("Transfer from checking".to_string()),
                links: vec!["https://bank.example".to_string()],
                tags: vec!["home".to_string(), "HOME".to_string()],
                priority: Some("high".to_string()),
            },
            now(),
        )
        .unwrap();

        let stored = store.get(&result.id).unwrap();
        assert_eq!(stored.title, "Pay rent");
        assert_eq!(stored.due, Some(parse_due("2024-01-15", now()).unwrap()));
        assert_eq!(stored.notes.as_deref(), Some("Transfer from checking"));
        assert_eq!(stored.links, vec!["https://bank.example"]);
        assert_eq!(stored.tags, vec!["home", "HOME"]);
        assert_eq!(stored.priority, Priority::High);
    }

    #[test]
    fn test_add_rejects_bad_input_without_writing() {
        let env = TestEnv::new();
        let store = env.open_store();

        let bad_due = AddInput {
            title: "x".to_string(),
            due: Some("someday".to_string()),
            ..Default::default()
        };
        assert!(matches!(add(&store, bad_due, now()), Err(Error::InvalidInput(_))));

        let bad_priority = AddInput {
            title: "x".to_string(),
            priority: Some("urgent".to_string()),
            ..Default::default()
        };
        assert!(matches!(add(&store, bad_priority, now()), Err(Error::InvalidInput(_))));

        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_pay_rent_scenario() {
        let env = TestEnv::new();
        let store = env.open_store();

        let added = add_titled(&store, "Pay rent");
        let open = list(&store, &ListOptions::default(), now()).unwrap();
        assert_eq!(open.count, 1);

        complete(&store, &added.id).unwrap();

        let open = list(&store, &ListOptions::default(), now()).unwrap();
        assert_eq!(open.count, 0);

        let all = ListOptions {
            all: true,
            ..Default::default()
        };
        let everything = list(&store, &all, now()).unwrap();
        assert_eq!(everything.count, 1);
        assert!(everything.reminders[0].completed);
    }

    #[test]
    fn test_list_completed_only() {
        let env = TestEnv::new();
        let store = env.open_store();

        let done = add_titled(&store, "Done");
        add_titled(&store, "Open");
        complete(&store, &done.id).unwrap();

        let options = ListOptions {
            completed_only: true,
            ..Default::default()
        };
        let result = list(&store, &options, now()).unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.reminders[0].title, "Done");
    }

    #[test]
    fn test_list_window_today() {
        let env = TestEnv::new();
        let store = env.open_store();

        for (title, due) in [("today", "today"), ("tomorrow", "tomorrow")] {
            add(
                &store,
                AddInput {
                    title: title.to_string(),
                    due: Some(due.to_string()),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
        }
        add_titled(&store, "undated");

        let options = ListOptions {
            window: Some(DueWindow::Today),
            ..Default::default()
        };
        let result = list(&store, &options, now()).unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.reminders[0].title, "today");
    }

    #[test]
    fn test_sort_for_display() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let make = |title: &str, due: Option<i64>, created: i64| {
            let mut r = Reminder::new(title).unwrap();
            r.due = due.map(|d| base + Duration::days(d));
            r.created_at = base + Duration::hours(created);
            r
        };

        let mut reminders = vec![
            make("undated-late", None, 5),
            make("due-later", Some(3), 1),
            make("undated-early", None, 2),
            make("due-sooner", Some(1), 4),
        ];
        sort_for_display(&mut reminders);

        let titles: Vec<_> = reminders.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["due-sooner", "due-later", "undated-early", "undated-late"]
        );
    }

    #[test]
    fn test_update_fields() {
        let env = TestEnv::new();
        let store = env.open_store();
        let added = add_titled(&store, "Draft");

        let result = update(
            &store,
            &added.id,
            UpdateInput {
                title: Some("Final".to_string()),
                tags: vec!["work".to_string()],
                priority: Some("2".to_string()),
                ..Default::default()
            },
            now(),
        )
        .unwrap();
        assert_eq!(result.updated_fields, vec!["title", "tags", "priority"]);

        let stored = store.get(&added.id).unwrap();
        assert_eq!(stored.title, "Final");
        assert_eq!(stored.tags, vec!["work"]);
        assert_eq!(stored.priority, Priority::Medium);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[test]
    fn test_update_appends_tags_as_given() {
        let env = TestEnv::new();
        let store = env.open_store();
        let added = add(
            &store,
            AddInput {
                title: "Call plumber".to_string(),
                tags: vec!["home".to_string()],
                ..Default::default()
            },
            now(),
        )
        .unwrap();

        update(
            &store,
            &added.id,
            UpdateInput {
                tags: vec!["Home".to_string(), "home".to_string()],
                ..Default::default()
            },
            now(),
        )
        .unwrap();

        let stored = store.get(&added.id).unwrap();
        assert_eq!(stored.tags, vec!["home", "Home", "home"]);

        let options = ListOptions {
            tags: vec!["HOME".to_string()],
            ..Default::default()
        };
        assert_eq!(list(&store, &options, now()).unwrap().count, 1);
    }

    #[test]
    fn test_update_requires_a_change_and_existing_id() {
        let env = TestEnv::new();
        let store = env.open_store();
        let added = add_titled(&store, "Draft");

        assert!(matches!(
            update(&store, &added.id, UpdateInput::default(), now()),
            Err(Error::InvalidInput(_))
        ));

        let change = UpdateInput {
            title: Some("x".to_string()),
            ..Default::default()
        };
        assert!(update(&store, "1-deadbeef", change, now()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_then_missing() {
        let env = TestEnv::new();
        let store = env.open_store();
        let added = add_titled(&store, "Temp");

        let result = delete(&store, &added.id).unwrap();
        assert!(result.deleted);
        assert!(delete(&store, &added.id).unwrap_err().is_not_found());
        assert!(show(&store, &added.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_foreign_local_ids_are_accepted() {
        let env = TestEnv::new();
        let store = env.open_store();
        let mut r = Reminder::new("Imported").unwrap();
        r.id = "legacy-42".to_string();
        store.add(&r).unwrap();

        assert_eq!(show(&store, "legacy-42").unwrap().reminder.title, "Imported");
        assert!(complete(&store, "legacy-42").unwrap().completed);
        assert!(delete(&store, "legacy-42").unwrap().deleted);
    }

    #[test]
    fn test_compact_local_only() {
        let env = TestEnv::new();
        let backend = Backend::Local(env.open_store());
        let added = add_titled(&backend, "Keep");
        add_titled(&backend, "Drop");
        complete(&backend, &added.id).unwrap();

        let output = compact(&backend).unwrap();
        assert_eq!(output.stats.final_entries, 2);

        let remote = Backend::Todoist(crate::storage::TodoistStore::new("t", None));
        assert!(matches!(compact(&remote), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_human_list_output() {
        let mut r = Reminder::new("Call mom").unwrap();
        r.set_notes("Birthday next week");
        r.add_tag("family");
        r.set_priority(Priority::Medium);

        let result = ListResult {
            count: 1,
            reminders: vec![r.clone()],
            show_ids: true,
        };
        let human = result.to_human();
        assert!(human.starts_with("[ ] Call mom !!"));
        assert!(human.contains(&format!("    ID: {}", r.id)));
        assert!(human.contains("    Note: Birthday next week"));
        assert!(human.contains("    Tags: family"));

        let empty = ListResult {
            count: 0,
            reminders: vec![],
            show_ids: false,
        };
        assert_eq!(empty.to_human(), "No reminders found.");
    }

    #[test]
    fn test_show_json_is_the_record() {
        let r = Reminder::new("Plain").unwrap();
        let output = ShowResult { reminder: r.clone() };
        let value: serde_json::Value = serde_json::from_str(&output.to_json()).unwrap();
        assert_eq!(value["id"], r.id);
        assert_eq!(value["completed"], false);
    }

    #[test]
    fn test_config_show_masks_token() {
        let mut config = ResolvedConfig::defaults(std::path::Path::new("/r"));
        config.todoist_token = Some(Resolved::new(
            "abcd1234567890wxyz".to_string(),
            ValueSource::EnvVar("TODOIST_API_TOKEN".to_string()),
        ));

        let result = config_show(&config);
        let json = result.to_json();
        assert!(!json.contains("abcd1234567890wxyz"));
        assert!(json.contains("abcd...wxyz"));
        assert!(result.to_human().contains("backend: local (default)"));
    }
}
