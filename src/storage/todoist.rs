//! Todoist backend.
//!
//! Proxies the store contract to the Todoist REST API (v2) with a blocking
//! `ureq` agent. Todoist assigns its own task IDs, so a reminder added here
//! comes back from `list`/`get` under the Todoist ID, not the locally minted
//! one.
//!
//! ## Field mapping
//!
//! | Recall      | Todoist                                  |
//! |-------------|------------------------------------------|
//! | title       | content                                  |
//! | notes+links | description (links in a trailing block)  |
//! | tags        | labels                                   |
//! | priority n  | priority n+1 (1 = normal, 4 = urgent)    |
//! | due         | due.datetime, or due.date at local 00:00 |
//!
//! The API only lists active tasks, so completed reminders never show up in
//! `list` even with `include_completed`.

use super::backend::{BackendType, ReminderStore};
use super::filter::ListFilter;
use crate::models::{Priority, Reminder};
use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Todoist REST API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.todoist.com/rest/v2";

/// User-Agent header sent with every request.
const USER_AGENT: &str = "recall-cli";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Heading of the links block appended to task descriptions.
const LINKS_HEADING: &str = "Links:";

/// A task as returned by the API (only fields we care about).
#[derive(Debug, Clone, Deserialize)]
struct TodoistTask {
    id: String,
    content: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    due: Option<TodoistDue>,
    #[serde(default)]
    priority: u8,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    is_completed: bool,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TodoistDue {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    datetime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TodoistProject {
    id: String,
    name: String,
}

/// Body for create and update requests.
#[derive(Debug, Serialize)]
struct TaskRequest<'a> {
    content: &'a str,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u8>,
    labels: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
}

/// Reminder store backed by a Todoist account.
pub struct TodoistStore {
    token: String,
    project: Option<String>,
    project_id: OnceLock<String>,
    base_url: String,
    agent: ureq::Agent,
}

impl TodoistStore {
    /// Create a store authenticating with `token`. When `project` is set,
    /// tasks are created in and listed from the project with that name;
    /// otherwise the Inbox and all projects are used.
    pub fn new(token: impl Into<String>, project: Option<&str>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();

        Self {
            token: token.into(),
            project: project
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            project_id: OnceLock::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            agent,
        }
    }

    /// Point the store at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}{}", self.base_url, path))
            .set("Authorization", &format!("Bearer {}", self.token))
    }

    /// Path for a single task, or `NotFound` if the ID cannot be a Todoist ID.
    fn task_path(id: &str) -> Result<String> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(format!("/tasks/{}", id))
    }

    /// Resolve the configured project name to its ID (cached).
    fn project_id(&self) -> Result<Option<&str>> {
        let Some(name) = self.project.as_deref() else {
            return Ok(None);
        };
        if let Some(id) = self.project_id.get() {
            return Ok(Some(id.as_str()));
        }

        let projects: Vec<TodoistProject> =
            read_json(send(self.request("GET", "/projects"), None, "projects")?)?;
        let project = projects
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::Config(format!("Todoist project not found: {}", name)))?;

        debug!(project = %name, project_id = %project.id, "Resolved Todoist project");
        Ok(Some(self.project_id.get_or_init(|| project.id).as_str()))
    }

    fn task_request<'a>(&self, reminder: &'a Reminder, project_id: Option<&'a str>) -> TaskRequest<'a> {
        TaskRequest {
            content: &reminder.title,
            description: build_description(reminder),
            due_datetime: reminder
                .due
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            priority: to_todoist_priority(reminder.priority),
            labels: &reminder.tags,
            project_id,
        }
    }
}

impl ReminderStore for TodoistStore {
    fn add(&self, reminder: &Reminder) -> Result<()> {
        let project_id = self.project_id()?;
        let body = serde_json::to_value(self.task_request(reminder, project_id))?;
        let created: TodoistTask =
            read_json(send(self.request("POST", "/tasks"), Some(body), &reminder.id)?)?;
        debug!(id = %reminder.id, todoist_id = %created.id, "Added Todoist task");
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Reminder> {
        let path = Self::task_path(id)?;
        let task: TodoistTask = read_json(send(self.request("GET", &path), None, id)?)?;
        Ok(to_reminder(task))
    }

    fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<Reminder>> {
        let mut req = self.request("GET", "/tasks");
        if let Some(project_id) = self.project_id()? {
            req = req.query("project_id", project_id);
        }
        let tasks: Vec<TodoistTask> = read_json(send(req, None, "tasks")?)?;
        let reminders = tasks.into_iter().map(to_reminder).collect();
        Ok(ListFilter::apply(filter, reminders))
    }

    fn update(&self, reminder: &Reminder) -> Result<()> {
        let path = Self::task_path(&reminder.id)?;
        // Moving tasks between projects is not part of the update endpoint.
        let body = serde_json::to_value(self.task_request(reminder, None))?;
        send(self.request("POST", &path), Some(body), &reminder.id)?;
        debug!(id = %reminder.id, "Updated Todoist task");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let path = Self::task_path(id)?;
        send(self.request("DELETE", &path), None, id)?;
        debug!(id = %id, "Deleted Todoist task");
        Ok(())
    }

    fn complete(&self, id: &str) -> Result<()> {
        let path = format!("{}/close", Self::task_path(id)?);
        send(self.request("POST", &path), None, id)?;
        debug!(id = %id, "Closed Todoist task");
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Todoist
    }
}

/// Execute a request, mapping 404 to `NotFound(subject)`.
fn send(req: ureq::Request, body: Option<serde_json::Value>, subject: &str) -> Result<ureq::Response> {
    let response = match body {
        Some(json) => req.send_json(json),
        None => req.call(),
    };

    match response {
        Ok(resp) => Ok(resp),
        Err(ureq::Error::Status(404, _)) => Err(Error::NotFound(subject.to_string())),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            Err(Error::Http(format!("API error {}: {}", code, body.trim())))
        }
        Err(e) => Err(Error::Http(e.to_string())),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(resp: ureq::Response) -> Result<T> {
    resp.into_json()
        .map_err(|e| Error::Http(format!("Failed to parse Todoist response: {}", e)))
}

fn to_todoist_priority(priority: Priority) -> Option<u8> {
    (!priority.is_none()).then(|| priority.value() + 1)
}

fn from_todoist_priority(priority: u8) -> Priority {
    Priority::try_from(priority.saturating_sub(1)).unwrap_or(Priority::High)
}

/// Notes followed by a links block, the way the task description stores them.
fn build_description(r: &Reminder) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(notes) = r.notes.as_deref().filter(|n| !n.is_empty()) {
        parts.push(notes.to_string());
    }
    if !r.links.is_empty() {
        if !parts.is_empty() {
            parts.push(String::new());
        }
        parts.push(LINKS_HEADING.to_string());
        parts.extend(r.links.iter().map(|l| format!("- {}", l)));
    }
    parts.join("\n")
}

/// Split a description back into notes and links.
fn split_description(description: &str) -> (Option<String>, Vec<String>) {
    let lines: Vec<&str> = description.lines().collect();
    let heading = lines.iter().rposition(|l| l.trim() == LINKS_HEADING);

    let (note_lines, links) = match heading {
        Some(idx)
            if lines[idx + 1..]
                .iter()
                .all(|l| l.trim().is_empty() || l.starts_with("- ")) =>
        {
            let links = lines[idx + 1..]
                .iter()
                .filter_map(|l| l.strip_prefix("- "))
                .map(|l| l.trim().to_string())
                .collect();
            (&lines[..idx], links)
        }
        _ => (&lines[..], Vec::new()),
    };

    let notes = note_lines.join("\n").trim_end().to_string();
    ((!notes.is_empty()).then_some(notes), links)
}

fn parse_due(due: &TodoistDue) -> Option<DateTime<Utc>> {
    if let Some(dt) = due.datetime.as_deref() {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(dt) {
            return Some(parsed.with_timezone(&Utc));
        }
        // Floating datetimes carry no offset and are meant in local time.
        if let Ok(naive) = NaiveDateTime::parse_from_str(dt, "%Y-%m-%dT%H:%M:%S") {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|d| d.with_timezone(&Utc));
        }
    }
    let date = NaiveDate::parse_from_str(due.date.as_deref()?, "%Y-%m-%d").ok()?;
    Local
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
}

fn to_reminder(task: TodoistTask) -> Reminder {
    let now = Utc::now();
    let created_at = task
        .created_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(now);
    let (notes, links) = split_description(&task.description);

    Reminder {
        id: task.id,
        title: task.content,
        due: task.due.as_ref().and_then(parse_due),
        notes,
        links,
        tags: task.labels,
        priority: from_todoist_priority(task.priority),
        completed: task.is_completed,
        completed_at: task.is_completed.then_some(now.max(created_at)),
        created_at,
        updated_at: now.max(created_at),
    }
}
