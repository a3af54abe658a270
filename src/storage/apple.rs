//! Apple Reminders backend.
//!
//! Talks to Reminders.app through `osascript`. AppleScript does not expose
//! stable reminder identifiers, so this backend uses the title as the ID:
//! records it returns have `id == title`, and `get`/`delete`/`complete`
//! accept either.
//!
//! ## Priority mapping
//!
//! Apple uses 0 for none, 1-4 for high, 5 for medium and 6-9 for low. On the
//! way in we write 1, 5 and 9.

use super::backend::{BackendType, ReminderStore};
use super::filter::ListFilter;
use crate::models::{Priority, Reminder};
use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Default Reminders.app list name.
pub const DEFAULT_LIST: &str = "Recall";

/// How long a single osascript invocation may run.
const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Field separator used by the list script.
const FIELD_SEP: &str = "|||";

/// Date format AppleScript accepts in `date "..."` literals.
const APPLESCRIPT_DATE_IN: &str = "%B %-d, %Y %-I:%M:%S %p";

/// Date format AppleScript produces when coercing a date to text.
const APPLESCRIPT_DATE_OUT: &str = "%A, %B %d, %Y at %I:%M:%S %p";

/// Runs an AppleScript program and returns its output.
pub trait ScriptRunner: Send + Sync {
    fn run(&self, script: &str) -> Result<String>;
}

/// Runs scripts with the system `osascript` binary.
#[derive(Debug, Clone)]
pub struct Osascript {
    timeout: Duration,
}

impl Default for Osascript {
    fn default() -> Self {
        Self {
            timeout: SCRIPT_TIMEOUT,
        }
    }
}

impl ScriptRunner for Osascript {
    fn run(&self, script: &str) -> Result<String> {
        let mut child = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Script(format!("Failed to run osascript: {}", e)))?;

        // Drain both pipes while waiting so a large listing cannot fill the
        // pipe buffer and stall the child.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Script(format!(
                    "osascript timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let out = join_drain(stdout);
        let err = join_drain(stderr);
        if !status.success() {
            return Err(Error::Script(format!("{}: {}{}", status, out, err)));
        }
        Ok(out)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    })
}

fn join_drain(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Reminder store backed by a Reminders.app list.
pub struct AppleStore<R: ScriptRunner = Osascript> {
    list_name: String,
    runner: R,
}

impl AppleStore<Osascript> {
    /// Create a store for `list_name`, falling back to "Recall".
    pub fn new(list_name: Option<&str>) -> Self {
        Self::with_runner(list_name, Osascript::default())
    }
}

impl<R: ScriptRunner> AppleStore<R> {
    /// Create a store that executes scripts through `runner`.
    pub fn with_runner(list_name: Option<&str>, runner: R) -> Self {
        let list_name = list_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_LIST)
            .to_string();
        Self { list_name, runner }
    }

    /// Name of the Reminders.app list this store targets.
    pub fn list_name(&self) -> &str {
        &self.list_name
    }

    fn build_add_script(&self, r: &Reminder) -> String {
        let mut props = vec![format!("name:\"{}\"", escape_applescript(&r.title))];

        if let Some(notes) = r.notes.as_deref().filter(|n| !n.is_empty()) {
            props.push(format!("body:\"{}\"", escape_applescript(notes)));
        }
        if let Some(due) = r.due {
            props.push(format!(
                "due date:date \"{}\"",
                due.with_timezone(&Local).format(APPLESCRIPT_DATE_IN)
            ));
        }
        if let Some(p) = to_apple_priority(r.priority) {
            props.push(format!("priority:{}", p));
        }
        if r.completed {
            props.push("completed:true".to_string());
        }

        let list = escape_applescript(&self.list_name);
        format!(
            r#"
tell application "Reminders"
	try
		set reminderList to list "{list}"
	on error
		make new list with properties {{name:"{list}"}}
		set reminderList to list "{list}"
	end try
	tell reminderList
		make new reminder with properties {{{props}}}
	end tell
end tell"#,
            list = list,
            props = props.join(", ")
        )
    }

    fn build_list_script(&self) -> String {
        format!(
            r#"
tell application "Reminders"
	set output to ""
	try
		set reminderList to list "{list}"
		repeat with r in reminders of reminderList
			set rName to name of r
			set rBody to body of r
			if rBody is missing value then set rBody to ""
			set rCompleted to completed of r
			set rDueDate to ""
			try
				set rDueDate to due date of r as string
			end try
			set rPriority to priority of r
			set output to output & rName & "{sep}" & rBody & "{sep}" & rCompleted & "{sep}" & rDueDate & "{sep}" & rPriority & linefeed
		end repeat
	end try
	return output
end tell"#,
            list = escape_applescript(&self.list_name),
            sep = FIELD_SEP
        )
    }

    /// Script that applies `action` to the first reminder named `title` and
    /// returns `done`, or returns "not found".
    fn build_by_name_script(&self, title: &str, action: &str, done: &str) -> String {
        format!(
            r#"
tell application "Reminders"
	try
		set reminderList to list "{list}"
		repeat with r in reminders of reminderList
			if name of r is "{title}" then
				{action}
				return "{done}"
			end if
		end repeat
	end try
	return "not found"
end tell"#,
            list = escape_applescript(&self.list_name),
            title = escape_applescript(title),
            action = action,
            done = done
        )
    }

    fn run_by_name(&self, title: &str, action: &str, done: &str) -> Result<()> {
        let out = self
            .runner
            .run(&self.build_by_name_script(title, action, done))?;
        if out.trim() == "not found" {
            return Err(Error::NotFound(title.to_string()));
        }
        Ok(())
    }
}

impl<R: ScriptRunner> ReminderStore for AppleStore<R> {
    fn add(&self, reminder: &Reminder) -> Result<()> {
        self.runner.run(&self.build_add_script(reminder))?;
        debug!(list = %self.list_name, title = %reminder.title, "Added Apple reminder");
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Reminder> {
        self.list(None)?
            .into_iter()
            .find(|r| r.id == id || r.title == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<Reminder>> {
        let out = self.runner.run(&self.build_list_script())?;
        Ok(ListFilter::apply(filter, parse_reminders(&out)))
    }

    /// Reminders.app cannot edit in place through this interface, so the old
    /// reminder (addressed by its ID, i.e. its previous title) is deleted and
    /// the new version added.
    fn update(&self, reminder: &Reminder) -> Result<()> {
        self.delete(&reminder.id)?;
        self.add(reminder)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.run_by_name(id, "delete r", "deleted")?;
        debug!(list = %self.list_name, title = %id, "Deleted Apple reminder");
        Ok(())
    }

    fn complete(&self, id: &str) -> Result<()> {
        self.run_by_name(id, "set completed of r to true", "completed")?;
        debug!(list = %self.list_name, title = %id, "Completed Apple reminder");
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Apple
    }
}

/// Parse the list script's output into reminders.
fn parse_reminders(output: &str) -> Vec<Reminder> {
    let now = Utc::now();
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(FIELD_SEP).collect();
            if parts.len() < 5 {
                return None;
            }

            let completed = parts[2].trim() == "true";
            Some(Reminder {
                id: parts[0].to_string(),
                title: parts[0].to_string(),
                due: parse_apple_date(parts[3]),
                notes: Some(parts[1]).filter(|n| !n.is_empty()).map(str::to_string),
                links: Vec::new(),
                tags: Vec::new(),
                priority: from_apple_priority(parts[4]),
                completed,
                completed_at: completed.then_some(now),
                created_at: now,
                updated_at: now,
            })
        })
        .collect()
}

/// Parse AppleScript's `date as string` output, interpreted in local time.
fn parse_apple_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(s, APPLESCRIPT_DATE_OUT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn to_apple_priority(priority: Priority) -> Option<u8> {
    match priority {
        Priority::None => None,
        Priority::Low => Some(9),
        Priority::Medium => Some(5),
        Priority::High => Some(1),
    }
}

fn from_apple_priority(s: &str) -> Priority {
    match s.trim().parse::<u8>() {
        Ok(1..=4) => Priority::High,
        Ok(5) => Priority::Medium,
        Ok(6..=9) => Priority::Low,
        _ => Priority::None,
    }
}

/// Escape a string for use inside an AppleScript string literal.
fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
