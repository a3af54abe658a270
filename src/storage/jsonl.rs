//! Local JSONL backend.
//!
//! Reminders live in a single file with one JSON object per line. The file is
//! an append-only log for `add`; `update`, `delete` and `complete` rewrite it
//! to contain only the live set.
//!
//! ## Reading
//!
//! Every read replays the whole log into a map keyed by ID, so a later line
//! always replaces an earlier one with the same ID. Blank lines and lines that
//! fail to decode are skipped: a torn write from a crash must not hide the
//! rest of the log. A missing file is an empty store.
//!
//! ## Writing
//!
//! - `add` appends one line and syncs. It never touches prior content.
//! - Rewrites serialize the live set into a temporary file in the same
//!   directory and rename it over the log, so readers see either the old or
//!   the new file.
//!
//! One `RwLock` per store serializes writers against everything else inside
//! the process. Nothing guards against a second process.

use super::backend::{BackendType, ReminderStore};
use super::filter::ListFilter;
use crate::models::Reminder;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Default file name for the reminder log.
pub const DEFAULT_DATA_FILE: &str = "reminders.jsonl";

/// Statistics about a compaction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactResult {
    /// Well-formed lines in the log before compaction
    pub original_entries: usize,
    /// Live reminders written back
    pub final_entries: usize,
    /// Blank or malformed lines dropped
    pub skipped_lines: usize,
    /// Bytes reclaimed
    pub space_saved_bytes: u64,
}

/// The live set recovered from the log, plus bookkeeping for compaction.
struct Replay {
    live: HashMap<String, Reminder>,
    entries: usize,
    skipped: usize,
}

impl Replay {
    /// Live reminders ordered by creation time, then ID.
    fn into_sorted(self) -> Vec<Reminder> {
        let mut reminders: Vec<Reminder> = self.live.into_values().collect();
        reminders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        reminders
    }
}

/// Reminder store backed by an append-only JSONL file.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl LocalStore {
    /// Open a store at `path`, creating its parent directory if needed.
    ///
    /// The log file itself is created lazily by the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        debug!(path = %path.display(), "Opened local reminder store");

        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the log so it holds exactly one line per live reminder.
    pub fn compact(&self) -> Result<CompactResult> {
        let _guard = self.write_guard();

        let original_size = file_len(&self.path)?;
        let replay = self.replay()?;
        let original_entries = replay.entries;
        let skipped_lines = replay.skipped;
        let reminders = replay.into_sorted();

        self.write_all(&reminders)?;

        let new_size = file_len(&self.path)?;
        let result = CompactResult {
            original_entries,
            final_entries: reminders.len(),
            skipped_lines,
            space_saved_bytes: original_size.saturating_sub(new_size),
        };
        info!(
            original_entries = result.original_entries,
            final_entries = result.final_entries,
            skipped_lines = result.skipped_lines,
            "Compacted reminder log"
        );
        Ok(result)
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replay the log into its live set. Callers must hold the lock.
    fn replay(&self) -> Result<Replay> {
        let mut replay = Replay {
            live: HashMap::new(),
            entries: 0,
            skipped: 0,
        };

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(replay),
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let Ok(line) = std::str::from_utf8(&buf) else {
                warn!(path = %self.path.display(), line = line_no, "Skipping non-UTF-8 line");
                replay.skipped += 1;
                continue;
            };
            let line = line.trim();
            if line.is_empty() {
                replay.skipped += 1;
                continue;
            }

            match serde_json::from_str::<Reminder>(line) {
                Ok(reminder) if !reminder.id.is_empty() => {
                    replay.entries += 1;
                    replay.live.insert(reminder.id.clone(), reminder);
                }
                Ok(_) => {
                    warn!(path = %self.path.display(), line = line_no, "Skipping reminder with empty id");
                    replay.skipped += 1;
                }
                Err(e) => {
                    warn!(path = %self.path.display(), line = line_no, error = %e, "Skipping malformed line");
                    replay.skipped += 1;
                }
            }
        }

        Ok(replay)
    }

    /// Append one reminder to the log. Callers must hold the write lock.
    fn append(&self, reminder: &Reminder) -> Result<()> {
        let mut line = serde_json::to_vec(reminder)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)?;

        // A crash mid-append can leave a partial last line; start on a fresh
        // one so the new record is not glued onto it.
        if !ends_with_newline(&mut file)? {
            line.insert(0, b'\n');
        }

        file.write_all(&line)?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    /// Atomically replace the log with `reminders`. Callers must hold the
    /// write lock.
    fn write_all(&self, reminders: &[Reminder]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        self.write_all_in(dir, reminders)
    }

    /// Stage the new log in `dir`, then rename it over the live one. On any
    /// failure the staged file is removed and the log is untouched.
    fn write_all_in(&self, dir: &Path, reminders: &[Reminder]) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            for reminder in reminders {
                serde_json::to_writer(&mut writer, reminder)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        debug!(path = %self.path.display(), count = reminders.len(), "Rewrote reminder log");
        Ok(())
    }

    /// Replay, let `mutate` edit the live set, then rewrite the log.
    fn rewrite_with<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, Reminder>) -> Result<()>,
    {
        let _guard = self.write_guard();
        let mut replay = self.replay()?;
        mutate(&mut replay.live)?;
        self.write_all(&replay.into_sorted())
    }
}

impl ReminderStore for LocalStore {
    fn add(&self, reminder: &Reminder) -> Result<()> {
        if reminder.id.trim().is_empty() {
            return Err(Error::InvalidId("ID must not be empty".to_string()));
        }
        let _guard = self.write_guard();
        self.append(reminder)?;
        debug!(id = %reminder.id, "Added reminder");
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Reminder> {
        let _guard = self.read_guard();
        self.replay()?
            .live
            .remove(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<Reminder>> {
        let _guard = self.read_guard();
        let reminders = self.replay()?.into_sorted();
        Ok(ListFilter::apply(filter, reminders))
    }

    fn update(&self, reminder: &Reminder) -> Result<()> {
        self.rewrite_with(|live| match live.get_mut(&reminder.id) {
            Some(slot) => {
                *slot = reminder.clone();
                Ok(())
            }
            None => Err(Error::NotFound(reminder.id.clone())),
        })?;
        debug!(id = %reminder.id, "Updated reminder");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.rewrite_with(|live| {
            live.remove(id)
                .map(|_| ())
                .ok_or_else(|| Error::NotFound(id.to_string()))
        })?;
        debug!(id = %id, "Deleted reminder");
        Ok(())
    }

    fn complete(&self, id: &str) -> Result<()> {
        self.rewrite_with(|live| match live.get_mut(id) {
            Some(reminder) => {
                reminder.complete();
                Ok(())
            }
            None => Err(Error::NotFound(id.to_string())),
        })?;
        debug!(id = %id, "Completed reminder");
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Local
    }
}

/// Size of the file at `path`, or 0 if it does not exist.
fn file_len(path: &Path) -> Result<u64> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Whether the file is empty or its last byte is a newline.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
