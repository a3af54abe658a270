//! List filtering.
//!
//! `ListFilter` is a conjunction of optional predicates. Every backend calls
//! [`ListFilter::matches`] so the semantics are identical everywhere:
//!
//! - completed reminders are dropped unless `include_completed` is set
//! - `tags` matches when the reminder has at least one of them (case-insensitive)
//! - `due_after` is inclusive, `due_before` exclusive; a reminder without a due
//!   date never satisfies either bound
//! - `search` is a case-insensitive substring of the title or the notes

use crate::models::Reminder;
use chrono::{DateTime, Utc};

/// Criteria for listing reminders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Include completed reminders in results.
    pub include_completed: bool,

    /// Keep reminders carrying any of these tags.
    pub tags: Vec<String>,

    /// Keep reminders due strictly before this instant.
    pub due_before: Option<DateTime<Utc>>,

    /// Keep reminders due at or after this instant.
    pub due_after: Option<DateTime<Utc>>,

    /// Keep reminders whose title or notes contain this text.
    pub search: Option<String>,
}

impl ListFilter {
    /// Filter that only drops completed reminders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a reminder satisfies every predicate.
    pub fn matches(&self, reminder: &Reminder) -> bool {
        if !self.include_completed && reminder.completed {
            return false;
        }

        if !self.tags.is_empty() && !self.tags.iter().any(|tag| reminder.has_tag(tag)) {
            return false;
        }

        if self.due_before.is_some() || self.due_after.is_some() {
            let Some(due) = reminder.due else {
                return false;
            };
            if self.due_before.is_some_and(|before| due >= before) {
                return false;
            }
            if self.due_after.is_some_and(|after| due < after) {
                return false;
            }
        }

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let in_title = reminder.title.to_lowercase().contains(&needle);
            let in_notes = reminder
                .notes
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle));
            if !in_title && !in_notes {
                return false;
            }
        }

        true
    }

    /// Apply an optional filter to a list of reminders.
    pub fn apply(filter: Option<&ListFilter>, reminders: Vec<Reminder>) -> Vec<Reminder> {
        match filter {
            Some(f) => reminders.into_iter().filter(|r| f.matches(r)).collect(),
            None => reminders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn reminder(title: &str) -> Reminder {
        Reminder::new(title).unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_default_excludes_completed() {
        let open = reminder("Open");
        let mut done = reminder("Done");
        done.complete();

        let filter = ListFilter::new();
        assert!(filter.matches(&open));
        assert!(!filter.matches(&done));

        let all = ListFilter {
            include_completed: true,
            ..Default::default()
        };
        assert!(all.matches(&done));
    }

    #[test]
    fn test_tags_or_semantics_case_insensitive() {
        let mut r = reminder("Tagged");
        r.add_tag("Work");

        let work = ListFilter {
            tags: vec!["work".to_string()],
            ..Default::default()
        };
        let either = ListFilter {
            tags: vec!["home".to_string(), "WORK".to_string()],
            ..Default::default()
        };
        let home = ListFilter {
            tags: vec!["home".to_string()],
            ..Default::default()
        };

        assert!(work.matches(&r));
        assert!(either.matches(&r));
        assert!(!home.matches(&r));
    }

    #[test]
    fn test_composition_work_due_tomorrow() {
        let mut r = reminder("Ship it");
        r.add_tag("work");
        r.set_due(Utc::now() + Duration::days(1));

        let matching = ListFilter {
            tags: vec!["work".to_string()],
            include_completed: false,
            ..Default::default()
        };
        let other = ListFilter {
            tags: vec!["home".to_string()],
            ..Default::default()
        };

        assert!(matching.matches(&r));
        assert!(!other.matches(&r));
    }

    #[test]
    fn test_due_bounds_half_open() {
        let filter = ListFilter {
            due_after: Some(at(10)),
            due_before: Some(at(11)),
            ..Default::default()
        };

        let mut on_start = reminder("start");
        on_start.set_due(at(10));
        let mut on_end = reminder("end");
        on_end.set_due(at(11));
        let mut before = reminder("before");
        before.set_due(at(9));

        assert!(filter.matches(&on_start));
        assert!(!filter.matches(&on_end));
        assert!(!filter.matches(&before));
    }

    #[test]
    fn test_absent_due_never_matches_bound() {
        let r = reminder("No deadline");
        let before = ListFilter {
            due_before: Some(at(20)),
            ..Default::default()
        };
        let after = ListFilter {
            due_after: Some(at(1)),
            ..Default::default()
        };
        assert!(!before.matches(&r));
        assert!(!after.matches(&r));
        assert!(ListFilter::new().matches(&r));
    }

    #[test]
    fn test_search_title_or_notes() {
        let mut r = reminder("Call Mom");
        r.set_notes("Birthday next WEEK");

        let by_title = ListFilter {
            search: Some("mom".to_string()),
            ..Default::default()
        };
        let by_notes = ListFilter {
            search: Some("week".to_string()),
            ..Default::default()
        };
        let miss = ListFilter {
            search: Some("dentist".to_string()),
            ..Default::default()
        };

        assert!(by_title.matches(&r));
        assert!(by_notes.matches(&r));
        assert!(!miss.matches(&r));
    }

    #[test]
    fn test_apply_none_returns_everything() {
        let mut done = reminder("Done");
        done.complete();
        let all = ListFilter::apply(None, vec![reminder("Open"), done]);
        assert_eq!(all.len(), 2);
    }
}
