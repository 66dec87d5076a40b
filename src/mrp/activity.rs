//! Agent activity stream: logging and polling

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::identity::EntityId;
use crate::core::store::{RecordStore, RecordStoreExt, StoreError};
use crate::entities::activity::{AgentActivity, Severity};

/// Fixed poll interval for the activity stream
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Append an entry to the stream
pub fn log<S: RecordStore + ?Sized>(
    store: &mut S,
    agent: &str,
    action: &str,
    details: Option<&str>,
    severity: Severity,
) -> Result<AgentActivity, StoreError> {
    let mut entry = AgentActivity::new(agent, action).with_severity(severity);
    if let Some(d) = details {
        entry = entry.with_details(d);
    }
    store.insert(&entry)?;
    Ok(entry)
}

/// Most recent entries, newest first
pub fn recent<S: RecordStore + ?Sized>(store: &S, limit: usize) -> Result<Vec<AgentActivity>, StoreError> {
    let mut all: Vec<AgentActivity> = store.list()?;
    all.sort_by(|a, b| b.created.cmp(&a.created));
    all.truncate(limit);
    Ok(all)
}

/// Tracks the newest timestamp seen, and the entries logged at it, so each
/// poll yields only fresh entries
#[derive(Debug, Clone)]
pub struct ActivityPoller {
    interval: Duration,
    /// Entries at or before this are never reported
    floor: Option<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
    seen_at_last: HashSet<EntityId>,
}

impl Default for ActivityPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl ActivityPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            floor: None,
            last_seen: None,
            seen_at_last: HashSet::new(),
        }
    }

    /// Start after the given timestamp instead of replaying history
    pub fn starting_after(mut self, ts: DateTime<Utc>) -> Self {
        self.floor = Some(ts);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen.max(self.floor)
    }

    fn is_fresh(&self, entry: &AgentActivity) -> bool {
        if self.floor.is_some_and(|floor| entry.created <= floor) {
            return false;
        }
        match self.last_seen {
            None => true,
            Some(seen) if entry.created == seen => !self.seen_at_last.contains(&entry.id),
            Some(seen) => entry.created > seen,
        }
    }

    /// Record entries as already reported
    pub fn mark_seen(&mut self, entries: &[AgentActivity]) {
        let Some(newest) = entries.iter().map(|a| a.created).max() else {
            return;
        };
        match self.last_seen {
            Some(seen) if seen > newest => return,
            Some(seen) if seen == newest => {}
            _ => {
                self.last_seen = Some(newest);
                self.seen_at_last.clear();
            }
        }
        self.seen_at_last.extend(
            entries
                .iter()
                .filter(|a| a.created == newest)
                .map(|a| a.id.clone()),
        );
    }

    /// Entries not yet reported, oldest first
    pub fn poll<S: RecordStore + ?Sized>(&mut self, store: &S) -> Result<Vec<AgentActivity>, StoreError> {
        let mut fresh: Vec<AgentActivity> = store
            .list::<AgentActivity>()?
            .into_iter()
            .filter(|a| self.is_fresh(a))
            .collect();
        fresh.sort_by(|a, b| a.created.cmp(&b.created));

        self.mark_seen(&fresh);
        tracing::debug!(count = fresh.len(), "activity poll");
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::SqliteStore;
    use chrono::Duration as ChronoDuration;

    fn entry_at(action: &str, created: DateTime<Utc>) -> AgentActivity {
        let mut a = AgentActivity::new("tester", action);
        a.created = created;
        a
    }

    #[test]
    fn test_poll_yields_only_newer_entries() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        store.insert(&entry_at("first", t0)).unwrap();
        store.insert(&entry_at("second", t0 + ChronoDuration::seconds(1))).unwrap();

        let mut poller = ActivityPoller::default();
        assert_eq!(poller.interval(), Duration::from_secs(30));
        let first = poller.poll(&store).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].action, "first");

        assert!(poller.poll(&store).unwrap().is_empty());

        store.insert(&entry_at("third", t0 + ChronoDuration::seconds(5))).unwrap();
        let next = poller.poll(&store).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].action, "third");
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        for i in 0..5 {
            store
                .insert(&entry_at(&format!("a{}", i), t0 + ChronoDuration::seconds(i)))
                .unwrap();
        }
        let latest = recent(&store, 2).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].action, "a4");
        assert_eq!(latest[1].action, "a3");
    }

    #[test]
    fn test_log_sets_severity() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let entry = log(&mut store, "auto-po", "drafted PO", Some("3 lines"), Severity::Warning).unwrap();
        assert_eq!(entry.severity, Severity::Warning);
        assert_eq!(recent(&store, 10).unwrap()[0].details.as_deref(), Some("3 lines"));
    }

    #[test]
    fn test_poll_keeps_entries_sharing_the_newest_timestamp() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        store.insert(&entry_at("first", t0)).unwrap();

        let mut poller = ActivityPoller::default();
        assert_eq!(poller.poll(&store).unwrap().len(), 1);
        assert_eq!(poller.last_seen(), Some(t0));

        // Logged in the same instant, after the previous poll
        store.insert(&entry_at("twin", t0)).unwrap();
        let next = poller.poll(&store).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].action, "twin");

        assert!(poller.poll(&store).unwrap().is_empty());
    }

    #[test]
    fn test_starting_after_skips_history() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        store.insert(&entry_at("old", t0)).unwrap();
        store.insert(&entry_at("same instant", t0)).unwrap();

        let mut poller = ActivityPoller::default().starting_after(t0);
        assert!(poller.poll(&store).unwrap().is_empty());

        store.insert(&entry_at("new", t0 + ChronoDuration::seconds(1))).unwrap();
        let next = poller.poll(&store).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].action, "new");
    }

    #[test]
    fn test_mark_seen_hides_backlog() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        let shown = entry_at("shown", t0);
        store.insert(&entry_at("older", t0 - ChronoDuration::seconds(3))).unwrap();
        store.insert(&shown).unwrap();
        store.insert(&entry_at("unshown twin", t0)).unwrap();

        let mut poller = ActivityPoller::default();
        poller.mark_seen(&[shown]);
        let next = poller.poll(&store).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].action, "unshown twin");
    }
}
