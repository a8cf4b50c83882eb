//! Workout history retrieval.
//!
//! History is read newest first. [`LogPager`] walks it page by page with a
//! `(logged_at, id)` cursor; [`fetch_all_logs`] loads everything for
//! analytics and export.

use crate::store::{LogCursor, LogRepo, SortOrder};
use crate::{Result, UserId, WorkoutLog};

/// Page size used when the configuration does not set one
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Cursor-based pager over a user's logs, newest first
pub struct LogPager<'a, S: LogRepo> {
    store: &'a S,
    user: Option<UserId>,
    page_size: usize,
    cursor: Option<LogCursor>,
    loaded: Vec<WorkoutLog>,
    has_more: bool,
}

impl<'a, S: LogRepo> LogPager<'a, S> {
    /// Pager for `user`; no user yields a pager that is already exhausted
    pub fn new(store: &'a S, user: Option<&UserId>, page_size: usize) -> Self {
        Self {
            store,
            has_more: user.is_some(),
            user: user.cloned(),
            page_size: page_size.max(1),
            cursor: None,
            loaded: Vec::new(),
        }
    }

    /// Fetch the next page and return it.
    ///
    /// `has_more` stays true while pages come back full, so an exact
    /// multiple of the page size costs one extra (empty) fetch.
    pub fn load_more(&mut self) -> Result<&[WorkoutLog]> {
        let Some(user) = self.user.as_ref().filter(|_| self.has_more) else {
            return Ok(&[]);
        };

        let page = self.store.query_logs(
            user,
            SortOrder::Descending,
            self.cursor.as_ref(),
            Some(self.page_size),
        )?;
        self.has_more = page.len() == self.page_size;
        if let Some(last) = page.last() {
            self.cursor = Some(LogCursor::from(last));
        }

        tracing::debug!(
            "Loaded {} logs (total {}, more: {})",
            page.len(),
            self.loaded.len() + page.len(),
            self.has_more
        );

        let start = self.loaded.len();
        self.loaded.extend(page);
        Ok(&self.loaded[start..])
    }

    /// Drop everything loaded so far and fetch the first page again
    pub fn refresh(&mut self) -> Result<&[WorkoutLog]> {
        self.cursor = None;
        self.loaded.clear();
        self.has_more = self.user.is_some();
        self.load_more()
    }

    /// Everything loaded so far, newest first
    pub fn logs(&self) -> &[WorkoutLog] {
        &self.loaded
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Full history, newest first; no user means no history
pub fn fetch_all_logs<S: LogRepo>(store: &S, user: Option<&UserId>) -> Result<Vec<WorkoutLog>> {
    let Some(user) = user else {
        return Ok(Vec::new());
    };
    let logs = store.query_logs(user, SortOrder::Descending, None, None)?;
    tracing::debug!("Fetched {} logs for {}", logs.len(), user);
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::memory_store::MemoryStore;
    use crate::NewWorkoutLog;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn user() -> UserId {
        UserId::new("tester").unwrap()
    }

    /// Store holding `count` logs one minute apart, named "log 0".."log n-1"
    fn store_with_logs(count: usize) -> MemoryStore {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap(),
        ));
        let store = MemoryStore::with_clock(clock.clone());
        for i in 0..count {
            store
                .append_log(
                    &user(),
                    NewWorkoutLog {
                        name: format!("log {}", i),
                        date: clock.now(),
                        template_id: None,
                        template_name: None,
                        slot: None,
                        exercises: vec![],
                        duration_minutes: 0,
                        notes: String::new(),
                    },
                )
                .unwrap();
            clock.advance(Duration::minutes(1));
        }
        store
    }

    #[test]
    fn test_pages_walk_newest_first() {
        let store = store_with_logs(45);
        let mut pager = LogPager::new(&store, Some(&user()), DEFAULT_PAGE_SIZE);
        assert!(pager.has_more());

        let first = pager.load_more().unwrap();
        assert_eq!(first.len(), 20);
        assert_eq!(first[0].name, "log 44");
        assert!(pager.has_more());

        assert_eq!(pager.load_more().unwrap().len(), 20);
        let last = pager.load_more().unwrap();
        assert_eq!(last.len(), 5);
        assert_eq!(last[4].name, "log 0");
        assert!(!pager.has_more());

        // Exhausted pagers stay quiet
        assert!(pager.load_more().unwrap().is_empty());
        assert_eq!(pager.logs().len(), 45);
    }

    #[test]
    fn test_exact_multiple_needs_one_empty_fetch() {
        let store = store_with_logs(4);
        let mut pager = LogPager::new(&store, Some(&user()), 2);
        pager.load_more().unwrap();
        pager.load_more().unwrap();
        assert!(pager.has_more());
        assert!(pager.load_more().unwrap().is_empty());
        assert!(!pager.has_more());
    }

    #[test]
    fn test_refresh_starts_over() {
        let store = store_with_logs(3);
        let mut pager = LogPager::new(&store, Some(&user()), 2);
        pager.load_more().unwrap();
        pager.load_more().unwrap();

        let first = pager.refresh().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(pager.logs().len(), 2);
        assert!(pager.has_more());
    }

    #[test]
    fn test_no_user_is_empty() {
        let store = store_with_logs(3);
        let mut pager = LogPager::new(&store, None, 20);
        assert!(!pager.has_more());
        assert!(pager.load_more().unwrap().is_empty());
        assert!(fetch_all_logs(&store, None).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_all_newest_first() {
        let store = store_with_logs(30);
        let all = fetch_all_logs(&store, Some(&user())).unwrap();
        assert_eq!(all.len(), 30);
        assert!(all.windows(2).all(|w| w[0].logged_at >= w[1].logged_at));
    }
}
