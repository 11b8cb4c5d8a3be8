use quill_contract::{Page, PageCursor};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a fetched page may be reused before it is requested again.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

struct Entry<T> {
    page: Page<T>,
    fetched_at: Instant,
}

/// Pages of one feed keyed by their exact `{skip, take}` cursor.
pub struct PageCache<T> {
    entries: HashMap<PageCursor, Entry<T>>,
    stale_after: Duration,
}

impl<T: Clone> PageCache<T> {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stale_after,
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn get(&mut self, cursor: PageCursor) -> Option<Page<T>> {
        self.get_at(cursor, Instant::now())
    }

    /// Fresh page for `cursor`. A stale entry is dropped on the way out.
    pub fn get_at(&mut self, cursor: PageCursor, now: Instant) -> Option<Page<T>> {
        let entry = self.entries.get(&cursor)?;
        if self.is_stale(entry, now) {
            self.entries.remove(&cursor);
            return None;
        }
        Some(entry.page.clone())
    }

    fn is_stale(&self, entry: &Entry<T>, now: Instant) -> bool {
        now.saturating_duration_since(entry.fetched_at) >= self.stale_after
    }

    pub fn insert(&mut self, cursor: PageCursor, page: Page<T>) {
        self.insert_at(cursor, page, Instant::now());
    }

    pub fn insert_at(&mut self, cursor: PageCursor, page: Page<T>, fetched_at: Instant) {
        self.prune(fetched_at);
        self.entries.insert(cursor, Entry { page, fetched_at });
    }

    /// Drops every entry that is stale at `now`.
    pub fn prune(&mut self, now: Instant) {
        let stale_after = self.stale_after;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.fetched_at) < stale_after);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for PageCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_expire_after_the_window() {
        let mut cache = PageCache::default();
        let start = Instant::now();
        let cursor = PageCursor::new(0, 10);
        cache.insert_at(cursor, Page::new(vec![1, 2, 3], 3), start);

        assert_eq!(
            cache.get_at(cursor, start + Duration::from_secs(29)).map(|p| p.items),
            Some(vec![1, 2, 3])
        );
        assert!(cache.get_at(cursor, start + DEFAULT_STALE_AFTER).is_none());
    }

    #[test]
    fn cursor_must_match_exactly() {
        let mut cache = PageCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at(PageCursor::new(0, 10), Page::new(vec!["a"], 1), start);

        assert!(cache.get_at(PageCursor::new(0, 5), start).is_none());
        assert!(cache.get_at(PageCursor::new(10, 10), start).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stale_entries_are_dropped_not_kept() {
        let mut cache = PageCache::new(Duration::from_secs(10));
        let start = Instant::now();
        for skip in [0, 10, 20] {
            cache.insert_at(PageCursor::new(skip, 10), Page::new(vec![skip], 30), start);
        }

        let later = start + Duration::from_secs(10);
        assert!(cache.get_at(PageCursor::new(0, 10), later).is_none());
        assert_eq!(cache.len(), 2);

        cache.insert_at(PageCursor::new(30, 10), Page::new(vec![30], 40), later);
        assert_eq!(cache.len(), 1);
    }
}
