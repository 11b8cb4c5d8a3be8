//! Client-side state of an offset-paginated feed.
//!
//! The pager never performs I/O. A caller asks it for a [`FetchTicket`],
//! performs the request for the ticket's cursor however it likes (reqwest,
//! gloo, a cache lookup) and hands the outcome back through
//! [`FeedPager::settle`]. Only one ticket can be outstanding at a time and a
//! ticket is consumed when settled, so the "already fetching" check and its
//! release cannot drift apart.

use crate::page::{Page, PageCursor, DEFAULT_TAKE, MAX_TAKE};
use std::fmt::Display;

/// Permission to fetch exactly one page.
///
/// Deliberately neither `Clone` nor `Copy`: settling consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct FetchTicket {
    id: u64,
    cursor: PageCursor,
}

impl FetchTicket {
    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The page was appended.
    Merged { added: usize },
    /// The request failed; nothing was merged.
    Failed,
    /// The ticket predates a reset and was ignored.
    Stale,
}

#[derive(Debug, Clone)]
pub struct FeedPager<T> {
    limit: i64,
    items: Vec<T>,
    total: Option<i64>,
    pages: i64,
    in_flight: Option<u64>,
    issued: u64,
    error: Option<String>,
}

impl<T> Default for FeedPager<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TAKE)
    }
}

impl<T> FeedPager<T> {
    /// `limit` is clamped to what the API accepts for `take`.
    pub fn new(limit: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_TAKE),
            items: Vec::new(),
            total: None,
            pages: 0,
            in_flight: None,
            issued: 0,
            error: None,
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Server-reported size of the feed, unknown until the first page lands.
    pub fn total(&self) -> Option<i64> {
        self.total
    }

    pub fn pages_fetched(&self) -> i64 {
        self.pages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_next_page(&self) -> bool {
        match self.total {
            None => true,
            Some(total) => total > self.items.len() as i64,
        }
    }

    /// Cursor of the page after the last merged one: `skip = N * L`.
    pub fn next_cursor(&self) -> PageCursor {
        PageCursor::new(self.pages * self.limit, self.limit)
    }

    /// Issues a ticket for the next page, or `None` when a fetch is already
    /// outstanding or the feed is exhausted.
    pub fn begin(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() || !self.has_next_page() {
            return None;
        }
        self.issued += 1;
        self.in_flight = Some(self.issued);
        self.error = None;
        Some(FetchTicket {
            id: self.issued,
            cursor: self.next_cursor(),
        })
    }

    pub fn settle<E: Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Page<T>, E>,
    ) -> SettleOutcome {
        if self.in_flight != Some(ticket.id) {
            return SettleOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let added = page.items.len();
                self.items.extend(page.items);
                self.total = Some(page.total);
                self.pages += 1;
                SettleOutcome::Merged { added }
            }
            Err(err) => {
                self.error = Some(err.to_string());
                SettleOutcome::Failed
            }
        }
    }

    /// Forgets everything fetched so far. An outstanding ticket becomes stale.
    pub fn reset(&mut self) {
        self.items.clear();
        self.total = None;
        self.pages = 0;
        self.in_flight = None;
        self.error = None;
    }
}
