//! Paginated feeds over any page-returning endpoint.
//!
//! A [`Feed`] drives a [`FeedPager`] with pages from a [`PageSource`],
//! reusing recently fetched pages from its [`PageCache`].

use crate::cache::PageCache;
use crate::error::ClientError;
use crate::http_client::HttpClient;
use async_trait::async_trait;
use quill_contract::{
    CommentDto, CommentQuery, FeedPager, FeedQuery, MediaDto, Page, PageCursor, PostDto,
    SettleOutcome, UserDto,
};
use std::time::Duration;

/// Something that returns one page for a cursor.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Page<T>, ClientError>;
}

/// Published posts, in the order the query asks for.
pub struct PublishedPosts {
    pub client: HttpClient,
    pub query: FeedQuery,
}

#[async_trait]
impl PageSource<PostDto> for PublishedPosts {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Page<PostDto>, ClientError> {
        self.client.feed(&self.query.clone().at(cursor)).await
    }
}

/// Every post including drafts.
pub struct AllPosts {
    pub client: HttpClient,
    pub query: FeedQuery,
}

#[async_trait]
impl PageSource<PostDto> for AllPosts {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Page<PostDto>, ClientError> {
        self.client.admin_posts(&self.query.clone().at(cursor)).await
    }
}

pub struct SearchResults {
    pub client: HttpClient,
    pub term: String,
}

#[async_trait]
impl PageSource<PostDto> for SearchResults {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Page<PostDto>, ClientError> {
        self.client.filter_posts(&self.term, cursor).await
    }
}

/// Comments of one post, or the moderation feed when `post_id` is `None`.
pub struct Comments {
    pub client: HttpClient,
    pub post_id: Option<i64>,
    pub chief: Option<bool>,
}

#[async_trait]
impl PageSource<CommentDto> for Comments {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Page<CommentDto>, ClientError> {
        let query = CommentQuery {
            skip: Some(cursor.skip),
            take: Some(cursor.take),
            chief: self.chief,
        };
        match self.post_id {
            Some(post_id) => self.client.post_comments(post_id, &query).await,
            None => self.client.moderation_comments(&query).await,
        }
    }
}

pub struct Users {
    pub client: HttpClient,
}

#[async_trait]
impl PageSource<UserDto> for Users {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Page<UserDto>, ClientError> {
        self.client.list_users(cursor).await
    }
}

pub struct MediaLibrary {
    pub client: HttpClient,
}

#[async_trait]
impl PageSource<MediaDto> for MediaLibrary {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Page<MediaDto>, ClientError> {
        self.client.list_media(cursor).await
    }
}

pub struct Feed<T, S> {
    source: S,
    pager: FeedPager<T>,
    cache: PageCache<T>,
}

impl<T, S> Feed<T, S>
where
    T: Clone + Send,
    S: PageSource<T>,
{
    pub fn new(source: S, limit: i64) -> Self {
        Self {
            source,
            pager: FeedPager::new(limit),
            cache: PageCache::default(),
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.cache = PageCache::new(stale_after);
        self
    }

    pub fn items(&self) -> &[T] {
        self.pager.items()
    }

    pub fn total(&self) -> Option<i64> {
        self.pager.total()
    }

    pub fn has_next_page(&self) -> bool {
        self.pager.has_next_page()
    }

    pub fn error(&self) -> Option<&str> {
        self.pager.error()
    }

    pub fn pager(&self) -> &FeedPager<T> {
        &self.pager
    }

    /// Fetches and merges the next page. `Ok(None)` means nothing was
    /// requested because the feed is exhausted or a fetch is outstanding.
    pub async fn fetch_next(&mut self) -> Result<Option<usize>, ClientError> {
        let Some(ticket) = self.pager.begin() else {
            return Ok(None);
        };
        let cursor = ticket.cursor();

        let result = match self.cache.get(cursor) {
            Some(page) => {
                tracing::debug!("Page skip={} take={} served from cache", cursor.skip, cursor.take);
                Ok(page)
            }
            None => {
                let fetched = self.source.fetch_page(cursor).await;
                if let Ok(page) = &fetched {
                    self.cache.insert(cursor, page.clone());
                }
                fetched
            }
        };

        match result {
            Ok(page) => {
                match self.pager.settle(ticket, Ok::<_, ClientError>(page)) {
                    SettleOutcome::Merged { added } => Ok(Some(added)),
                    _ => Ok(None),
                }
            }
            Err(err) => {
                tracing::warn!("Fetching page skip={} failed: {}", cursor.skip, err);
                self.pager.settle(ticket, Err::<Page<T>, _>(&err));
                Err(err)
            }
        }
    }

    /// Fetches until the reported total is reached.
    pub async fn fetch_all(&mut self) -> Result<&[T], ClientError> {
        while self.has_next_page() {
            match self.fetch_next().await? {
                // an empty page before the total means the feed shrank
                Some(0) | None => break,
                Some(_) => {}
            }
        }
        Ok(self.pager.items())
    }

    /// Forgets every fetched page, cached ones included.
    pub fn refresh(&mut self) {
        self.pager.reset();
        self.cache.clear();
    }
}
