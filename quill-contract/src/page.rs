use serde::{Deserialize, Serialize};

pub const DEFAULT_TAKE: i64 = 10;
pub const MAX_TAKE: i64 = 100;

/// One page of a feed together with the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Offset pagination position. Not an opaque continuation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor {
    pub skip: i64,
    pub take: i64,
}

impl PageCursor {
    pub fn new(skip: i64, take: i64) -> Self {
        Self { skip, take }
    }

    pub fn first(take: i64) -> Self {
        Self { skip: 0, take }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub take: Option<i64>,
}

impl PageQuery {
    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            skip: self.skip.unwrap_or(0),
            take: self.take.unwrap_or(DEFAULT_TAKE),
        }
    }
}

impl From<PageCursor> for PageQuery {
    fn from(cursor: PageCursor) -> Self {
        Self {
            skip: Some(cursor.skip),
            take: Some(cursor.take),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query string accepted by the post feeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<SortField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl FeedQuery {
    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            skip: self.skip.unwrap_or(0),
            take: self.take.unwrap_or(DEFAULT_TAKE),
        }
    }

    pub fn at(mut self, cursor: PageCursor) -> Self {
        self.skip = Some(cursor.skip);
        self.take = Some(cursor.take);
        self
    }

    /// Blank search strings mean "no filter".
    pub fn search(&self) -> Option<&str> {
        self.search_string
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
