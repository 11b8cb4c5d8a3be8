use chrono::{DateTime, Utc};
use quill_contract::{PostDto, SortField, SortOrder};

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub author_id: i64,
    pub slug: String,
    pub thumbnail_id: Option<i64>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.published.unwrap_or(false)
    }
}

/// Row to insert; drafts start unpublished.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: Option<String>,
    pub slug: String,
    pub thumbnail_id: Option<i64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub thumbnail_id: Option<i64>,
    pub tags: Option<Vec<String>>,
}

/// Predicate shared by the item query and the count query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    /// Substring of title OR content.
    pub search: Option<String>,
    pub published: Option<bool>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            search: None,
            published: Some(true),
        }
    }

    pub fn matching(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            published: None,
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if let Some(published) = self.published {
            if post.is_published() != published {
                return false;
            }
        }
        match &self.search {
            Some(term) => {
                post.title.contains(term.as_str())
                    || post
                        .content
                        .as_deref()
                        .is_some_and(|c| c.contains(term.as_str()))
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostOrder {
    pub field: SortField,
    pub order: SortOrder,
}

impl PostOrder {
    pub fn new(field: Option<SortField>, order: Option<SortOrder>) -> Self {
        Self {
            field: field.unwrap_or_default(),
            order: order.unwrap_or_default(),
        }
    }

    pub fn column(&self) -> &'static str {
        match self.field {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Title => "title",
        }
    }

    pub fn direction(&self) -> &'static str {
        match self.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            published: post.published,
            author_id: post.author_id,
            slug: post.slug,
            thumbnail_id: post.thumbnail_id,
            tags: post.tags,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}
