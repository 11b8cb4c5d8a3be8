use super::page_bounds;
use crate::data::{MediaRepository, PostRepository};
use crate::domain::post::{NewPost, PostChanges, PostFilter, PostOrder};
use crate::domain::{Actor, DomainError};
use quill_contract::post::slugify;
use quill_contract::{
    CreatePostRequest, FeedQuery, Page, PageCursor, PostDto, Role, UpdatePostRequest,
};
use std::sync::Arc;
use validator::Validate;

const SLUG_ATTEMPTS: usize = 50;

pub struct PostService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    media_repo: Arc<dyn MediaRepository + Send + Sync>,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        media_repo: Arc<dyn MediaRepository + Send + Sync>,
    ) -> Self {
        Self {
            post_repo,
            media_repo,
        }
    }

    /// Published posts, newest first unless the query says otherwise.
    pub async fn feed(&self, query: &FeedQuery) -> Result<Page<PostDto>, DomainError> {
        let filter = PostFilter {
            search: query.search().map(str::to_string),
            published: Some(true),
        };
        self.list(&filter, query).await
    }

    /// Every post including drafts, optionally narrowed by `published`.
    pub async fn admin_list(
        &self,
        actor: &Actor,
        query: &FeedQuery,
    ) -> Result<Page<PostDto>, DomainError> {
        actor.require(Role::Admin)?;
        let filter = PostFilter {
            search: query.search().map(str::to_string),
            published: query.published,
        };
        self.list(&filter, query).await
    }

    /// Posts whose title or content contains `term`.
    pub async fn search(
        &self,
        term: &str,
        cursor: PageCursor,
    ) -> Result<Page<PostDto>, DomainError> {
        let query = FeedQuery::default().at(cursor);
        self.list(&PostFilter::matching(term), &query).await
    }

    async fn list(
        &self,
        filter: &PostFilter,
        query: &FeedQuery,
    ) -> Result<Page<PostDto>, DomainError> {
        let (limit, offset) = page_bounds(query.cursor())?;
        let order = PostOrder::new(query.order_by, query.order);

        tracing::debug!(
            "Listing posts: filter={:?}, order={:?}, limit={}, offset={}",
            filter,
            order,
            limit,
            offset
        );

        let (posts, total) = self.post_repo.list(filter, order, limit, offset).await?;
        Ok(Page::new(posts.into_iter().map(PostDto::from).collect(), total))
    }

    pub async fn get_post(&self, id: i64) -> Result<PostDto, DomainError> {
        let post = self.post_repo.find_by_id(id).await?;
        Ok(PostDto::from(post))
    }

    /// Drafts are invisible through the slug lookup.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<PostDto, DomainError> {
        let post = self.post_repo.find_by_slug(slug).await?;
        if !post.is_published() {
            return Err(DomainError::PostNotFound);
        }
        Ok(PostDto::from(post))
    }

    pub async fn create_post(
        &self,
        actor: &Actor,
        req: CreatePostRequest,
    ) -> Result<PostDto, DomainError> {
        actor.require(Role::Admin)?;
        req.validate()?;
        if let Some(thumbnail_id) = req.thumbnail_id {
            self.ensure_media(thumbnail_id).await?;
        }

        let slug = match req.slug.as_deref() {
            Some(explicit) => {
                let slug = slugify(explicit);
                if slug.is_empty() {
                    return Err(DomainError::ValidationError(
                        "slug must contain letters or digits".to_string(),
                    ));
                }
                slug
            }
            None => self.unique_slug(&req.title).await?,
        };

        let post = self
            .post_repo
            .create(
                actor.id,
                NewPost {
                    title: req.title.trim().to_string(),
                    content: req.content,
                    slug,
                    thumbnail_id: req.thumbnail_id,
                    tags: normalize_tags(req.tags),
                },
            )
            .await?;

        tracing::info!(
            "Post created: id={}, slug={}, author_id={}",
            post.id,
            post.slug,
            actor.id
        );

        Ok(PostDto::from(post))
    }

    /// First free slug among `base`, `base-2`, `base-3`...
    async fn unique_slug(&self, title: &str) -> Result<String, DomainError> {
        let mut base = slugify(title);
        if base.is_empty() {
            base = "post".to_string();
        }

        for attempt in 1..=SLUG_ATTEMPTS {
            let candidate = if attempt == 1 {
                base.clone()
            } else {
                format!("{}-{}", base, attempt)
            };
            match self.post_repo.find_by_slug(&candidate).await {
                Err(DomainError::PostNotFound) => return Ok(candidate),
                Err(e) => return Err(e),
                Ok(_) => continue,
            }
        }

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Ok(format!("{}-{}", base, &suffix[..8]))
    }

    pub async fn update_post(
        &self,
        actor: &Actor,
        id: i64,
        req: UpdatePostRequest,
    ) -> Result<PostDto, DomainError> {
        actor.require(Role::Admin)?;
        req.validate()?;
        if req.is_empty() {
            return Err(DomainError::ValidationError(
                "Nothing to update".to_string(),
            ));
        }
        if let Some(thumbnail_id) = req.thumbnail_id {
            self.ensure_media(thumbnail_id).await?;
        }

        let changes = PostChanges {
            title: req.title.map(|t| t.trim().to_string()),
            content: req.content,
            thumbnail_id: req.thumbnail_id,
            tags: req.tags.map(normalize_tags),
        };
        let post = self.post_repo.update(id, changes).await?;

        tracing::info!("Post updated: id={}, by user_id={}", id, actor.id);

        Ok(PostDto::from(post))
    }

    pub async fn toggle_publish(&self, actor: &Actor, id: i64) -> Result<PostDto, DomainError> {
        actor.require(Role::Admin)?;
        let post = self.post_repo.toggle_published(id).await?;

        tracing::info!(
            "Post {} is now {}",
            id,
            if post.is_published() { "published" } else { "a draft" }
        );

        Ok(PostDto::from(post))
    }

    pub async fn delete_post(&self, actor: &Actor, id: i64) -> Result<(), DomainError> {
        actor.require(Role::Admin)?;
        self.post_repo.delete(id).await?;

        tracing::info!("Post deleted: id={}, by user_id={}", id, actor.id);

        Ok(())
    }

    async fn ensure_media(&self, id: i64) -> Result<(), DomainError> {
        match self.media_repo.find_by_id(id).await {
            Ok(_) => Ok(()),
            Err(DomainError::MediaNotFound) => Err(DomainError::InvalidParam(format!(
                "thumbnail {} does not exist",
                id
            ))),
            Err(e) => Err(e),
        }
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
