//! Process-local store backing every repository trait.
//!
//! Used by the `memory` storage backend and by the test suites. Semantics
//! follow the Postgres queries: same filters, same ordering with `id` as the
//! tie-breaker, same not-found and slug-conflict errors.

use super::{CommentRepository, MediaRepository, PostRepository, UserRepository};
use crate::domain::comment::{CommentFilter, NewComment};
use crate::domain::media::NewMedia;
use crate::domain::post::{NewPost, PostChanges, PostFilter, PostOrder};
use crate::domain::user::ExternalProfile;
use crate::domain::{Comment, DomainError, Media, Post, User};
use async_trait::async_trait;
use chrono::Utc;
use quill_contract::{Role, SortField, SortOrder};
use std::cmp::Ordering;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    media: Vec<Media>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(items: &[&T], limit: i64, offset: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .map(|item| (*item).clone())
        .collect()
}

fn compare_posts(a: &Post, b: &Post, order: PostOrder) -> Ordering {
    let by_field = match order.field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.cmp(&b.title),
    }
    .then(a.id.cmp(&b.id));

    match order.order {
        SortOrder::Asc => by_field,
        SortOrder::Desc => by_field.reverse(),
    }
}

/// Newest first, like the `ORDER BY created_at DESC, id DESC` queries.
fn newest_first<T>(items: &mut [&T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, author_id: i64, post: NewPost) -> Result<Post, DomainError> {
        let mut state = self.state.write().await;
        if state.posts.iter().any(|p| p.slug == post.slug) {
            return Err(DomainError::SlugTaken(post.slug));
        }

        let now = Utc::now();
        let post = Post {
            id: state.next_id(),
            title: post.title,
            content: post.content,
            published: Some(false),
            author_id,
            slug: post.slug,
            thumbnail_id: post.thumbnail_id,
            tags: post.tags,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let state = self.state.read().await;
        state
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(DomainError::PostNotFound)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Post, DomainError> {
        let state = self.state.read().await;
        state
            .posts
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or(DomainError::PostNotFound)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError> {
        let mut state = self.state.write().await;
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = Some(content);
        }
        if let Some(thumbnail_id) = changes.thumbnail_id {
            post.thumbnail_id = Some(thumbnail_id);
        }
        if let Some(tags) = changes.tags {
            post.tags = tags;
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn toggle_published(&self, id: i64) -> Result<Post, DomainError> {
        let mut state = self.state.write().await;
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;

        post.published = Some(!post.is_published());
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        if state.posts.len() == before {
            return Err(DomainError::PostNotFound);
        }
        state.comments.retain(|c| c.post_id != id);
        for media in state.media.iter_mut().filter(|m| m.post_id == Some(id)) {
            media.post_id = None;
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, i64), DomainError> {
        let state = self.state.read().await;
        let mut matching: Vec<&Post> = state.posts.iter().filter(|p| filter.matches(p)).collect();
        matching.sort_by(|a, b| compare_posts(a, b, order));

        let total = matching.len() as i64;
        Ok((page(&matching, limit, offset), total))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn upsert_external(&self, profile: &ExternalProfile) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if let Some(user) = state
            .users
            .iter_mut()
            .find(|u| u.provider == profile.provider && u.provider_id == profile.provider_id)
        {
            user.name = profile.name.clone();
            user.avatar = profile.avatar.clone();
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: state.next_id(),
            name: profile.name.clone(),
            avatar: profile.avatar.clone(),
            role: Role::Guest,
            provider: profile.provider.clone(),
            provider_id: profile.provider_id.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        let state = self.state.read().await;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn set_role(&self, id: i64, role: Role) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFound)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64), DomainError> {
        let state = self.state.read().await;
        let mut users: Vec<&User> = state.users.iter().collect();
        newest_first(&mut users, |u| (u.created_at, u.id));
        Ok((page(&users, limit, offset), users.len() as i64))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let mut state = self.state.write().await;
        let comment = Comment {
            id: state.next_id(),
            message: comment.message,
            author_id: comment.author_id,
            post_id: comment.post_id,
            chief: comment.chief,
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError> {
        let state = self.state.read().await;
        state
            .comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(DomainError::CommentNotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        if state.comments.len() == before {
            Err(DomainError::CommentNotFound)
        } else {
            Ok(())
        }
    }

    async fn list(
        &self,
        filter: CommentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), DomainError> {
        let state = self.state.read().await;
        let mut comments: Vec<&Comment> =
            state.comments.iter().filter(|c| filter.matches(c)).collect();
        newest_first(&mut comments, |c| (c.created_at, c.id));
        Ok((page(&comments, limit, offset), comments.len() as i64))
    }
}

#[async_trait]
impl MediaRepository for InMemoryStore {
    async fn create(&self, media: NewMedia) -> Result<Media, DomainError> {
        let mut state = self.state.write().await;
        let media = Media {
            id: state.next_id(),
            path: media.path,
            ext: media.ext,
            post_id: media.post_id,
            created_at: Utc::now(),
        };
        state.media.push(media.clone());
        Ok(media)
    }

    async fn find_by_id(&self, id: i64) -> Result<Media, DomainError> {
        let state = self.state.read().await;
        state
            .media
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(DomainError::MediaNotFound)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Media>, i64), DomainError> {
        let state = self.state.read().await;
        let mut media: Vec<&Media> = state.media.iter().collect();
        newest_first(&mut media, |m| (m.created_at, m.id));
        Ok((page(&media, limit, offset), media.len() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, content: Option<&str>) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: content.map(str::to_string),
            slug: quill_contract::post::slugify(title),
            thumbnail_id: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn search_matches_title_or_content() {
        let store = InMemoryStore::new();
        PostRepository::create(&store, 1, draft("Borrow checker", Some("lifetimes explained")))
            .await
            .unwrap();
        PostRepository::create(&store, 1, draft("Async", Some("pinning and wakers")))
            .await
            .unwrap();

        let (items, total) = PostRepository::list(
            &store,
            &PostFilter::matching("wakers"),
            PostOrder::default(),
            10,
            0,
        )
        .await
        .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].title, "Async");

        let (items, total) = PostRepository::list(
            &store,
            &PostFilter::matching("garbage collector"),
            PostOrder::default(),
            10,
            0,
        )
        .await
        .unwrap();
        assert_eq!(total, 0);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let store = InMemoryStore::new();
        PostRepository::create(&store, 1, draft("Same", None)).await.unwrap();
        let err = PostRepository::create(&store, 1, draft("Same", None)).await.unwrap_err();
        assert!(matches!(err, DomainError::SlugTaken(slug) if slug == "same"));
    }

    #[tokio::test]
    async fn upsert_keeps_role_and_refreshes_profile() {
        let store = InMemoryStore::new();
        let mut profile = ExternalProfile {
            provider: "github".into(),
            provider_id: "7".into(),
            name: "Old".into(),
            avatar: None,
        };
        let user = store.upsert_external(&profile).await.unwrap();
        store.set_role(user.id, Role::Admin).await.unwrap();

        profile.name = "New".into();
        let again = store.upsert_external(&profile).await.unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(again.name, "New");
        assert_eq!(again.role, Role::Admin);
    }
}
