use super::page_bounds;
use crate::data::{CommentRepository, PostRepository};
use crate::domain::comment::{CommentFilter, NewComment};
use crate::domain::{Actor, DomainError};
use quill_contract::{CommentDto, CreateCommentRequest, Page, PageCursor, Role};
use std::sync::Arc;
use validator::Validate;

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository + Send + Sync>,
    post_repo: Arc<dyn PostRepository + Send + Sync>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository + Send + Sync>,
        post_repo: Arc<dyn PostRepository + Send + Sync>,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
        }
    }

    pub async fn list_for_post(
        &self,
        post_id: i64,
        chief: Option<bool>,
        cursor: PageCursor,
    ) -> Result<Page<CommentDto>, DomainError> {
        let (limit, offset) = page_bounds(cursor)?;
        // 404 for an unknown post rather than an empty page
        self.post_repo.find_by_id(post_id).await?;

        let filter = CommentFilter {
            post_id: Some(post_id),
            chief,
        };
        let (comments, total) = self.comment_repo.list(filter, limit, offset).await?;
        Ok(Page::new(
            comments.into_iter().map(CommentDto::from).collect(),
            total,
        ))
    }

    /// All comments across posts, for moderation.
    pub async fn moderation_feed(
        &self,
        actor: &Actor,
        chief: Option<bool>,
        cursor: PageCursor,
    ) -> Result<Page<CommentDto>, DomainError> {
        actor.require(Role::Admin)?;
        let (limit, offset) = page_bounds(cursor)?;

        let filter = CommentFilter {
            post_id: None,
            chief,
        };
        let (comments, total) = self.comment_repo.list(filter, limit, offset).await?;
        Ok(Page::new(
            comments.into_iter().map(CommentDto::from).collect(),
            total,
        ))
    }

    pub async fn create_comment(
        &self,
        actor: &Actor,
        post_id: i64,
        req: CreateCommentRequest,
    ) -> Result<CommentDto, DomainError> {
        req.validate()?;
        if req.message.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "message: must not be blank".to_string(),
            ));
        }
        self.post_repo.find_by_id(post_id).await?;

        let chief = req.chief && actor.role.satisfies(Role::Admin);
        let comment = self
            .comment_repo
            .create(NewComment {
                message: req.message.trim().to_string(),
                author_id: actor.id,
                post_id,
                chief,
            })
            .await?;

        tracing::info!(
            "Comment created: id={}, post_id={}, author_id={}, chief={}",
            comment.id,
            post_id,
            actor.id,
            chief
        );

        Ok(CommentDto::from(comment))
    }

    /// Admins delete any comment, authors their own.
    pub async fn delete_comment(&self, actor: &Actor, id: i64) -> Result<(), DomainError> {
        let comment = self.comment_repo.find_by_id(id).await?;
        if comment.author_id != actor.id {
            actor.require(Role::Admin)?;
        }

        self.comment_repo.delete(id).await?;
        tracing::info!("Comment deleted: id={}, by user_id={}", id, actor.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryStore;
    use crate::domain::post::NewPost;

    async fn with_post() -> (CommentService, i64) {
        let store = Arc::new(InMemoryStore::new());
        let post = PostRepository::create(
            store.as_ref(),
            1,
            NewPost {
                title: "Post".into(),
                content: None,
                slug: "post".into(),
                thumbnail_id: None,
                tags: vec![],
            },
        )
        .await
        .unwrap();
        (CommentService::new(store.clone(), store), post.id)
    }

    const GUEST: Actor = Actor {
        id: 7,
        role: Role::Guest,
    };
    const ADMIN: Actor = Actor {
        id: 1,
        role: Role::Admin,
    };

    fn message(text: &str, chief: bool) -> CreateCommentRequest {
        CreateCommentRequest {
            message: text.into(),
            chief,
        }
    }

    #[tokio::test]
    async fn chief_flag_only_sticks_for_admins() {
        let (svc, post_id) = with_post().await;
        let by_guest = svc
            .create_comment(&GUEST, post_id, message("hi", true))
            .await
            .unwrap();
        let by_admin = svc
            .create_comment(&ADMIN, post_id, message("pinned", true))
            .await
            .unwrap();
        assert!(!by_guest.chief);
        assert!(by_admin.chief);

        let chiefs = svc
            .list_for_post(post_id, Some(true), PageCursor::first(10))
            .await
            .unwrap();
        assert_eq!(chiefs.total, 1);
        assert_eq!(chiefs.items[0].message, "pinned");
    }

    #[tokio::test]
    async fn only_author_or_admin_deletes() {
        let (svc, post_id) = with_post().await;
        let comment = svc
            .create_comment(&GUEST, post_id, message("mine", false))
            .await
            .unwrap();
        let stranger = Actor {
            id: 8,
            role: Role::Guest,
        };

        assert!(matches!(
            svc.delete_comment(&stranger, comment.id).await,
            Err(DomainError::Forbidden)
        ));
        svc.delete_comment(&GUEST, comment.id).await.unwrap();
        assert!(matches!(
            svc.delete_comment(&ADMIN, comment.id).await,
            Err(DomainError::CommentNotFound)
        ));
    }

    #[tokio::test]
    async fn comments_on_missing_post_are_not_found() {
        let (svc, _) = with_post().await;
        let err = svc
            .create_comment(&GUEST, 404, message("lost", false))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound));
    }
}
