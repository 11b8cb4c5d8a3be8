use chrono::{DateTime, Utc};
use quill_contract::CommentDto;

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub message: String,
    pub author_id: i64,
    pub post_id: i64,
    pub chief: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub message: String,
    pub author_id: i64,
    pub post_id: i64,
    pub chief: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub post_id: Option<i64>,
    pub chief: Option<bool>,
}

impl CommentFilter {
    pub fn matches(&self, comment: &Comment) -> bool {
        self.post_id.map_or(true, |id| comment.post_id == id)
            && self.chief.map_or(true, |chief| comment.chief == chief)
    }
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            message: comment.message,
            author_id: comment.author_id,
            post_id: comment.post_id,
            chief: comment.chief,
            created_at: comment.created_at,
        }
    }
}
