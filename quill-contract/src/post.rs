use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub author_id: i64,
    pub slug: String,
    pub thumbnail_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostDto {
    pub fn is_published(&self) -> bool {
        self.published.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,
    #[serde(default)]
    pub thumbnail_id: Option<i64>,
    #[serde(default)]
    #[validate(length(max = 10), custom(function = "valid_tags"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10), custom(function = "valid_tags"))]
    pub tags: Option<Vec<String>>,
}

impl UpdatePostRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.thumbnail_id.is_none()
            && self.tags.is_none()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn valid_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.trim().is_empty() || t.len() > 32) {
        return Err(ValidationError::new("tag"));
    }
    Ok(())
}

/// URL-safe slug: lowercase ASCII alphanumerics separated by single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Hello,   World! "), "hello-world");
        assert_eq!(slugify("Rust 2024 -- notes"), "rust-2024-notes");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn blank_title_is_rejected() {
        let req = CreatePostRequest {
            title: "   ".into(),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = CreatePostRequest {
            title: "First post".into(),
            tags: vec!["rust".into(), "web".into()],
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn oversized_tag_is_rejected() {
        let req = UpdatePostRequest {
            tags: Some(vec!["x".repeat(33)]),
            ..Default::default()
        };
        assert!(req.validate().is_err());
        assert!(UpdatePostRequest::default().is_empty());
    }
}
