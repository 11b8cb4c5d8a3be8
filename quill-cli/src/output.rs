use colored::Colorize;
use quill_client::ClientError;
use quill_contract::{CommentDto, MediaDto, PostDto, UserDto};

pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}

pub fn post_line(post: &PostDto) {
    let state = if post.is_published() {
        "published".green()
    } else {
        "draft".yellow()
    };
    println!(
        "  [{}] {} {} {}",
        post.id.to_string().cyan(),
        post.title.bold(),
        format!("/{}", post.slug).dimmed(),
        state
    );
    if !post.tags.is_empty() {
        println!("      tags: {}", post.tags.join(", "));
    }
}

pub fn post_details(post: &PostDto) {
    post_line(post);
    println!("      created: {}", post.created_at.format("%Y-%m-%d %H:%M"));
    println!("      updated: {}", post.updated_at.format("%Y-%m-%d %H:%M"));
    if let Some(thumbnail) = post.thumbnail_id {
        println!("      thumbnail: media #{}", thumbnail);
    }
    if let Some(content) = &post.content {
        println!();
        println!("{}", content);
    }
}

pub fn comment_line(comment: &CommentDto) {
    let marker = if comment.chief { "*".yellow() } else { " ".normal() };
    println!(
        "  [{}]{} post #{} by user #{}: {}",
        comment.id.to_string().cyan(),
        marker,
        comment.post_id,
        comment.author_id,
        truncate(&comment.message, 60)
    );
}

pub fn user_line(user: &UserDto) {
    println!(
        "  [{}] {} {} ({})",
        user.id.to_string().cyan(),
        user.name.bold(),
        user.role.to_string().magenta(),
        user.provider
    );
}

pub fn media_line(media: &MediaDto) {
    let attached = media
        .post_id
        .map(|id| format!("post #{}", id))
        .unwrap_or_else(|| "unattached".to_string());
    println!(
        "  [{}] {} {}",
        media.id.to_string().cyan(),
        media.url_path(),
        attached.dimmed()
    );
}

pub fn summary(shown: usize, total: Option<i64>) {
    match total {
        Some(total) => println!("{}", format!("{} of {} shown", shown, total).dimmed()),
        None => println!("{}", format!("{} shown", shown).dimmed()),
    }
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Extra guidance for errors a user can act on.
pub fn hint(err: &ClientError) -> Option<&'static str> {
    match err {
        ClientError::Unauthorized(_) => Some("log in first: quill login --token <token from the identity broker>"),
        ClientError::Forbidden(_) => Some("this action needs a higher role"),
        ClientError::Http(_) => Some("is the server running? check --server / QUILL_SERVER"),
        _ => None,
    }
}
