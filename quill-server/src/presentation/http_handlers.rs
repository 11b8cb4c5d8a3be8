use super::auth::AuthUser;
use super::site::SiteCache;
use crate::application::{AuthService, CommentService, PostService, UserService};
use crate::domain::DomainError;
use actix_web::{web, HttpRequest, HttpResponse};
use quill_contract::{
    CommentQuery, CreateCommentRequest, CreatePostRequest, ExternalLoginRequest, FeedQuery,
    PageCursor, PageQuery, UpdatePostRequest, UpdateRoleRequest, AUTH_BROKER_HEADER,
};
use std::sync::Arc;

type HandlerResult = Result<HttpResponse, DomainError>;

fn comment_cursor(query: &CommentQuery) -> PageCursor {
    PageQuery {
        skip: query.skip,
        take: query.take,
    }
    .cursor()
}

// ============== Auth ==============

pub async fn external_login(
    http_req: HttpRequest,
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<ExternalLoginRequest>,
) -> HandlerResult {
    let broker_secret = http_req
        .headers()
        .get(AUTH_BROKER_HEADER)
        .and_then(|v| v.to_str().ok());
    let auth = auth_service
        .external_login(broker_secret, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(auth))
}

pub async fn me(auth_service: web::Data<Arc<AuthService>>, user: AuthUser) -> HandlerResult {
    let me = auth_service.me(&user.0).await?;
    Ok(HttpResponse::Ok().json(me))
}

// ============== Posts ==============

pub async fn feed(
    post_service: web::Data<Arc<PostService>>,
    query: web::Query<FeedQuery>,
) -> HandlerResult {
    tracing::debug!("Feed requested at {:?}", query.cursor());
    let page = post_service.feed(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn admin_posts(
    post_service: web::Data<Arc<PostService>>,
    user: AuthUser,
    query: web::Query<FeedQuery>,
) -> HandlerResult {
    let page = post_service.admin_list(&user.0, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_post(
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<i64>,
) -> HandlerResult {
    let post = post_service.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn get_post_by_slug(
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<String>,
) -> HandlerResult {
    let post = post_service.get_published_by_slug(&path).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn filter_posts(
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> HandlerResult {
    let term = path.into_inner();
    tracing::debug!("Filtering posts by {:?}", term);
    let page = post_service.search(&term, query.cursor()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn create_post(
    post_service: web::Data<Arc<PostService>>,
    site_cache: web::Data<SiteCache>,
    user: AuthUser,
    body: web::Json<CreatePostRequest>,
) -> HandlerResult {
    let post = post_service.create_post(&user.0, body.into_inner()).await?;
    site_cache.revalidate(None).await;
    Ok(HttpResponse::Created().json(post))
}

pub async fn update_post(
    post_service: web::Data<Arc<PostService>>,
    site_cache: web::Data<SiteCache>,
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<UpdatePostRequest>,
) -> HandlerResult {
    let post = post_service
        .update_post(&user.0, path.into_inner(), body.into_inner())
        .await?;
    site_cache.revalidate(Some(&post.slug)).await;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn publish_post(
    post_service: web::Data<Arc<PostService>>,
    site_cache: web::Data<SiteCache>,
    user: AuthUser,
    path: web::Path<i64>,
) -> HandlerResult {
    let post = post_service
        .toggle_publish(&user.0, path.into_inner())
        .await?;
    site_cache.revalidate(Some(&post.slug)).await;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    post_service: web::Data<Arc<PostService>>,
    site_cache: web::Data<SiteCache>,
    user: AuthUser,
    path: web::Path<i64>,
) -> HandlerResult {
    post_service.delete_post(&user.0, path.into_inner()).await?;
    site_cache.revalidate(None).await;
    Ok(HttpResponse::NoContent().finish())
}

// ============== Comments ==============

pub async fn post_comments(
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<i64>,
    query: web::Query<CommentQuery>,
) -> HandlerResult {
    let page = comment_service
        .list_for_post(path.into_inner(), query.chief, comment_cursor(&query))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn create_comment(
    comment_service: web::Data<Arc<CommentService>>,
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<CreateCommentRequest>,
) -> HandlerResult {
    let comment = comment_service
        .create_comment(&user.0, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn moderation_comments(
    comment_service: web::Data<Arc<CommentService>>,
    user: AuthUser,
    query: web::Query<CommentQuery>,
) -> HandlerResult {
    let page = comment_service
        .moderation_feed(&user.0, query.chief, comment_cursor(&query))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn delete_comment(
    comment_service: web::Data<Arc<CommentService>>,
    user: AuthUser,
    path: web::Path<i64>,
) -> HandlerResult {
    comment_service
        .delete_comment(&user.0, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

// ============== Users ==============

pub async fn list_users(
    user_service: web::Data<Arc<UserService>>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> HandlerResult {
    let page = user_service.list_users(&user.0, query.cursor()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn set_user_role(
    user_service: web::Data<Arc<UserService>>,
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<UpdateRoleRequest>,
) -> HandlerResult {
    let updated = user_service
        .set_role(&user.0, path.into_inner(), body.role)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}
