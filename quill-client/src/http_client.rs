use crate::error::ClientError;
use quill_contract::{
    AuthResponse, CommentDto, CommentQuery, CreateCommentRequest, CreatePostRequest,
    ExternalLoginRequest, FeedQuery, MediaDto, Page, PageCursor, PostDto, Role,
    UpdatePostRequest, UpdateRoleRequest, UserDto, API_KEY_HEADER, AUTH_BROKER_HEADER,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Client for the `/api` routes. Clones share the bearer token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: String,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_token(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Absolute URL a media file is served from.
    pub fn media_url(&self, media: &MediaDto) -> String {
        self.url(&media.url_path())
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(API_KEY_HEADER, &self.api_key);
        match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.authorized(request).await.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Request failed with {}: {}", status, body);
        Err(ClientError::from_response(status, &body))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Serialization(e.to_string()))
    }

    async fn no_content(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let response = self.send(request).await?;
        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            other => Err(ClientError::Server {
                status: other.as_u16(),
                message: "unexpected success status".to_string(),
            }),
        }
    }

    // ============== Auth ==============

    /// Exchanges a verified provider profile for a session token, which is
    /// kept for subsequent requests. Only the identity broker holds
    /// `broker_secret`.
    pub async fn external_login(
        &self,
        broker_secret: &str,
        req: &ExternalLoginRequest,
    ) -> Result<AuthResponse, ClientError> {
        let request = self
            .client
            .post(self.url("/api/auth/external"))
            .header(AUTH_BROKER_HEADER, broker_secret)
            .json(req);
        let auth: AuthResponse = self.json(request).await?;
        self.set_token(auth.token.clone()).await;
        tracing::debug!("Logged in as user_id={}", auth.user.id);
        Ok(auth)
    }

    pub async fn me(&self) -> Result<UserDto, ClientError> {
        self.json(self.client.get(self.url("/api/auth/me"))).await
    }

    // ============== Posts ==============

    pub async fn feed(&self, query: &FeedQuery) -> Result<Page<PostDto>, ClientError> {
        self.json(self.client.get(self.url("/api/feed")).query(query))
            .await
    }

    /// Drafts included; admin only.
    pub async fn admin_posts(&self, query: &FeedQuery) -> Result<Page<PostDto>, ClientError> {
        self.json(self.client.get(self.url("/api/posts")).query(query))
            .await
    }

    pub async fn get_post(&self, id: i64) -> Result<PostDto, ClientError> {
        self.json(self.client.get(self.url(&format!("/api/post/{}", id))))
            .await
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<PostDto, ClientError> {
        let url = self.url(&format!("/api/post/slug/{}", urlencoding::encode(slug)));
        self.json(self.client.get(url)).await
    }

    pub async fn filter_posts(
        &self,
        term: &str,
        cursor: PageCursor,
    ) -> Result<Page<PostDto>, ClientError> {
        let url = self.url(&format!("/api/filter/{}", urlencoding::encode(term)));
        self.json(self.client.get(url).query(&cursor)).await
    }

    pub async fn create_post(&self, req: &CreatePostRequest) -> Result<PostDto, ClientError> {
        self.json(self.client.post(self.url("/api/post")).json(req))
            .await
    }

    pub async fn update_post(
        &self,
        id: i64,
        req: &UpdatePostRequest,
    ) -> Result<PostDto, ClientError> {
        self.json(
            self.client
                .put(self.url(&format!("/api/post/{}", id)))
                .json(req),
        )
        .await
    }

    /// Flips the published flag and returns the post as stored.
    pub async fn toggle_publish(&self, id: i64) -> Result<PostDto, ClientError> {
        self.json(self.client.put(self.url(&format!("/api/publish/{}", id))))
            .await
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        self.no_content(self.client.delete(self.url(&format!("/api/post/{}", id))))
            .await
    }

    // ============== Comments ==============

    pub async fn post_comments(
        &self,
        post_id: i64,
        query: &CommentQuery,
    ) -> Result<Page<CommentDto>, ClientError> {
        let url = self.url(&format!("/api/post/{}/comments", post_id));
        self.json(self.client.get(url).query(query)).await
    }

    pub async fn create_comment(
        &self,
        post_id: i64,
        req: &CreateCommentRequest,
    ) -> Result<CommentDto, ClientError> {
        let url = self.url(&format!("/api/post/{}/comments", post_id));
        self.json(self.client.post(url).json(req)).await
    }

    pub async fn moderation_comments(
        &self,
        query: &CommentQuery,
    ) -> Result<Page<CommentDto>, ClientError> {
        self.json(self.client.get(self.url("/api/comments")).query(query))
            .await
    }

    pub async fn delete_comment(&self, id: i64) -> Result<(), ClientError> {
        self.no_content(
            self.client
                .delete(self.url(&format!("/api/comments/{}", id))),
        )
        .await
    }

    // ============== Users ==============

    pub async fn list_users(&self, cursor: PageCursor) -> Result<Page<UserDto>, ClientError> {
        self.json(self.client.get(self.url("/api/users")).query(&cursor))
            .await
    }

    pub async fn set_role(&self, user_id: i64, role: Role) -> Result<UserDto, ClientError> {
        self.json(
            self.client
                .put(self.url(&format!("/api/users/{}/role", user_id)))
                .json(&UpdateRoleRequest { role }),
        )
        .await
    }

    // ============== Media ==============

    pub async fn list_media(&self, cursor: PageCursor) -> Result<Page<MediaDto>, ClientError> {
        self.json(self.client.get(self.url("/api/images")).query(&cursor))
            .await
    }

    pub async fn upload_media(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        post_id: Option<i64>,
    ) -> Result<MediaDto, ClientError> {
        let mut form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        if let Some(post_id) = post_id {
            form = form.text("post_id", post_id.to_string());
        }
        self.json(self.client.post(self.url("/api/images")).multipart(form))
            .await
    }

    pub async fn download_media(&self, media: &MediaDto) -> Result<Vec<u8>, ClientError> {
        let response = self.send(self.client.get(self.media_url(media))).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
