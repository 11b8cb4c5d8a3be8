use crate::session::Session;
use gloo_net::http::{Request, RequestBuilder, Response};
use quill_contract::{
    CommentDto, CreatePostRequest, ErrorResponse, MediaDto,
    Page, PageCursor, PostDto, Role, UpdatePostRequest, UpdateRoleRequest, UserDto,
    API_KEY_HEADER,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use web_sys::{File, FormData};

const API_BASE: &str = match option_env!("QUILL_API_BASE") {
    Some(base) => base,
    None => "http://localhost:3000",
};
const API_KEY: &str = match option_env!("QUILL_API_KEY") {
    Some(key) => key,
    None => "",
};

/// Failed API call. `status` is 0 when the request never got a response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    fn network(err: impl std::fmt::Display) -> Self {
        Self {
            status: 0,
            message: format!("Network error: {}", err),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    fn anonymous() -> Self {
        Self {
            base_url: API_BASE.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn for_session(session: &Session) -> Self {
        Self::with_token(&session.token)
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            ..Self::anonymous()
        }
    }

    pub fn media_url(&self, media: &MediaDto) -> String {
        format!("{}{}", self.base_url, media.url_path())
    }

    fn builder(&self, method: &str, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = match method {
            "POST" => Request::post(&url),
            "PUT" => Request::put(&url),
            "DELETE" => Request::delete(&url),
            _ => Request::get(&url),
        }
        .header(API_KEY_HEADER, API_KEY);

        match &self.token {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await.map_err(ApiError::network)?;

        if (200..300).contains(&status) {
            return serde_json::from_str(&text).map_err(|e| ApiError {
                status,
                message: format!("Failed to parse response: {}", e),
            });
        }

        let message = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(err) => err.error,
            Err(_) => format!("HTTP {}: {}", status, text),
        };
        Err(ApiError { status, message })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, path: &str) -> Result<T, ApiError> {
        let response = self
            .builder(method, path)
            .send()
            .await
            .map_err(ApiError::network)?;
        Self::read(response).await
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let response = self
            .builder(method, path)
            .json(body)
            .map_err(ApiError::network)?
            .send()
            .await
            .map_err(ApiError::network)?;
        Self::read(response).await
    }

    async fn call_empty(&self, method: &str, path: &str) -> Result<(), ApiError> {
        let response = self
            .builder(method, path)
            .send()
            .await
            .map_err(ApiError::network)?;
        if response.ok() {
            Ok(())
        } else {
            Self::read::<serde_json::Value>(response).await.map(|_| ())
        }
    }

    pub async fn me(&self) -> Result<UserDto, ApiError> {
        self.call("GET", "/api/auth/me").await
    }

    pub async fn admin_posts(&self, search: &str, cursor: PageCursor) -> Result<Page<PostDto>, ApiError> {
        let mut path = format!("/api/posts?skip={}&take={}", cursor.skip, cursor.take);
        let term = search.trim();
        if !term.is_empty() {
            path.push_str("&searchString=");
            path.push_str(&String::from(js_sys::encode_uri_component(term)));
        }
        self.call("GET", &path).await
    }

    pub async fn create_post(&self, req: &CreatePostRequest) -> Result<PostDto, ApiError> {
        self.call_json("POST", "/api/post", req).await
    }

    pub async fn update_post(&self, id: i64, req: &UpdatePostRequest) -> Result<PostDto, ApiError> {
        self.call_json("PUT", &format!("/api/post/{}", id), req).await
    }

    pub async fn toggle_publish(&self, id: i64) -> Result<PostDto, ApiError> {
        self.call("PUT", &format!("/api/publish/{}", id)).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ApiError> {
        self.call_empty("DELETE", &format!("/api/post/{}", id)).await
    }

    pub async fn moderation_comments(
        &self,
        chief: Option<bool>,
        cursor: PageCursor,
    ) -> Result<Page<CommentDto>, ApiError> {
        let mut path = format!("/api/comments?skip={}&take={}", cursor.skip, cursor.take);
        if let Some(chief) = chief {
            path.push_str(&format!("&chief={}", chief));
        }
        self.call("GET", &path).await
    }

    pub async fn delete_comment(&self, id: i64) -> Result<(), ApiError> {
        self.call_empty("DELETE", &format!("/api/comments/{}", id)).await
    }

    pub async fn list_users(&self, cursor: PageCursor) -> Result<Page<UserDto>, ApiError> {
        self.call(
            "GET",
            &format!("/api/users?skip={}&take={}", cursor.skip, cursor.take),
        )
        .await
    }

    pub async fn set_role(&self, user_id: i64, role: Role) -> Result<UserDto, ApiError> {
        self.call_json(
            "PUT",
            &format!("/api/users/{}/role", user_id),
            &UpdateRoleRequest { role },
        )
        .await
    }

    pub async fn list_media(&self, cursor: PageCursor) -> Result<Page<MediaDto>, ApiError> {
        self.call(
            "GET",
            &format!("/api/images?skip={}&take={}", cursor.skip, cursor.take),
        )
        .await
    }

    pub async fn upload_media(&self, file: &File) -> Result<MediaDto, ApiError> {
        let form = FormData::new().map_err(|e| ApiError::network(format!("{:?}", e)))?;
        form.append_with_blob_and_filename("file", file, &file.name())
            .map_err(|e| ApiError::network(format!("{:?}", e)))?;

        let response = self
            .builder("POST", "/api/images")
            .body(form)
            .map_err(ApiError::network)?
            .send()
            .await
            .map_err(ApiError::network)?;
        Self::read(response).await
    }
}
