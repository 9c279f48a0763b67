//! HTTP client for the posts API.
//!
//! Pure request/response mapping: every endpoint serializes its inputs,
//! bounds its wait, and normalizes every failure into [`ApiError`]. All
//! orchestration (what to do with a page, when to retry a whole flow) is
//! left to the feed controller.

use crate::api::error::ApiError;
use crate::api::types::{
    CategoriesEnvelope, CreateEnvelope, ErrorBody, FeedPage, LikeEnvelope, NewPost, Post,
    PostsEnvelope, TagsEnvelope,
};
use crate::feed::filter::{FilterSpec, PageCursor};
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Hard cap on response body size. A posts page at the backend's maximum
/// per_page is well under this; anything larger is not a legitimate response.
const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB

/// Retry and timeout policy applied to GET-class requests.
///
/// A single policy object injected at construction, shared by every
/// endpoint. Mutations (like, create) use only the timeout: they are never
/// retried because a duplicate request is a duplicate side effect.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Per-attempt wall-clock bound.
    pub timeout: Duration,
    /// Additional attempts after the first, for retryable-class failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff (base, 2x, 4x, ...).
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_retries: 2,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Construction-time configuration for [`ApiClient`].
///
/// The bearer credential is explicit state passed in here, never read from
/// ambient storage, so the client is testable without an environment shim.
pub struct ClientConfig {
    pub base_url: String,
    pub auth_token: SecretString,
    pub retry: RetryPolicy,
}

/// Client for the posts API.
///
/// Cheap to clone intent-wise: hold it behind the controller and share the
/// inner `reqwest::Client`'s connection pool.
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: SecretString,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Build a client, validating the base URL.
    ///
    /// HTTPS is required so the bearer token never travels in clear text.
    /// HTTP is allowed only for localhost/127.0.0.1 (local backends, tests).
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        match base.scheme() {
            "https" => {}
            "http" => {
                let is_localhost = matches!(base.host_str(), Some("localhost") | Some("127.0.0.1"));
                if !is_localhost {
                    tracing::error!(base_url = %base, "Rejecting non-HTTPS base URL");
                    return Err(ApiError::InsecureBaseUrl);
                }
                tracing::warn!(base_url = %base, "Using non-HTTPS API base URL (localhost only)");
            }
            _ => return Err(ApiError::InvalidBaseUrl(format!("unsupported scheme: {}", base.scheme()))),
        }

        let http = reqwest::Client::builder()
            .timeout(config.retry.timeout)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http,
            base,
            token: config.auth_token,
            retry: config.retry,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    /// Fetch one page of the feed for a filter and cursor.
    ///
    /// Retryable-class failures (timeout, network, 5xx) are retried with
    /// exponential backoff up to the policy's limit.
    pub async fn fetch_page(
        &self,
        filter: &FilterSpec,
        cursor: &PageCursor,
    ) -> Result<FeedPage, ApiError> {
        let mut query = filter.query_pairs();
        query.push(("page", cursor.page.to_string()));
        query.push(("per_page", cursor.per_page.to_string()));

        let body = self.get_with_retry(&self.endpoint("api/posts"), &query).await?;
        let env: PostsEnvelope = parse_envelope(&body)?;
        if !env.success {
            return Err(envelope_failure(env.message));
        }
        let pagination = env
            .pagination
            .ok_or_else(|| ApiError::MalformedResponse("missing pagination".to_string()))?;

        tracing::debug!(
            page = pagination.page,
            returned = env.posts.len(),
            total = pagination.total,
            has_next = pagination.has_next,
            "Fetched posts page"
        );

        Ok(FeedPage {
            posts: env.posts,
            pagination,
        })
    }

    /// All categories currently in use (`GET /api/posts/categories`).
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let body = self
            .get_with_retry(&self.endpoint("api/posts/categories"), &[])
            .await?;
        let env: CategoriesEnvelope = parse_envelope(&body)?;
        if !env.success {
            return Err(envelope_failure(env.message));
        }
        Ok(env.categories)
    }

    /// The most-used tags (`GET /api/posts/popular-tags`).
    pub async fn popular_tags(&self) -> Result<Vec<String>, ApiError> {
        let body = self
            .get_with_retry(&self.endpoint("api/posts/popular-tags"), &[])
            .await?;
        let env: TagsEnvelope = parse_envelope(&body)?;
        if !env.success {
            return Err(envelope_failure(env.message));
        }
        Ok(env.tags)
    }

    /// Like a post, returning the authoritative new like count.
    ///
    /// Never retried: a timed-out like may still have landed, and a blind
    /// retry would double-count.
    pub async fn like_post(&self, post_id: i64) -> Result<u64, ApiError> {
        let url = self.endpoint(&format!("api/posts/{}/like", post_id));
        let request = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.bearer());

        let response = tokio::time::timeout(self.retry.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;
        let body = check_status(response).await?;

        let env: LikeEnvelope = parse_envelope(&body)?;
        if !env.success {
            return Err(envelope_failure(env.message));
        }
        env.likes_count
            .ok_or_else(|| ApiError::MalformedResponse("missing likes_count".to_string()))
    }

    /// Create a post (`POST /api/posts`).
    ///
    /// Always sent as multipart form data, matching what the backend parses;
    /// tags travel as a JSON array string. Never retried.
    pub async fn create_post(&self, new_post: &NewPost) -> Result<Post, ApiError> {
        let mut form = reqwest::multipart::Form::new().text("content", new_post.content.clone());
        if let Some(category) = &new_post.category {
            form = form.text("category", category.clone());
        }
        if !new_post.tags.is_empty() {
            let tags_json =
                serde_json::to_string(&new_post.tags).unwrap_or_else(|_| "[]".to_string());
            form = form.text("tags", tags_json);
        }
        if let Some(visibility) = new_post.visibility {
            form = form.text("visibility", visibility.as_str());
        }
        if let Some(media) = &new_post.media {
            let part = reqwest::multipart::Part::bytes(media.bytes.clone())
                .file_name(media.file_name.clone());
            form = form.part("media", part);
        }

        let request = self
            .http
            .post(self.endpoint("api/posts"))
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .multipart(form);

        let response = tokio::time::timeout(self.retry.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;
        let body = check_status(response).await?;

        let env: CreateEnvelope = parse_envelope(&body)?;
        if !env.success {
            return Err(envelope_failure(env.message));
        }
        env.post
            .ok_or_else(|| ApiError::MalformedResponse("missing post".to_string()))
    }

    /// GET with bounded retries for transient failures.
    async fn get_with_retry(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<String, ApiError> {
        let mut attempt = 0;
        loop {
            match self.send_get(url, query).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff_base * 2u32.saturating_pow(attempt);
                    tracing::debug!(
                        error = %e,
                        retry = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying fetch after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<String, ApiError> {
        let request = self
            .http
            .get(url)
            .query(query)
            .header(reqwest::header::AUTHORIZATION, self.bearer());

        let response = tokio::time::timeout(self.retry.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;

        check_status(response).await
    }
}

/// Validate the HTTP status and read the body.
///
/// Non-2xx responses become classified errors, carrying the server's
/// `message` field when the body has one.
async fn check_status(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = read_limited_text(response, MAX_RESPONSE_SIZE).await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        return Err(ApiError::from_status(status.as_u16(), message));
    }
    Ok(body)
}

fn parse_envelope<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

/// A 2xx response whose envelope says `success: false`.
fn envelope_failure(message: Option<String>) -> ApiError {
    ApiError::Server {
        status: 200,
        message: message.unwrap_or_else(|| "Request failed".to_string()),
    }
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}
