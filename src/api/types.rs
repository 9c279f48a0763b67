use chrono::{DateTime, Utc};
use serde::Deserialize;

// ============================================================================
// Domain Types
// ============================================================================

/// Who can see a post.
///
/// The backend stores this as a lowercase string and defaults to `public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Friends,
}

impl Visibility {
    /// Query-parameter form, matching the backend's stored values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Friends => "friends",
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A post as returned by the backend.
///
/// The client holds a read-mostly cached copy; the only field it ever
/// mutates locally is `likes_count`, and only with a server-confirmed value.
/// Counter fields default to 0 because older backend rows omit them.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaKind>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub views_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Pagination metadata from a posts page response.
///
/// Authoritative for whether further pages exist; the client never infers
/// `has_next` from page arithmetic on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationInfo {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    /// Total number of pages (the backend's `pages` key).
    pub pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// A successfully parsed page of the feed.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub pagination: PaginationInfo,
}

/// A post to be created via `POST /api/posts`.
///
/// `media` carries the raw file bytes plus the filename the server uses to
/// derive the media type. Content may be empty only when media is attached.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub visibility: Option<Visibility>,
    pub media: Option<MediaUpload>,
}

/// Raw media attachment for a new post.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

// ============================================================================
// Response Envelopes
// ============================================================================

/// Envelope for `GET /api/posts`.
#[derive(Debug, Deserialize)]
pub(crate) struct PostsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub pagination: Option<PaginationInfo>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope for `GET /api/posts/categories`.
#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesEnvelope {
    pub success: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope for `GET /api/posts/popular-tags`.
#[derive(Debug, Deserialize)]
pub(crate) struct TagsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope for `POST /api/posts/{id}/like`.
#[derive(Debug, Deserialize)]
pub(crate) struct LikeEnvelope {
    pub success: bool,
    #[serde(default)]
    pub likes_count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope for `POST /api/posts`.
#[derive(Debug, Deserialize)]
pub(crate) struct CreateEnvelope {
    pub success: bool,
    #[serde(default)]
    pub post: Option<Post>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Minimal error-body shape: `{success: false, message: "..."}`.
///
/// Used to pull a human-readable message out of non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
