//! Posts API: wire types, failure taxonomy, and the HTTP client.

mod client;
mod error;
mod types;

pub use client::{ApiClient, ClientConfig, RetryPolicy};
pub use error::ApiError;
pub use types::{FeedPage, MediaKind, MediaUpload, NewPost, PaginationInfo, Post, Visibility};
