//! Query specification for the posts feed.
//!
//! A [`FilterSpec`] is an immutable value replaced wholesale on every change;
//! value equality decides whether a change warrants a re-fetch. Enum fields
//! use sum types so an invalid sort key or visibility is unrepresentable.

use crate::api::Visibility;

/// Maximum page size accepted by the backend; larger requests are clamped
/// server-side, so the client clamps at the same bound.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Default page size for feed queries.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Column the backend sorts posts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Likes,
    Views,
    Comments,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::Likes => "likes",
            SortKey::Views => "views",
            SortKey::Comments => "comments",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// The full, replace-wholesale query specification driving feed content.
///
/// `Default` is the cleared state: no search, no category, no visibility
/// restriction, no tags, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub search: String,
    pub category: String,
    pub visibility: Option<Visibility>,
    pub tags: Vec<String>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: String::new(),
            visibility: None,
            tags: Vec::new(),
            sort_by: SortKey::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl FilterSpec {
    /// Derive a new spec with `tag` added if absent, removed if present.
    ///
    /// Filters are replaced wholesale, so this returns a fresh value for the
    /// caller to pass to the controller rather than mutating in place.
    pub fn toggle_tag(&self, tag: &str) -> FilterSpec {
        let mut next = self.clone();
        if let Some(pos) = next.tags.iter().position(|t| t == tag) {
            next.tags.remove(pos);
        } else {
            next.tags.push(tag.to_string());
        }
        next
    }

    /// Serialize into query parameters for `GET /api/posts`.
    ///
    /// Empty and default fields are omitted entirely (the backend treats a
    /// missing parameter and an empty one the same, and shorter URLs cache
    /// better). Tags are comma-joined. Sort key and order are always sent.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(6);
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if !self.category.is_empty() {
            pairs.push(("category", self.category.clone()));
        }
        if let Some(v) = self.visibility {
            pairs.push(("visibility", v.as_str().to_string()));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        pairs.push(("sort_by", self.sort_by.as_str().to_string()));
        pairs.push(("sort_order", self.sort_order.as_str().to_string()));
        pairs
    }
}

/// The page/size pair identifying which slice of results to fetch next.
///
/// Advances by exactly one page per load-more; resets to page 1 whenever the
/// filter changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub per_page: u32,
}

impl PageCursor {
    /// Cursor at page 1 with the given page size (clamped to the backend's
    /// maximum, minimum 1).
    pub fn first(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Cursor for the immediately following page.
    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            per_page: self.per_page,
        }
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}
