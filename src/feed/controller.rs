//! Feed orchestration: owns the post list, the pagination cursor, and the
//! loading/error state, and decides which fetch results are still relevant.
//!
//! Fetches are two-phase. A state change (`set_filter`, `refresh`,
//! `load_more`, `on_sentinel`) synchronously mutates state and hands back a
//! [`PageRequest`] token; `execute` performs the HTTP call; `apply` commits
//! the outcome only if the token's generation still matches. A filter change
//! bumps the generation, so a slow fetch for the old filter can resolve
//! whenever it likes and will be silently discarded. Sequential callers can
//! just use [`FeedController::run`].

use crate::api::{ApiClient, ApiError, FeedPage, PaginationInfo, Post};
use crate::feed::filter::{FilterSpec, PageCursor};
use crate::feed::scroll::ScrollTrigger;
use std::time::Duration;
use tokio::time::Instant;

/// How long fetched categories and popular tags stay fresh. Matches the
/// backend's own cache window for these endpoints.
const META_CACHE_TTL: Duration = Duration::from_secs(300);

/// Where the feed is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedPhase {
    /// Nothing requested yet.
    Idle,
    /// First page (for the current filter) in flight; the list is empty.
    Loading,
    /// A page is displayed; more may be loadable.
    Ready,
    /// A follow-up page in flight; existing posts stay visible.
    LoadingMore,
    /// First-page fetch failed; blocking until retry or filter change.
    Error(String),
}

/// Observable feed state.
///
/// `posts` is append-only within a filter epoch; it is cleared only when the
/// filter changes or a refresh is requested. A failed load-more never
/// touches it, only `transient_error`.
#[derive(Debug)]
pub struct FeedState {
    pub posts: Vec<Post>,
    pub cursor: PageCursor,
    pub pagination: Option<PaginationInfo>,
    pub phase: FeedPhase,
    /// Non-blocking error from a failed load-more or like; existing content
    /// stays intact.
    pub transient_error: Option<String>,
}

impl FeedState {
    fn new(page_size: u32) -> Self {
        Self {
            posts: Vec::new(),
            cursor: PageCursor::first(page_size),
            pagination: None,
            phase: FeedPhase::Idle,
            transient_error: None,
        }
    }

    /// Whether the server says further pages exist. False until the first
    /// page has arrived.
    pub fn has_next(&self) -> bool {
        self.pagination.as_ref().map(|p| p.has_next).unwrap_or(false)
    }

    /// Loaded successfully and genuinely empty. An empty feed is a state
    /// of its own, distinct from an error.
    pub fn is_empty_result(&self) -> bool {
        self.phase == FeedPhase::Ready && self.posts.is_empty()
    }
}

/// Which kind of page a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    FirstPage,
    More,
}

/// Token for one in-flight page fetch.
///
/// Captures the filter and cursor at dispatch time plus the generation it
/// belongs to; [`FeedController::apply`] uses the generation to distinguish
/// stale responses from current ones.
#[derive(Debug)]
pub struct PageRequest {
    generation: u64,
    kind: RequestKind,
    filter: FilterSpec,
    cursor: PageCursor,
}

/// Categories/popular-tags memoization with a TTL.
#[derive(Debug, Default)]
struct MetaCache {
    categories: Option<(Vec<String>, Instant)>,
    popular_tags: Option<(Vec<String>, Instant)>,
}

impl MetaCache {
    fn fresh(entry: &Option<(Vec<String>, Instant)>) -> Option<Vec<String>> {
        entry
            .as_ref()
            .filter(|(_, at)| at.elapsed() < META_CACHE_TTL)
            .map(|(values, _)| values.clone())
    }
}

/// The feed query and pagination controller.
pub struct FeedController {
    client: ApiClient,
    filter: FilterSpec,
    state: FeedState,
    generation: u64,
    in_flight: bool,
    trigger: ScrollTrigger,
    meta: MetaCache,
    page_size: u32,
}

impl FeedController {
    pub fn new(client: ApiClient, page_size: u32) -> Self {
        Self {
            client,
            filter: FilterSpec::default(),
            state: FeedState::new(page_size),
            generation: 0,
            in_flight: false,
            trigger: ScrollTrigger::new(),
            meta: MetaCache::default(),
            page_size,
        }
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Replace the filter wholesale and start over from page 1.
    ///
    /// A value-equal filter is a no-op (no second fetch): callers may apply
    /// debounced input without checking for changes themselves. Use
    /// [`refresh`](Self::refresh) to force a re-fetch of the same filter.
    pub fn set_filter(&mut self, spec: FilterSpec) -> Option<PageRequest> {
        if spec == self.filter {
            tracing::debug!("Filter unchanged, skipping re-fetch");
            return None;
        }
        self.filter = spec;
        Some(self.begin_first_page())
    }

    /// Re-fetch page 1 for the current filter, discarding loaded posts.
    /// Also the entry point for the initial load and for error retry.
    pub fn refresh(&mut self) -> PageRequest {
        self.begin_first_page()
    }

    fn begin_first_page(&mut self) -> PageRequest {
        // Bumping the generation orphans any fetch still in flight; its
        // result will fail the generation check in apply().
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = true;
        self.state.posts.clear();
        self.state.pagination = None;
        self.state.cursor = PageCursor::first(self.page_size);
        self.state.phase = FeedPhase::Loading;
        self.state.transient_error = None;

        tracing::debug!(
            generation = self.generation,
            search = %self.filter.search,
            category = %self.filter.category,
            "Starting first-page fetch"
        );

        PageRequest {
            generation: self.generation,
            kind: RequestKind::FirstPage,
            filter: self.filter.clone(),
            cursor: self.state.cursor,
        }
    }

    /// Request the next page, if the server says one exists and nothing is
    /// already in flight. The in-flight flag is taken synchronously here,
    /// before any await point, so two quick triggers cannot both pass the
    /// gate.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if self.in_flight || !self.state.has_next() {
            return None;
        }
        self.in_flight = true;
        self.state.phase = FeedPhase::LoadingMore;
        self.state.transient_error = None;
        self.state.cursor = self.state.cursor.next();

        tracing::debug!(page = self.state.cursor.page, "Starting load-more fetch");

        Some(PageRequest {
            generation: self.generation,
            kind: RequestKind::More,
            filter: self.filter.clone(),
            cursor: self.state.cursor,
        })
    }

    /// Report the scroll sentinel's visibility. Returns a load-more request
    /// when the trigger fires and the pagination gate allows it.
    pub fn on_sentinel(&mut self, visible: bool) -> Option<PageRequest> {
        let has_more = self.state.has_next();
        if self.trigger.observe(visible, has_more, self.in_flight) {
            self.load_more()
        } else {
            None
        }
    }

    /// Perform the HTTP fetch for a request token.
    pub async fn execute(&self, request: &PageRequest) -> Result<FeedPage, ApiError> {
        self.client.fetch_page(&request.filter, &request.cursor).await
    }

    /// Commit a fetch outcome, unless the request is stale.
    ///
    /// Stale means the generation advanced after dispatch (the user changed
    /// filters or refreshed); such results are dropped without touching
    /// state, however they arrived (success or failure).
    pub fn apply(&mut self, request: PageRequest, outcome: Result<FeedPage, ApiError>) {
        if request.generation != self.generation {
            tracing::debug!(
                expected = self.generation,
                got = request.generation,
                "Discarding stale page response (generation mismatch)"
            );
            return;
        }
        self.in_flight = false;
        self.trigger.fetch_completed();

        match (request.kind, outcome) {
            (RequestKind::FirstPage, Ok(page)) => {
                self.state.posts = page.posts;
                self.state.pagination = Some(page.pagination);
                self.state.phase = FeedPhase::Ready;
            }
            (RequestKind::FirstPage, Err(e)) => {
                tracing::warn!(error = %e, "First-page fetch failed");
                self.state.phase = FeedPhase::Error(e.to_string());
            }
            (RequestKind::More, Ok(page)) => {
                // Server order is authoritative: append as received.
                self.state.posts.extend(page.posts);
                if self.state.posts.len() as u64 > page.pagination.total {
                    tracing::warn!(
                        loaded = self.state.posts.len(),
                        total = page.pagination.total,
                        "Loaded more posts than the server reports existing"
                    );
                }
                self.state.pagination = Some(page.pagination);
                self.state.phase = FeedPhase::Ready;
            }
            (RequestKind::More, Err(e)) => {
                tracing::warn!(error = %e, page = request.cursor.page, "Load-more fetch failed");
                // Keep what we have; roll the cursor back so the failed page
                // is the one requested next time.
                self.state.cursor = PageCursor {
                    page: request.cursor.page.saturating_sub(1).max(1),
                    per_page: request.cursor.per_page,
                };
                self.state.phase = FeedPhase::Ready;
                self.state.transient_error = Some(e.to_string());
            }
        }
    }

    /// Execute and apply in one go, for sequential callers.
    pub async fn run(&mut self, request: PageRequest) {
        let outcome = self.execute(&request).await;
        self.apply(request, outcome);
    }

    /// Like a post: fire-and-verify.
    ///
    /// The local count is patched only with the authoritative value from a
    /// successful response; there is no optimistic bump beforehand, so a
    /// retried or failed request can never drift the count. On failure the
    /// error is returned for non-blocking surfacing and counts are left
    /// untouched.
    pub async fn like(&mut self, post_id: i64) -> Result<u64, ApiError> {
        let likes_count = self.client.like_post(post_id).await?;
        self.apply_like(post_id, likes_count);
        Ok(likes_count)
    }

    /// Patch one post's like count to a server-confirmed value.
    pub fn apply_like(&mut self, post_id: i64, likes_count: u64) {
        if let Some(post) = self.state.posts.iter_mut().find(|p| p.id == post_id) {
            post.likes_count = likes_count;
        } else {
            tracing::debug!(post_id, "Liked post no longer in the loaded feed");
        }
    }

    /// Available categories, memoized for five minutes.
    pub async fn categories(&mut self) -> Result<Vec<String>, ApiError> {
        if let Some(cached) = MetaCache::fresh(&self.meta.categories) {
            return Ok(cached);
        }
        let fresh = self.client.categories().await?;
        self.meta.categories = Some((fresh.clone(), Instant::now()));
        Ok(fresh)
    }

    /// Popular tags, memoized for five minutes.
    pub async fn popular_tags(&mut self) -> Result<Vec<String>, ApiError> {
        if let Some(cached) = MetaCache::fresh(&self.meta.popular_tags) {
            return Ok(cached);
        }
        let fresh = self.client.popular_tags().await?;
        self.meta.popular_tags = Some((fresh.clone(), Instant::now()));
        Ok(fresh)
    }
}
