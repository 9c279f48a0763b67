//! Integration tests for the feed flow: filter, paginate, like.
//!
//! Each test stands up its own wiremock server and drives the controller
//! through the same sequences a UI would: debounced filter input, sentinel
//! visibility reports, and per-post actions.

use ripple::api::{ApiClient, ClientConfig, RetryPolicy, Visibility};
use ripple::feed::{Debouncer, FeedController, FeedPhase, FilterSpec};
use secrecy::SecretString;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_controller(server: &MockServer) -> FeedController {
    let client = ApiClient::new(ClientConfig {
        base_url: server.uri(),
        auth_token: SecretString::from("test-token".to_string()),
        retry: RetryPolicy {
            timeout: Duration::from_secs(5),
            max_retries: 0,
            backoff_base: Duration::from_millis(10),
        },
    })
    .unwrap();
    FeedController::new(client, 10)
}

fn page_json(page: u32, per_page: u32, total: u64) -> serde_json::Value {
    let pages = (total as f64 / per_page as f64).ceil() as u32;
    let start = (page as u64 - 1) * per_page as u64;
    let count = total.saturating_sub(start).min(per_page as u64);
    let posts: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            json!({
                "id": start + i + 1,
                "user_id": 1,
                "content": format!("post {}", start + i + 1),
                "tags": ["rust"],
                "visibility": "public",
                "likes_count": 0,
                "created_at": "2025-06-01T12:00:00Z"
            })
        })
        .collect();
    json!({
        "success": true,
        "posts": posts,
        "pagination": {
            "page": page,
            "per_page": per_page,
            "total": total,
            "pages": pages,
            "has_next": page < pages,
            "has_prev": page > 1
        }
    })
}

async fn mount_page(server: &MockServer, page: u32, total: u64) {
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(page, 10, total)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scroll_through_all_pages() {
    let server = MockServer::start().await;
    for page in 1..=3 {
        mount_page(&server, page, 25).await;
    }

    let mut controller = test_controller(&server);
    let request = controller.refresh();
    controller.run(request).await;
    assert_eq!(controller.state().posts.len(), 10);
    assert!(controller.state().has_next());

    // The sentinel stays visible at the bottom until pages run out
    while let Some(request) = controller.on_sentinel(true) {
        controller.run(request).await;
    }

    let state = controller.state();
    assert_eq!(state.phase, FeedPhase::Ready);
    assert_eq!(state.posts.len(), 25);
    assert!(!state.has_next());

    // Order equals concatenation of per-page server order
    let ids: Vec<i64> = state.posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, (1..=25).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_requests_carry_bearer_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 10, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = test_controller(&server);
    let request = controller.refresh();
    controller.run(request).await;
    assert_eq!(controller.state().phase, FeedPhase::Ready);
}

#[tokio::test]
async fn test_debounced_typing_fetches_once() {
    let server = MockServer::start().await;
    // Only the final string may ever reach the server
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("search", "reactjs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 10, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = test_controller(&server);
    let mut debouncer: Debouncer<FilterSpec> = Debouncer::new(Duration::from_millis(50));

    for prefix in ["r", "re", "rea", "reac", "react", "reactj", "reactjs"] {
        debouncer.push(FilterSpec {
            search: prefix.to_string(),
            ..FilterSpec::default()
        });
        if let Some(spec) = debouncer.poll() {
            if let Some(request) = controller.set_filter(spec) {
                controller.run(request).await;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    tokio::time::sleep(Duration::from_millis(60)).await;
    if let Some(spec) = debouncer.poll() {
        if let Some(request) = controller.set_filter(spec) {
            controller.run(request).await;
        }
    }

    assert_eq!(controller.state().posts.len(), 2);
    assert_eq!(controller.filter().search, "reactjs");
}

#[tokio::test]
async fn test_slow_stale_response_does_not_overwrite_newer_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("search", "aaa"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(1, 10, 25))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("search", "bbb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 10, 3)))
        .mount(&server)
        .await;

    let mut controller = test_controller(&server);
    let request_a = controller
        .set_filter(FilterSpec {
            search: "aaa".into(),
            ..FilterSpec::default()
        })
        .unwrap();
    // User switches filters while A is still in flight
    let request_b = controller
        .set_filter(FilterSpec {
            search: "bbb".into(),
            ..FilterSpec::default()
        })
        .unwrap();

    let outcome_b = controller.execute(&request_b).await;
    controller.apply(request_b, outcome_b);
    assert_eq!(controller.state().posts.len(), 3);

    // A's slow response arrives after B has already rendered
    let outcome_a = controller.execute(&request_a).await;
    controller.apply(request_a, outcome_a);

    let state = controller.state();
    assert_eq!(state.posts.len(), 3);
    assert_eq!(state.pagination.as_ref().unwrap().total, 3);
}

#[tokio::test]
async fn test_like_updates_single_post_from_server_count() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 5).await;
    Mock::given(method("POST"))
        .and(path("/api/posts/2/like"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "likes_count": 42
        })))
        .mount(&server)
        .await;

    let mut controller = test_controller(&server);
    let request = controller.refresh();
    controller.run(request).await;

    let likes = controller.like(2).await.unwrap();
    assert_eq!(likes, 42);
    for post in &controller.state().posts {
        let expected = if post.id == 2 { 42 } else { 0 };
        assert_eq!(post.likes_count, expected, "post {}", post.id);
    }
}

#[tokio::test]
async fn test_failed_like_leaves_counts_untouched() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 5).await;
    Mock::given(method("POST"))
        .and(path("/api/posts/2/like"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "message": "Failed to like post."
        })))
        .expect(1) // Mutations are never auto-retried
        .mount(&server)
        .await;

    let mut controller = test_controller(&server);
    let request = controller.refresh();
    controller.run(request).await;

    assert!(controller.like(2).await.is_err());
    assert!(controller.state().posts.iter().all(|p| p.likes_count == 0));
}

#[tokio::test]
async fn test_no_match_filter_yields_empty_state_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("search", "zzz_no_match"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "posts": [],
            "pagination": {
                "page": 1, "per_page": 10, "total": 0,
                "pages": 0, "has_next": false, "has_prev": false
            }
        })))
        .mount(&server)
        .await;

    let mut controller = test_controller(&server);
    let request = controller
        .set_filter(FilterSpec {
            search: "zzz_no_match".into(),
            ..FilterSpec::default()
        })
        .unwrap();
    controller.run(request).await;

    let state = controller.state();
    assert!(state.is_empty_result());
    assert_eq!(state.phase, FeedPhase::Ready);
    assert!(state.transient_error.is_none());
}

#[tokio::test]
async fn test_load_more_failure_degrades_without_losing_posts() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 25).await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut controller = test_controller(&server);
    let request = controller.refresh();
    controller.run(request).await;
    assert_eq!(controller.state().posts.len(), 10);

    let more = controller.on_sentinel(true).unwrap();
    controller.run(more).await;

    let state = controller.state();
    assert_eq!(state.posts.len(), 10, "existing posts must survive");
    assert_eq!(state.phase, FeedPhase::Ready);
    assert!(state.transient_error.is_some());
}

#[tokio::test]
async fn test_categories_and_tags_memoized_single_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "categories": ["Tech", "Life"]
        })))
        .expect(1) // Second call must be served from the memo
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/popular-tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "tags": ["rust", "web"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = test_controller(&server);
    let first = controller.categories().await.unwrap();
    let second = controller.categories().await.unwrap();
    assert_eq!(first, vec!["Tech", "Life"]);
    assert_eq!(first, second);

    let tags = controller.popular_tags().await.unwrap();
    assert_eq!(tags, controller.popular_tags().await.unwrap());
    assert_eq!(tags, vec!["rust", "web"]);
}

#[tokio::test]
async fn test_filter_change_with_category_visibility_and_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("category", "Tech"))
        .and(query_param("visibility", "public"))
        .and(query_param("tags", "rust,web"))
        .and(query_param("sort_by", "likes"))
        .and(query_param("sort_order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 10, 4)))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = test_controller(&server);
    let spec = FilterSpec {
        category: "Tech".into(),
        visibility: Some(Visibility::Public),
        sort_by: ripple::feed::SortKey::Likes,
        ..FilterSpec::default()
    }
    .toggle_tag("rust")
    .toggle_tag("web");

    let request = controller.set_filter(spec.clone()).unwrap();
    controller.run(request).await;
    assert_eq!(controller.state().posts.len(), 4);

    // Re-applying the identical spec issues no second request (expect(1))
    assert!(controller.set_filter(spec).is_none());
}
