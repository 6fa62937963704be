//! Prefix gating and 404 fallthrough through the assembled router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

mod common;

use common::{MockReply, RecordedRequest, NEXT_HANDLER_BODY};

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_upstream_404_falls_through_to_next_handler() {
    let upstream = common::start_programmable_backend(|_req| async {
        MockReply::new(404, "upstream says missing").with_header("x-from", "upstream")
    })
    .await;

    let response = common::gate_router(upstream, "/api")
        .oneshot(get("/api/missing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-handled-by").unwrap(), "next");
    assert!(response.headers().get("x-from").is_none());

    let body = body_string(response).await;
    assert_eq!(body, format!("{NEXT_HANDLER_BODY}: GET /api/missing (0 body bytes)"));
    assert!(!body.contains("upstream says missing"));
}

#[tokio::test]
async fn test_upstream_200_is_relayed() {
    let upstream = common::start_programmable_backend(|_req| async {
        MockReply::new(200, "ok").with_header("content-type", "text/plain")
    })
    .await;

    let response = common::gate_router(upstream, "/api")
        .oneshot(get("/api/ping"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
    assert!(response.headers().get("connection").is_none());
    assert!(response.headers().get("x-handled-by").is_none());
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_non_404_errors_are_not_fallthrough() {
    for status in [500u16, 503, 403, 410] {
        let upstream = common::start_programmable_backend(move |_req| async move {
            MockReply::new(status, "upstream body")
        })
        .await;

        let response = common::gate_router(upstream, "/")
            .oneshot(get("/main.js"))
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), status);
        assert_eq!(body_string(response).await, "upstream body");
    }
}

#[tokio::test]
async fn test_misaligned_prefix_never_reaches_upstream() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();
    let upstream = common::start_programmable_backend(move |_req| {
        counted.fetch_add(1, Ordering::SeqCst);
        async { MockReply::new(200, "upstream") }
    })
    .await;

    let router = common::gate_router(upstream, "/ab");

    let response = router.clone().oneshot(get("/abcd")).await.unwrap();
    assert_eq!(response.headers().get("x-handled-by").unwrap(), "next");
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let response = router.oneshot(get("/ab/cd")).await.unwrap();
    assert_eq!(body_string(response).await, "upstream");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unnormalized_prefix_behaves_like_slashed() {
    let upstream = common::start_programmable_backend(|_req| async { MockReply::new(200, "proxied") }).await;

    for prefix in ["foo", "/foo"] {
        let router = common::gate_router(upstream, prefix);

        let proxied = router.clone().oneshot(get("/foo/bar")).await.unwrap();
        assert_eq!(body_string(proxied).await, "proxied", "prefix {prefix:?}");

        let skipped = router.oneshot(get("/bar")).await.unwrap();
        assert_eq!(skipped.headers().get("x-handled-by").unwrap(), "next", "prefix {prefix:?}");
    }
}

#[tokio::test]
async fn test_root_prefix_proxies_every_path() {
    let upstream = common::start_programmable_backend(|req: RecordedRequest| async move {
        MockReply::new(200, req.target)
    })
    .await;

    let router = common::gate_router(upstream, "/");
    for path in ["/", "/index.html", "/deeply/nested/asset.css?v=3"] {
        let response = router.clone().oneshot(get(path)).await.unwrap();
        assert_eq!(body_string(response).await, path);
    }
}

#[tokio::test]
async fn test_outbound_request_translation() {
    let seen: Arc<Mutex<Option<RecordedRequest>>> = Arc::new(Mutex::new(None));
    let recorder = seen.clone();
    let upstream = common::start_programmable_backend(move |req: RecordedRequest| {
        *recorder.lock().unwrap() = Some(req.clone());
        async move { MockReply::new(201, String::from_utf8(req.body).unwrap()) }
    })
    .await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/items?draft=true&tag=a%20b")
        .header("host", "public.example")
        .header("content-type", "application/json")
        .header("content-length", "17")
        .header("connection", "x-hop")
        .header("x-hop", "should not pass")
        .header("keep-alive", "timeout=5")
        .header("x-trace", "abc")
        .body(Body::from("{\"name\":\"widget\"}"))
        .unwrap();

    let response = common::gate_router(upstream, "/api").oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_string(response).await, "{\"name\":\"widget\"}");

    let recorded = seen.lock().unwrap().clone().unwrap();
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.target, "/api/items?draft=true&tag=a%20b");
    assert_eq!(recorded.header("host").unwrap(), upstream.to_string());
    assert_eq!(recorded.header("content-type").unwrap(), "application/json");
    assert_eq!(recorded.header("x-trace").unwrap(), "abc");
    assert!(recorded.header("x-hop").is_none());
    assert!(recorded.header("keep-alive").is_none());
}

#[tokio::test]
async fn test_fallthrough_keeps_request_head() {
    let upstream = common::start_programmable_backend(|_req| async { MockReply::new(404, "") }).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/session")
        .body(Body::empty())
        .unwrap();
    let response = common::gate_router(upstream, "/api").oneshot(request).await.unwrap();

    assert_eq!(
        body_string(response).await,
        format!("{NEXT_HANDLER_BODY}: DELETE /api/session (0 body bytes)")
    );
}

#[tokio::test]
async fn test_fallthrough_after_streamed_body_has_no_stale_length() {
    let upstream = common::start_programmable_backend(|_req| async { MockReply::new(404, "") }).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/form")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("content-length", "7")
        .body(Body::from("a=1&b=2"))
        .unwrap();
    let response = common::gate_router(upstream, "/api").oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-seen-content-length").unwrap(), "none");
    assert_eq!(
        body_string(response).await,
        format!("{NEXT_HANDLER_BODY}: POST /api/form (0 body bytes)")
    );
}
