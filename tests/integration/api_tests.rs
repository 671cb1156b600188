//! API integration tests for tile relaying and error handling.
//!
//! Tests verify:
//! - Tile retrieval on miss and hit paths, with response headers
//! - Coordinate validation (all four rejection reasons, no I/O on rejection)
//! - Upstream failure mapping and cache failure isolation
//! - Health, source listing, and reverse-geocoding endpoints

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tokio::net::TcpListener;
use tower::ServiceExt;

use tile_relay::error::FetchError;

use super::test_utils::{
    serve_once, test_router, test_router_with_geocoder, CountingCache, CountingFetcher, PNG_BYTES,
};

// =============================================================================
// Basic Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_miss_returns_image_with_headers() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

    let request = Request::builder()
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    // Verify success
    assert_eq!(response.status(), StatusCode::OK);

    // Verify headers
    let headers = response.headers();
    assert_eq!(headers.get("content-type").unwrap(), "image/png");
    assert_eq!(
        headers.get("cache-control").unwrap(),
        "public, max-age=604800, immutable"
    );
    assert_eq!(headers.get("x-cache-status").unwrap(), "MISS");
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");

    // X-Cache-Time carries the service-side latency in whole milliseconds
    let cache_time = headers.get("x-cache-time").unwrap().to_str().unwrap();
    assert!(
        cache_time.parse::<u64>().is_ok(),
        "X-Cache-Time should be numeric, got {:?}",
        cache_time
    );

    // Verify the body is the upstream payload
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], PNG_BYTES);

    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_tile_hit_after_miss() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

    // First request - cache miss
    let request1 = Request::builder()
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response1 = router.clone().oneshot(request1).await.unwrap();
    assert_eq!(response1.status(), StatusCode::OK);
    assert_eq!(response1.headers().get("x-cache-status").unwrap(), "MISS");

    // The cache write is detached from the response, so wait for it to land
    assert!(cache.wait_for_entries(1).await, "cache write did not land");

    // Second request - cache hit, upstream untouched
    let request2 = Request::builder()
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response2 = router.oneshot(request2).await.unwrap();
    assert_eq!(response2.status(), StatusCode::OK);
    assert_eq!(response2.headers().get("x-cache-status").unwrap(), "HIT");

    let body = response2.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], PNG_BYTES);

    assert_eq!(fetcher.calls(), 1, "hit should not touch the upstream");
}

#[tokio::test]
async fn test_distinct_tiles_fetched_separately() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

    let tiles = [(4, 2), (5, 2), (4, 3)];

    for (x, y) in tiles {
        let request = Request::builder()
            .uri(format!("/tiles/streets/3/{}/{}", x, y))
            .body(Body::empty())
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Tile ({}, {}) should succeed",
            x,
            y
        );
    }

    assert_eq!(fetcher.calls(), 3);
}

// =============================================================================
// Validation Errors
// =============================================================================

#[tokio::test]
async fn test_unknown_source_rejected_without_io() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

    let request = Request::builder()
        .uri("/tiles/watercolor/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Error responses carry the CORS header too
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "unknown_source");
    assert_eq!(error["status"], 400);

    // Rejected before any I/O
    assert_eq!(cache.gets(), 0);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_non_numeric_coordinate_rejected() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

    let request = Request::builder()
        .uri("/tiles/streets/3/4/banana")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "invalid_coordinate");

    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_zoom_out_of_range_rejected() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

    // Above the maximum
    let request = Request::builder()
        .uri("/tiles/streets/23/0/0")
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "zoom_out_of_range");

    // Negative zoom parses as an integer and is rejected as out of range
    let request = Request::builder()
        .uri("/tiles/streets/-1/0/0")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "zoom_out_of_range");

    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_coordinate_out_of_bounds_rejected() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

    // Zoom 3 has an 8x8 grid, so x=9 is out of bounds
    let request = Request::builder()
        .uri("/tiles/streets/3/9/2")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "coordinate_out_of_bounds");

    assert_eq!(cache.gets(), 0);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_post_tile_method_not_allowed() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(cache, fetcher);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Upstream Failures
// =============================================================================

#[tokio::test]
async fn test_upstream_status_passthrough() {
    for upstream_status in [404u16, 503] {
        let cache = Arc::new(CountingCache::new());
        let fetcher = Arc::new(CountingFetcher::failing(FetchError::UpstreamStatus {
            status: upstream_status,
        }));
        let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

        let request = Request::builder()
            .uri("/tiles/streets/3/4/2")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status().as_u16(), upstream_status);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"], "upstream_rejected");

        // A failed fetch must not populate the cache
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.sets(), 0);
    }
}

#[tokio::test]
async fn test_upstream_timeout_maps_to_504() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::failing(FetchError::Timeout {
        timeout_ms: 10_000,
    }));
    let router = test_router(cache, fetcher);

    let request = Request::builder()
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "upstream_timeout");
}

#[tokio::test]
async fn test_upstream_unreachable_maps_to_502() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::failing(FetchError::Transport {
        message: "connection refused".to_string(),
    }));
    let router = test_router(cache, fetcher);

    let request = Request::builder()
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "upstream_unreachable");
}

// =============================================================================
// Cache Failure Isolation
// =============================================================================

#[tokio::test]
async fn test_cache_read_failure_served_as_miss() {
    let cache = Arc::new(CountingCache::failing_reads());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

    let request = Request::builder()
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    // The broken cache never surfaces to the client
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-cache-status").unwrap(), "MISS");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_cache_write_failure_does_not_fail_request() {
    let cache = Arc::new(CountingCache::failing_writes());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(Arc::clone(&cache), Arc::clone(&fetcher));

    let request1 = Request::builder()
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response1 = router.clone().oneshot(request1).await.unwrap();
    assert_eq!(response1.status(), StatusCode::OK);
    assert_eq!(response1.headers().get("x-cache-status").unwrap(), "MISS");

    // Give the detached write time to fail, then confirm nothing stuck
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.entry_count(), 0);

    // Entry was dropped, so the next request misses again
    let request2 = Request::builder()
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response2 = router.oneshot(request2).await.unwrap();
    assert_eq!(response2.status(), StatusCode::OK);
    assert_eq!(response2.headers().get("x-cache-status").unwrap(), "MISS");
    assert_eq!(fetcher.calls(), 2);
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_tile_options_preflight() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(cache, Arc::clone(&fetcher));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/tiles/streets/3/4/2")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("allow").unwrap(), "GET, OPTIONS");

    // Preflights never reach the upstream
    assert_eq!(fetcher.calls(), 0);
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(cache, fetcher);

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "ok");
    assert!(health["version"].is_string());
}

// =============================================================================
// Sources Endpoint
// =============================================================================

#[tokio::test]
async fn test_sources_endpoint() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(cache, fetcher);

    let request = Request::builder()
        .uri("/sources")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let listing: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let sources = listing["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 4);

    let ids: Vec<&str> = sources
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["streets", "light", "dark", "satellite"]);

    let satellite = &sources[3];
    assert_eq!(satellite["content_type"], "image/jpeg");
    assert_eq!(satellite["max_zoom"], 22);
}

// =============================================================================
// Reverse Geocoding
// =============================================================================

#[tokio::test]
async fn test_geocode_latitude_out_of_range_rejected() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(cache, fetcher);

    let request = Request::builder()
        .uri("/geocode/reverse?lat=123.0&lon=10.0")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "invalid_coordinate");
}

#[tokio::test]
async fn test_geocode_missing_params_rejected() {
    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router(cache, fetcher);

    // Missing lat/lon fails in the query extractor
    let request = Request::builder()
        .uri("/geocode/reverse")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_geocode_passthrough_body() {
    let base = serve_once(
        "HTTP/1.1 200 OK\r\n\
         content-type: application/json; charset=utf-8\r\n\
         content-length: 27\r\n\
         connection: close\r\n\
         \r\n\
         {\"display_name\":\"Paris 7e\"}",
    )
    .await;

    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router_with_geocoder(cache, fetcher, &base);

    let request = Request::builder()
        .uri("/geocode/reverse?lat=48.858&lon=2.294")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    // The upstream body is relayed untouched
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["display_name"], "Paris 7e");
}

#[tokio::test]
async fn test_geocode_unreachable_maps_to_502() {
    // Bind then drop, so the port is closed when the geocoder connects
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let cache = Arc::new(CountingCache::new());
    let fetcher = Arc::new(CountingFetcher::png(PNG_BYTES));
    let router = test_router_with_geocoder(cache, fetcher, &base);

    let request = Request::builder()
        .uri("/geocode/reverse?lat=48.858&lon=2.294")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "upstream_unreachable");
}
