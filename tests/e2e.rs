//! End-to-end tests for the replay service
//!
//! Starts a real Axum server on a random port whose replay bucket is the
//! server's own `/demo/vod` endpoint, then drives the HTTP API with reqwest.
//!
//! The listener is bound first to discover the port, so `bucket_url` can
//! point back at the same server before the router is built.

use livereplay::config::Config;
use livereplay::replay::share_token;
use livereplay::server::build_router;
use std::net::SocketAddr;
use std::time::Duration;

const DEMO_SESSION: u64 = 1_700_000_000_000;

// ── Test server helpers ───────────────────────────────────────────────────────

async fn start_test_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap();

    let config = Config {
        port: 0,
        page_root: format!("http://{}", addr),
        bucket_url: format!("http://{}/demo/vod", addr),
        page_path: "replayer".to_string(),
        embed_path: "replayer".to_string(),
        use_orga: false,
        is_dev: true,
        fetch_timeout_ms: 2000,
        playlist_cache_ttl_ms: 500,
        clip_ttl_secs: 300,
        status_interval_ms: 50,
    };

    let app = build_router(config).await.unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_check() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn resolves_live_stream_through_abr_fallback() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!(
            "http://{}/api/replay?streamname=demo&from=2023-11-14T22:13:30Z&to=2023-11-14T22:14:20Z",
            addr
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["url"], format!("http://{}/demo/vod/demo.m3u8", addr));
    assert_eq!(body["session"], DEMO_SESSION);
    assert_eq!(body["cue_in"], 10.0);
    assert_eq!(body["cue_out"], 60.0);
}

#[tokio::test]
async fn shared_link_resolves_to_same_window() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let links: serde_json::Value = client
        .get(format!(
            "http://{}/api/streams/demo/links?cue_in=15&cue_out=45&session={}",
            addr, DEMO_SESSION
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let share_url = links["share_url"].as_str().unwrap();
    let token = share_url.split("share=").nth(1).unwrap();
    assert!(share_token::decode(token).is_some());

    let window: serde_json::Value = client
        .get(format!("http://{}/api/replay?share={}", addr, token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        window["url"],
        format!("http://{}/demo/vod/demo-{}.m3u8", addr, DEMO_SESSION)
    );
    assert_eq!(window["cue_in"], 15.0);
    assert_eq!(window["cue_out"], 45.0);
}

#[tokio::test]
async fn cutout_of_recorded_session() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!(
            "http://{}/api/streams/demo/cutout?cue_in=25&cue_out=40&session={}",
            addr, DEMO_SESSION
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["segment_count"], 12);
    assert_eq!(body["total_duration"], 120.0);
    assert_eq!(body["cutout"]["start_segment_index"], 2);
    assert_eq!(body["cutout"]["start_offset_seconds"], 5.0);
    assert_eq!(body["cutout"]["end_segment_index"], 3);
}

#[tokio::test]
async fn clip_session_tracks_live_status() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/api/clips", addr))
        .json(&serde_json::json!({ "streamname": "demo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let clip: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(clip["session"], DEMO_SESSION);
    let id = clip["id"].as_str().unwrap().to_string();

    // Wait for the monitor's first refresh
    let mut status = serde_json::Value::Null;
    for _ in 0..50 {
        status = client
            .get(format!("http://{}/api/clips/{}/status", addr, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if !status["live"].is_null() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(status["live"]["live_edge_seconds"], 120.0);
    assert_eq!(status["label"], "2:00 from Live");

    // Forward stops at the live edge
    for _ in 0..5 {
        client
            .post(format!("http://{}/api/clips/{}/seek", addr, id))
            .json(&serde_json::json!({ "forward": true }))
            .send()
            .await
            .unwrap();
    }
    let status: serde_json::Value = client
        .get(format!("http://{}/api/clips/{}/status", addr, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["position"], 120.0);
    assert_eq!(status["label"], "Edge of Buffer");

    let health: serde_json::Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["active_clips"], 1);
}
