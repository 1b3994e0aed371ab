// SPDX-License-Identifier: MIT

use chrono::{TimeZone, Utc};
use jrw_core::FakeClock;
use jrw_rest::RestClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn ctx(rest: RestClient) -> WorkerContext<FakeClock> {
    ctx_with_inactivity(rest, std::time::Duration::from_secs(600))
}

fn ctx_with_inactivity(rest: RestClient, reconnect_after_inactivity: std::time::Duration) -> WorkerContext<FakeClock> {
    WorkerContext {
        rest,
        endpoints: Endpoints {
            run_list: "/api/v1/run/".into(),
            run_log_list: "/api/v1/run_log/".into(),
            kill_request_list: "/api/v1/kill_request/".into(),
            worker_list: "/api/v1/worker/".into(),
        },
        api_key: "public".into(),
        concurrent_jobs: 4,
        log_size_limit: 1024,
        temp_dir: std::env::temp_dir(),
        clock: FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
        worker_version: "1.2.3".into(),
        reconnect_after_inactivity,
    }
}

async fn mock_single_worker(server: &MockServer, worker_uri: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v1/worker/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"next": null},
            "objects": [{"resource_uri": worker_uri}],
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn enqueue_run_claims_worker_and_emits_event() {
    let server = MockServer::start().await;
    mock_single_worker(&server, "/api/v1/worker/1/").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/run/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "resource_uri": "/api/v1/run/7/",
            "state": "scheduled",
            "job": "/api/v1/job/1/",
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/run/7/"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let rest = RestClient::new(server.uri(), "public", "secret");
    let ctx = ctx(rest);
    let (tx, mut rx) = events::channel();

    let accepted = enqueue_run(&ctx, 7, &tx).await.unwrap();

    assert!(accepted);
    let event = rx.recv().await.unwrap();
    assert_eq!(event, EventEnvelope::run(EventKind::Enqueued, 7));
}

#[tokio::test]
async fn enqueue_run_drops_duplicate_without_emitting() {
    let server = MockServer::start().await;
    mock_single_worker(&server, "/api/v1/worker/1/").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/run/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "resource_uri": "/api/v1/run/7/",
            "state": "in_queue",
            "enqueue_dts": "2026-01-01 00:00:00.000000+00:00",
            "job": "/api/v1/job/1/",
        })))
        .mount(&server)
        .await;

    let rest = RestClient::new(server.uri(), "public", "secret");
    let ctx = ctx(rest);
    let (tx, mut rx) = events::channel();

    let accepted = enqueue_run(&ctx, 7, &tx).await.unwrap();

    assert!(!accepted);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn enqueue_kill_claims_and_emits_event() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/kill_request/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "resource_uri": "/api/v1/kill_request/3/",
            "run": "/api/v1/run/7/",
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/kill_request/3/"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let rest = RestClient::new(server.uri(), "public", "secret");
    let ctx = ctx(rest);
    let (tx, mut rx) = events::channel();

    let accepted = enqueue_kill(&ctx, 3, &tx).await.unwrap();

    assert!(accepted);
    let event = rx.recv().await.unwrap();
    assert_eq!(event, EventEnvelope::kill_request(EventKind::Enqueued, 3));
}

#[tokio::test]
async fn enqueue_kill_drops_duplicate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/kill_request/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "resource_uri": "/api/v1/kill_request/3/",
            "run": "/api/v1/run/7/",
            "enqueue_dts": "2026-01-01 00:00:00.000000+00:00",
        })))
        .mount(&server)
        .await;

    let rest = RestClient::new(server.uri(), "public", "secret");
    let ctx = ctx(rest);
    let (tx, mut rx) = events::channel();

    let accepted = enqueue_kill(&ctx, 3, &tx).await.unwrap();

    assert!(!accepted);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn ping_patches_worker_with_liveness_fields() {
    let server = MockServer::start().await;
    mock_single_worker(&server, "/api/v1/worker/1/").await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/worker/1/"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let rest = RestClient::new(server.uri(), "public", "secret");
    let ctx = ctx(rest);

    handle_ping(&ctx).await.unwrap();
}

#[tokio::test]
async fn run_enqueuer_recycles_on_inactivity_without_missing_broadcasts() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        // First connection: handshake, then go quiet past the (very short)
        // inactivity window, so the enqueuer is forced to recycle here
        // rather than sitting on a half-dead connection.
        let (mut first, _) = listener.accept().await.unwrap();
        let _handshake = jrw_bus::wire::read_frame(&mut first).await.unwrap().unwrap();

        // Second connection: the recycled one. A frame arriving here
        // proves the worker re-subscribed and is still listening, i.e.
        // the inactivity window didn't silently drop it from the bus.
        let (mut second, _) = listener.accept().await.unwrap();
        let _handshake = jrw_bus::wire::read_frame(&mut second).await.unwrap().unwrap();
        jrw_bus::wire::write_frame(
            &mut second,
            &jrw_bus::Frame::new("master.broadcast.public", json!({"action": "ping"})),
        )
        .await
        .unwrap();
    });

    let rest_server = MockServer::start().await;
    mock_single_worker(&rest_server, "/api/v1/worker/1/").await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/worker/1/"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&rest_server)
        .await;

    let rest = RestClient::new(rest_server.uri(), "public", "secret");
    let ctx = ctx_with_inactivity(rest, std::time::Duration::from_millis(10));

    let (run_tx, _run_rx) = mpsc::channel(4);
    let (kill_tx, _kill_rx) = mpsc::unbounded_channel();
    let (event_tx, _event_rx) = events::channel();
    let shutdown = CancellationToken::new();

    let enqueuer = tokio::spawn(run_enqueuer(
        ctx,
        addr.to_string(),
        run_tx,
        kill_tx,
        event_tx,
        shutdown.clone(),
    ));

    // The server task only completes once it has accepted a *second*
    // connection and delivered a frame on it, proving the reconnect
    // happened and the worker was subscribed again to receive it.
    tokio::time::timeout(std::time::Duration::from_secs(15), server).await.unwrap().unwrap();

    shutdown.cancel();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), enqueuer).await;
}

#[tokio::test]
async fn ping_skips_when_worker_count_is_not_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/worker/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"next": null},
            "objects": [],
        })))
        .mount(&server)
        .await;

    let rest = RestClient::new(server.uri(), "public", "secret");
    let ctx = ctx(rest);

    // No PATCH mock registered; if handle_ping tried to PATCH anything this
    // would fail with a connection-level mismatch from wiremock.
    handle_ping(&ctx).await.unwrap();
}
