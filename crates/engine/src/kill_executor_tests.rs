// SPDX-License-Identifier: MIT

use chrono::{TimeZone, Utc};
use jrw_core::FakeClock;
use jrw_rest::RestClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn ctx(rest: RestClient) -> WorkerContext<FakeClock> {
    WorkerContext {
        rest,
        endpoints: crate::context::Endpoints {
            run_list: "/api/v1/run/".into(),
            run_log_list: "/api/v1/run_log/".into(),
            kill_request_list: "/api/v1/kill_request/".into(),
            worker_list: "/api/v1/worker/".into(),
        },
        api_key: "public".into(),
        concurrent_jobs: 1,
        log_size_limit: 1024,
        temp_dir: std::env::temp_dir(),
        clock: FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
        worker_version: "1.0.0".into(),
        reconnect_after_inactivity: std::time::Duration::from_secs(600),
    }
}

async fn mount_kill_request(server: &MockServer, run_uri: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v1/kill_request/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "resource_uri": "/api/v1/kill_request/3/",
            "run": run_uri,
        })))
        .mount(server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/kill_request/3/"))
        .respond_with(ResponseTemplate::new(202))
        .mount(server)
        .await;
}

#[tokio::test]
async fn kills_tracked_pid_and_acknowledges() {
    let server = MockServer::start().await;
    mount_kill_request(&server, "/api/v1/run/5/").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/run/5/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "resource_uri": "/api/v1/run/5/",
            "state": "started",
            "job": "/api/v1/job/1/",
        })))
        .mount(&server)
        .await;

    let rest = RestClient::new(server.uri(), "public", "secret");
    let ctx = ctx(rest);
    let (tx, mut rx) = events::channel();
    let pids = crate::run_executor::pid_table();
    // A pid unlikely to exist on the test host; kill_tree treats "no such
    // process" as non-fatal, so this exercises the full path without
    // depending on a real child process.
    pids.lock().insert(5, 999_999);

    process_kill_request(&ctx, 3, &tx, &pids).await.unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event, EventEnvelope::kill_request(EventKind::Executed, 3));
}

#[tokio::test]
async fn kill_of_already_finished_run_still_acknowledges() {
    let server = MockServer::start().await;
    mount_kill_request(&server, "/api/v1/run/6/").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/run/6/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 6,
            "resource_uri": "/api/v1/run/6/",
            "state": "completed",
            "job": "/api/v1/job/1/",
        })))
        .mount(&server)
        .await;

    let rest = RestClient::new(server.uri(), "public", "secret");
    let ctx = ctx(rest);
    let (tx, mut rx) = events::channel();
    let pids = crate::run_executor::pid_table();

    process_kill_request(&ctx, 3, &tx, &pids).await.unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event, EventEnvelope::kill_request(EventKind::Executed, 3));
}
