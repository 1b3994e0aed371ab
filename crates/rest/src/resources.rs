// SPDX-License-Identifier: MIT

use serde_json::{json, Value};

use jrw_core::{Run, RunLog, RunState, Worker};

use crate::client::RestClient;
use crate::error::RestError;

/// Typed wrappers over the raw `RestClient` for the handful of resources
/// the worker touches. Keeping these as free functions (rather than a
/// repository trait) matches how small this surface is: there is one
/// worker-shaped view onto each resource, not several competing ones.
pub async fn get_run(client: &RestClient, run_uri: &str) -> Result<Run, RestError> {
    client.get(run_uri).await
}

pub async fn list_runs_in_state(
    client: &RestClient,
    run_list_path: &str,
    state: RunState,
    worker_api_key: &str,
) -> Result<Vec<Run>, RestError> {
    let state_str = serde_json::to_value(state)?
        .as_str()
        .ok_or(RestError::MissingField("state"))?
        .to_string();
    let query = format!(
        "{}?state={}&worker__api_key={}",
        run_list_path, state_str, worker_api_key
    );
    client.list(&query).await
}

pub async fn patch_run(client: &RestClient, run_uri: &str, fields: Value) -> Result<(), RestError> {
    client.patch(run_uri, &fields).await
}

pub async fn create_run_log(client: &RestClient, run_log_list_path: &str, run_uri: &str, content: &str) -> Result<RunLog, RestError> {
    let body = json!({ "run": run_uri, "content": content });
    client.post(run_log_list_path, &body).await
}

pub async fn patch_run_log(client: &RestClient, run_log_uri: &str, content: &str) -> Result<(), RestError> {
    let body = json!({ "content": content });
    client.patch(run_log_uri, &body).await
}

pub async fn patch_kill_request(client: &RestClient, kill_request_uri: &str, fields: Value) -> Result<(), RestError> {
    client.patch(kill_request_uri, &fields).await
}

pub async fn patch_worker(client: &RestClient, worker_uri: &str, fields: Value) -> Result<(), RestError> {
    client.patch(worker_uri, &fields).await
}

/// List workers visible to the authenticated api key. The control plane
/// scopes this to the calling worker's own record, so in practice this
/// returns zero or one entries; callers are expected to treat anything
/// other than exactly one as a misconfiguration and skip the dispatch.
pub async fn list_workers(client: &RestClient, worker_list_path: &str) -> Result<Vec<Worker>, RestError> {
    client.list(worker_list_path).await
}
