// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::time::Duration;

use jrw_core::Clock;
use jrw_rest::RestClient;

/// REST resource paths the worker was configured to talk to. These are
/// list/detail URIs relative to the REST client's base URL, not full
/// URLs, matching the control plane's own `resource_uri` convention.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub run_list: String,
    pub run_log_list: String,
    pub kill_request_list: String,
    pub worker_list: String,
}

/// Everything a long-running engine task needs: how to talk to the REST
/// API, which resources to hit, how many jobs to run concurrently, and
/// the clock to stamp timestamps with.
#[derive(Clone)]
pub struct WorkerContext<C: Clock> {
    pub rest: RestClient,
    pub endpoints: Endpoints,
    pub api_key: String,
    pub concurrent_jobs: usize,
    pub log_size_limit: usize,
    pub temp_dir: PathBuf,
    pub clock: C,
    /// Reported to the control plane on every `ping` dispatch.
    pub worker_version: String,
    /// How long the bus subscriber tolerates silence before it recycles
    /// its connection.
    pub reconnect_after_inactivity: Duration,
}
