// SPDX-License-Identifier: MIT

use jrw_core::SystemClock;
use jrw_engine::{Endpoints, WorkerContext};
use jrw_rest::RestClient;

use jrw_daemon::supervisor::Supervisor;
use jrw_daemon::{logging, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Load config before anything else touches the network or a clock.
    let config = Config::load_from_env()?;

    // 2. Logging next, so every subsequent step is observable.
    logging::init(&config.log_level);

    tracing::info!(
        worker_version = %config.worker_version(),
        concurrent_jobs = config.concurrent_jobs,
        "starting job-runner-worker"
    );

    // 3. Build the context every engine task shares.
    let rest = RestClient::new(config.rest_base_url.clone(), config.api_key.clone(), config.api_secret.clone());
    let ctx = WorkerContext {
        rest,
        endpoints: Endpoints {
            run_list: config.run_list_path.clone(),
            run_log_list: config.run_log_list_path.clone(),
            kill_request_list: config.kill_request_list_path.clone(),
            worker_list: config.worker_list_path.clone(),
        },
        api_key: config.api_key.clone(),
        concurrent_jobs: config.concurrent_jobs,
        log_size_limit: config.log_size_limit,
        temp_dir: config.temp_dir.clone(),
        clock: SystemClock,
        worker_version: config.worker_version(),
        reconnect_after_inactivity: config.reconnect_after_inactivity(),
    };

    // 4. Cleanup, task topology, and SIGTERM handling all live in the
    // supervisor; this only returns once the two-phase shutdown has
    // drained every in-flight run and published its events.
    let supervisor = Supervisor::new();
    supervisor
        .run(ctx, config.broadcaster_addr(), config.ws_addr(), config.run_list_path.clone())
        .await;

    tracing::info!("job-runner-worker exiting after SIGTERM");

    // Normal exit is SIGTERM-driven only, and always non-zero so an
    // orchestrator restarts the worker rather than treating this as done.
    std::process::exit(1);
}
