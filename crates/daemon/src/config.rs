// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::LifecycleError;

/// The environment variable naming the TOML config file to load. Named
/// after this worker specifically (rather than a generic `SETTINGS_PATH`)
/// so it doesn't collide with unrelated tools sharing the same host.
pub const SETTINGS_ENV_VAR: &str = "JOB_RUNNER_WORKER_SETTINGS";

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_size_limit() -> usize {
    819_200
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_reconnect_after_inactivity() -> u64 {
    600
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rest_base_url: String,
    pub api_key: String,
    pub api_secret: String,

    /// Subscriber endpoint: where the enqueuer listens for broadcast
    /// commands.
    pub broadcaster_server_hostname: String,
    pub broadcaster_server_port: u16,

    /// Publisher endpoint: where lifecycle events get published.
    pub ws_server_hostname: String,
    pub ws_server_port: u16,

    /// Seconds of silence on the broadcaster connection before the
    /// subscriber recycles it.
    #[serde(default = "default_reconnect_after_inactivity")]
    pub reconnect_after_inactivity: u64,

    pub concurrent_jobs: usize,

    #[serde(default = "default_log_size_limit")]
    pub log_size_limit: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_worker_list_path")]
    pub worker_list_path: String,
    #[serde(default = "default_run_list_path")]
    pub run_list_path: String,
    #[serde(default = "default_run_log_list_path")]
    pub run_log_list_path: String,
    #[serde(default = "default_kill_request_list_path")]
    pub kill_request_list_path: String,

    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Reported to the control plane as this worker's version. Falls
    /// back to the crate's own build version when unset, so an operator
    /// never has to keep this in sync by hand unless they want to.
    #[serde(default)]
    pub worker_version: Option<String>,
}

fn default_worker_list_path() -> String {
    "/api/v1/worker/".to_string()
}

fn default_run_list_path() -> String {
    "/api/v1/run/".to_string()
}

fn default_run_log_list_path() -> String {
    "/api/v1/run_log/".to_string()
}

fn default_kill_request_list_path() -> String {
    "/api/v1/kill_request/".to_string()
}

impl Config {
    pub fn worker_version(&self) -> String {
        self.worker_version.clone().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    }

    pub fn broadcaster_addr(&self) -> String {
        format!("{}:{}", self.broadcaster_server_hostname, self.broadcaster_server_port)
    }

    pub fn ws_addr(&self) -> String {
        format!("{}:{}", self.ws_server_hostname, self.ws_server_port)
    }

    pub fn reconnect_after_inactivity(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.reconnect_after_inactivity)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Load from the file named by [`SETTINGS_ENV_VAR`].
    pub fn load_from_env() -> Result<Self, LifecycleError> {
        let path = std::env::var(SETTINGS_ENV_VAR).map_err(|_| LifecycleError::MissingEnvVar(SETTINGS_ENV_VAR))?;
        let raw = std::fs::read_to_string(&path).map_err(|source| LifecycleError::ReadConfig { path: path.clone(), source })?;
        Self::from_toml_str(&raw).map_err(|source| LifecycleError::ParseConfig { path, source })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
