// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::reference::{Ref, Resource};

/// Lifecycle state of a `Run`, mirrored 1:1 from the control plane's own
/// state machine. Workers never transition a run backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Scheduled,
    InQueue,
    Started,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: i64,
    pub resource_uri: String,
    pub state: RunState,
    #[serde(default)]
    pub enqueue_dts: Option<String>,
    #[serde(default)]
    pub start_dts: Option<String>,
    #[serde(default)]
    pub return_dts: Option<String>,
    #[serde(default)]
    pub return_success: Option<bool>,
    #[serde(default)]
    pub pid: Option<i32>,
    #[serde(default)]
    pub worker: Option<String>,
    pub job: Ref<Job>,
    #[serde(default)]
    pub run_log: Option<Ref<RunLog>>,
}

impl Resource for Run {
    fn resource_uri(&self) -> &str {
        &self.resource_uri
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub resource_uri: String,
    pub script_content: String,
}

impl Resource for Job {
    fn resource_uri(&self) -> &str {
        &self.resource_uri
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    #[serde(default)]
    pub resource_uri: Option<String>,
    pub run: Ref<Run>,
    #[serde(default)]
    pub content: String,
}

impl Resource for RunLog {
    fn resource_uri(&self) -> &str {
        self.resource_uri.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillRequest {
    pub id: i64,
    pub resource_uri: String,
    pub run: Ref<Run>,
    #[serde(default)]
    pub enqueue_dts: Option<String>,
    #[serde(default)]
    pub execute_dts: Option<String>,
}

impl Resource for KillRequest {
    fn resource_uri(&self) -> &str {
        &self.resource_uri
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub resource_uri: String,
    #[serde(default)]
    pub ping_response_dts: Option<String>,
    #[serde(default)]
    pub worker_version: Option<String>,
    #[serde(default)]
    pub concurrent_jobs: Option<u32>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
