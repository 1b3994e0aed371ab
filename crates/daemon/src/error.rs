// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0} is not set")]
    MissingEnvVar(&'static str),

    #[error("failed to read config file {path}: {source}")]
    ReadConfig { path: String, #[source] source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    ParseConfig { path: String, #[source] source: toml::de::Error },

    #[error(transparent)]
    Rest(#[from] jrw_rest::RestError),
}
