// SPDX-License-Identifier: MIT

use super::*;

fn minimal_toml() -> &'static str {
    r#"
        rest_base_url = "https://control.example.com"
        api_key = "public"
        api_secret = "secret"
        broadcaster_server_hostname = "broadcast.example.com"
        broadcaster_server_port = 5561
        ws_server_hostname = "events.example.com"
        ws_server_port = 5562
        concurrent_jobs = 4
    "#
}

#[test]
fn parses_minimal_config_with_defaults_filled_in() {
    let config = Config::from_toml_str(minimal_toml()).unwrap();

    assert_eq!(config.concurrent_jobs, 4);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.log_size_limit, 819_200);
    assert_eq!(config.reconnect_after_inactivity, 600);
    assert_eq!(config.worker_list_path, "/api/v1/worker/");
    assert_eq!(config.run_list_path, "/api/v1/run/");
    assert_eq!(config.run_log_list_path, "/api/v1/run_log/");
    assert_eq!(config.kill_request_list_path, "/api/v1/kill_request/");
    assert_eq!(config.temp_dir, std::env::temp_dir());
    assert!(config.worker_version.is_none());
}

#[test]
fn worker_version_falls_back_to_crate_version_when_unset() {
    let config = Config::from_toml_str(minimal_toml()).unwrap();
    assert_eq!(config.worker_version(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn worker_version_honors_an_explicit_override() {
    let raw = format!("{}\nworker_version = \"9.9.9\"\n", minimal_toml());
    let config = Config::from_toml_str(&raw).unwrap();
    assert_eq!(config.worker_version(), "9.9.9");
}

#[test]
fn builds_broadcaster_and_ws_addresses_from_hostname_and_port() {
    let config = Config::from_toml_str(minimal_toml()).unwrap();
    assert_eq!(config.broadcaster_addr(), "broadcast.example.com:5561");
    assert_eq!(config.ws_addr(), "events.example.com:5562");
}

#[test]
fn rejects_config_missing_a_required_field() {
    let raw = r#"
        api_key = "public"
        api_secret = "secret"
    "#;
    assert!(Config::from_toml_str(raw).is_err());
}

#[test]
fn missing_env_var_surfaces_as_lifecycle_error() {
    std::env::remove_var(SETTINGS_ENV_VAR);
    let err = Config::load_from_env().unwrap_err();
    assert!(matches!(err, LifecycleError::MissingEnvVar(_)));
}
