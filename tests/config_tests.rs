// Config loading and validation tests

mod common;

use common::TEST_CONFIG;
use livetraffic::config::AppConfig;
use std::io::Write;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(TEST_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.backend.base_url, "https://nms.example.net");
    assert_eq!(config.session.token.as_deref(), Some("test-token"));
    assert_eq!(config.stream.window_size, 30);
    assert_eq!(config.monitoring.stats_log_interval_secs, 60);
}

#[test]
fn test_config_defaults() {
    let minimal = r#"
[server]
port = 8090
host = "0.0.0.0"

[backend]
base_url = "http://10.0.0.5:8000"

[monitoring]
stats_log_interval_secs = 30
"#;
    let config = AppConfig::load_from_str(minimal).expect("load_from_str");
    assert_eq!(config.backend.device_vendor, "MikroTik");
    assert_eq!(config.backend.request_timeout_ms, 10_000);
    assert_eq!(config.stream.window_size, 30);
    assert_eq!(config.stream.open_timeout_ms, 10_000);
    assert_eq!(config.stream.inbound_capacity, 100);
    assert_eq!(config.stream.device_id, None);
    assert!(config.session.token.is_none());
}

#[test]
fn test_config_window_size_is_configurable() {
    let cfg = TEST_CONFIG.replace("window_size = 30", "window_size = 120");
    let config = AppConfig::load_from_str(&cfg).unwrap();
    assert_eq!(config.stream.window_size, 120);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = TEST_CONFIG.replace("port = 8090", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_window_size_zero() {
    let bad = TEST_CONFIG.replace("window_size = 30", "window_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("window_size"));
}

#[test]
fn test_config_validation_rejects_non_http_base_url() {
    let bad = TEST_CONFIG.replace("https://nms.example.net", "ftp://nms.example.net");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("backend.base_url"));
}

#[test]
fn test_config_validation_rejects_unparseable_base_url() {
    let bad = TEST_CONFIG.replace("https://nms.example.net", "not a url");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("backend.base_url"));
}

#[test]
fn test_config_validation_rejects_open_timeout_zero() {
    let bad = TEST_CONFIG.replace("window_size = 30", "window_size = 30\nopen_timeout_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("open_timeout_ms"));
}

#[test]
fn test_config_validation_rejects_empty_initial_device() {
    let bad = TEST_CONFIG.replace("window_size = 30", "window_size = 30\ndevice_id = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("device_id"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = TEST_CONFIG.replace("stats_log_interval_secs = 60", "stats_log_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_missing_section_fails() {
    let bad = TEST_CONFIG.replace("[backend]\nbase_url = \"https://nms.example.net\"\n", "");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_loads_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TEST_CONFIG.as_bytes()).unwrap();
    let config = AppConfig::load_from_path(file.path()).unwrap();
    assert_eq!(config.server.port, 8090);
}

#[test]
fn test_config_missing_file_names_the_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = AppConfig::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_session_config_debug_redacts_token() {
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    assert!(!format!("{:?}", config.session).contains("test-token"));
}
