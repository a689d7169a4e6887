use photofetch::config::{Config, DEFAULT_TOTAL};
use std::time::Duration;

const VARS: [&str; 5] = [
    "FETCH_TOTAL",
    "FETCH_RETRY_LIMIT",
    "FETCH_TIMEOUT_MS",
    "FETCH_CONCURRENCY",
    "FETCH_API_TOKEN",
];

fn clear() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

// One test touches the environment so parallel tests cannot race on it.
#[test]
fn config_from_env() {
    clear();
    let config = Config::from_env().unwrap();
    assert_eq!(config.total, DEFAULT_TOTAL);
    assert_eq!(config.retry_limit, 3);
    assert_eq!(config.attempt_timeout, Duration::from_secs(1));
    assert!(config.api_token.is_none());

    unsafe {
        std::env::set_var("FETCH_TOTAL", "100");
        std::env::set_var("FETCH_RETRY_LIMIT", "5");
        std::env::set_var("FETCH_TIMEOUT_MS", "750");
        std::env::set_var("FETCH_API_TOKEN", "tok");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.total, 100);
    assert_eq!(config.retry_limit, 5);
    assert_eq!(config.attempt_timeout, Duration::from_millis(750));
    assert!(config.api_token.is_some());

    let engine = config.engine_config();
    assert_eq!(engine.retry_limit, 5);
    assert_eq!(engine.attempt_timeout, Duration::from_millis(750));

    unsafe { std::env::set_var("FETCH_CONCURRENCY", "lots") };
    assert!(Config::from_env().is_err());

    clear();
}

#[test]
fn config_from_toml_file() {
    let path = std::env::temp_dir().join(format!("photofetch-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, "base_url = \"http://localhost:9000/photos\"\nconcurrency = 8\n").unwrap();

    let config = Config::from_toml_file(&path).unwrap();
    assert_eq!(config.base_url, "http://localhost:9000/photos");
    assert_eq!(config.concurrency, 8);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_toml_file_is_a_config_error() {
    let result = Config::from_toml_file(std::path::Path::new("/nonexistent/photofetch.toml"));
    assert!(matches!(
        result,
        Err(photofetch::error::Error::Config(_))
    ));
}
