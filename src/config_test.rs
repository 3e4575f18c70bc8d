use super::*;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers hold `ENV_LOCK` so no other test touches the environment concurrently.
unsafe fn clear_classroom_env() {
    unsafe {
        std::env::remove_var("CLASSROOM_API_URL");
        std::env::remove_var("CLASSROOM_PUSH_PROJECT_ID");
        std::env::remove_var("CLASSROOM_PUSH_PROVISION_URL");
        std::env::remove_var("CLASSROOM_STORE_PATH");
        std::env::remove_var("CLASSROOM_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("CLASSROOM_CONNECT_TIMEOUT_SECS");
    }
}

#[test]
fn from_env_applies_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_classroom_env();
        std::env::set_var("CLASSROOM_API_URL", "https://api.school.test/");
    }

    let cfg = AuthConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, "https://api.school.test");
    assert_eq!(cfg.push_project_id, None);
    assert_eq!(cfg.push_provision_url, None);
    assert_eq!(cfg.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    assert_eq!(cfg.timeouts, HttpTimeouts::default());

    unsafe { clear_classroom_env() };
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_classroom_env();
        std::env::set_var("CLASSROOM_API_URL", "http://localhost:5000");
        std::env::set_var("CLASSROOM_PUSH_PROJECT_ID", " proj-123 ");
        std::env::set_var("CLASSROOM_PUSH_PROVISION_URL", "https://push.test/token//");
        std::env::set_var("CLASSROOM_STORE_PATH", "/tmp/auth.json");
        std::env::set_var("CLASSROOM_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("CLASSROOM_CONNECT_TIMEOUT_SECS", "2");
    }

    let cfg = AuthConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, "http://localhost:5000");
    assert_eq!(cfg.push_project_id.as_deref(), Some("proj-123"));
    assert_eq!(cfg.push_provision_url.as_deref(), Some("https://push.test/token"));
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/auth.json"));
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 5, connect_secs: 2 });

    unsafe { clear_classroom_env() };
}

#[test]
fn from_env_requires_api_url() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_classroom_env() };

    let err = AuthConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing { var: "CLASSROOM_API_URL" }));
}

#[test]
fn from_env_ignores_blank_push_settings_and_bad_timeouts() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_classroom_env();
        std::env::set_var("CLASSROOM_API_URL", "https://api.school.test");
        std::env::set_var("CLASSROOM_PUSH_PROJECT_ID", "   ");
        std::env::set_var("CLASSROOM_PUSH_PROVISION_URL", "  ");
        std::env::set_var("CLASSROOM_REQUEST_TIMEOUT_SECS", "soon");
    }

    let cfg = AuthConfig::from_env().unwrap();
    assert_eq!(cfg.push_project_id, None);
    assert_eq!(cfg.push_provision_url, None);
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

    unsafe { clear_classroom_env() };
}

#[test]
fn from_lookup_reads_through_closure() {
    let cfg = AuthConfig::from_lookup(|key| match key {
        "CLASSROOM_API_URL" => Some("https://override.test/".into()),
        "CLASSROOM_CONNECT_TIMEOUT_SECS" => Some(" 3 ".into()),
        _ => None,
    })
    .unwrap();
    assert_eq!(cfg.api_url, "https://override.test");
    assert_eq!(cfg.timeouts.connect_secs, 3);
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
}

#[test]
fn normalize_base_url_rejects_non_http() {
    assert!(normalize_base_url("X", "").is_err());
    assert!(normalize_base_url("X", " / ").is_err());
    let err = normalize_base_url("X", "ftp://files.test").unwrap_err().to_string();
    assert!(err.contains("expected http(s) URL"));
    assert_eq!(normalize_base_url("X", " https://a.test/ ").unwrap(), "https://a.test");
}
