use std::env;
use std::sync::{Mutex, OnceLock};

use signoff_cli::commands::{config, doctor};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

#[test]
fn config_command_redacts_the_api_token() {
    let _guard = env_lock().lock().expect("env lock");

    env::set_var("SIGNOFF_API_TOKEN", "svc-integration-secret");
    let result = config::run(None);
    env::remove_var("SIGNOFF_API_TOKEN");

    assert_eq!(result.exit_code, 0);
    assert!(
        !result.output.contains("svc-integration-secret"),
        "token value must never be rendered"
    );
    assert!(result.output.contains("svc-***"));
    assert!(result.output.contains("api.base_url"));
}

#[test]
fn config_command_fails_cleanly_without_a_token() {
    let _guard = env_lock().lock().expect("env lock");

    env::remove_var("SIGNOFF_API_TOKEN");
    let result = config::run(None);

    assert_eq!(result.exit_code, 2);
    assert!(result.output.contains("api.token"));
}

#[tokio::test(flavor = "current_thread")]
async fn doctor_reports_config_failure_and_skips_connectivity_probes() {
    let _guard = env_lock().lock().expect("env lock");

    env::remove_var("SIGNOFF_API_TOKEN");
    let result = doctor::run(None, true).await;

    assert_eq!(result.exit_code, 1);
    let report: serde_json::Value =
        serde_json::from_str(&result.output).expect("doctor --json emits valid json");
    assert_eq!(report["overall_status"], "fail");

    let checks = report["checks"].as_array().expect("checks array");
    let config_check = checks
        .iter()
        .find(|check| check["name"] == "config_validation")
        .expect("config check present");
    assert_eq!(config_check["status"], "fail");

    let connectivity = checks
        .iter()
        .find(|check| check["name"] == "general_api_connectivity")
        .expect("connectivity check present");
    assert_eq!(connectivity["status"], "skipped", "no probe may run on bad config");
}
