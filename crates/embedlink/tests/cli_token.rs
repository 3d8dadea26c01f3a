#![cfg(feature = "cli")]

use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use serde_json::Value;

fn embedlink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_embedlink"))
        .env_remove("EMBEDLINK_SECRET")
        .env_remove("STORE_EMBED_LINK")
        .env_remove("RUST_LOG")
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("embedlink should run")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be one JSON document")
}

fn mint(secret: &str, extra: &[&str]) -> String {
    let mut args = vec![
        "mint",
        "--secret",
        secret,
        "--base-url",
        "https://demo.integrations.store/?someOtherParam=42",
    ];
    args.extend_from_slice(extra);
    let output = embedlink(&args);
    assert!(
        output.status.success(),
        "mint failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json = stdout_json(&output);
    assert!(json["schema_id"]
        .as_str()
        .unwrap()
        .ends_with("magic-link.schema.json"));
    json["link"].as_str().unwrap().to_string()
}

#[test]
fn mint_then_verify_roundtrips_payload() {
    let link = mint("hunter2", &["--claim", "foo=bar", "--claim", "userId=17"]);
    assert!(link.starts_with("https://demo.integrations.store/?someOtherParam=42&token="));

    let output = embedlink(&["verify", "--secret", "hunter2", &link]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["valid"], Value::Bool(true));
    assert_eq!(json["payload"], serde_json::json!({"foo": "bar", "userId": 17}));
    let issued = json["issued_at"].as_u64().unwrap();
    assert_eq!(json["expires_at"].as_u64().unwrap(), issued + 3600);
}

#[test]
fn secret_can_come_from_environment() {
    let output = Command::new(env!("CARGO_BIN_EXE_embedlink"))
        .env("EMBEDLINK_SECRET", "from-env")
        .args(["--format", "raw", "mint", "--payload", r#"{"a":1}"#])
        .output()
        .expect("embedlink should run");
    assert!(output.status.success());
    let link = String::from_utf8_lossy(&output.stdout);
    assert!(link.starts_with("https://integrations-captain.com/store-embed?token="));
}

#[test]
fn wrong_secret_is_permission_denied() {
    let link = mint("hunter2", &["--claim", "foo=bar"]);
    let output = embedlink(&["verify", "--secret", "not-hunter2", &link]);
    assert_eq!(output.status.code(), Some(50));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid token signature"));
}

#[test]
fn link_without_token_is_data_invalid() {
    let output = embedlink(&[
        "verify",
        "--secret",
        "hunter2",
        "https://demo.integrations.store/?someOtherParam=42",
    ]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn reserved_claim_is_a_usage_error() {
    let output = embedlink(&["mint", "--secret", "hunter2", "--claim", "exp=1"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("reserved claim"));
}

#[test]
fn expired_link_has_its_own_exit_code() {
    let link = mint("hunter2", &["--validity", "1s"]);
    thread::sleep(Duration::from_millis(2100));

    let output = embedlink(&["verify", "--secret", "hunter2", "--validity", "1s", &link]);
    assert_eq!(output.status.code(), Some(51));
}

#[test]
fn missing_secret_is_rejected_by_argument_parsing() {
    let output = embedlink(&["mint"]);
    assert_eq!(output.status.code(), Some(2));
}
