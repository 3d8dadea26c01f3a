#![cfg(feature = "cli")]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

use serde_json::{json, Value};

fn embedlink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_embedlink"))
        .env_remove("EMBEDLINK_API_KEY")
        .env_remove("EMBEDLINK_API_URL")
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("embedlink should run")
}

struct Captured {
    request_line: String,
    headers: Vec<String>,
    body: Value,
}

/// Answer exactly one HTTP request with `status` and `reply`.
fn serve_once(status: u16, reply: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("loopback bind should work");
    let addr = listener.local_addr().expect("bound address");

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("client should connect");
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");
        let mut headers = Vec::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("header line");
            let line = line.trim_end().to_ascii_lowercase();
            if line.is_empty() {
                break;
            }
            if let Some(value) = line.strip_prefix("content-length:") {
                content_length = value.trim().parse().expect("content length");
            }
            headers.push(line);
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("request body");

        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 {status} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{reply}",
            reply.len()
        )
        .expect("response should be writable");

        Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        }
    });

    (format!("http://{addr}"), handle)
}

#[test]
fn dry_run_prints_plan_without_network() {
    let output = embedlink(&[
        "session",
        "update",
        "sess-1",
        "--api-key",
        "k",
        "--api-url",
        "http://127.0.0.1:9/api",
        "--resource-path",
        "sessions",
        "--data",
        r#"{"userId":"u-1"}"#,
        "--dry-run",
    ]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["dry_run"], Value::Bool(true));
    assert_eq!(json["method"], "PATCH");
    assert_eq!(json["url"], "http://127.0.0.1:9/api/sessions");
    assert_eq!(json["body"], json!({"sessionId": "sess-1", "data": {"userId": "u-1"}}));
}

#[test]
fn create_sends_authenticated_post() {
    let (base_url, server) = serve_once(200, r#"{"sessionId":"sess-9"}"#);
    let output = embedlink(&[
        "session",
        "create",
        "--api-key",
        "hunter2",
        "--api-url",
        &base_url,
        "--store-id",
        "store-1",
        "--data",
        r#"{"purchases":["l-1"]}"#,
    ]);
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], 200);
    assert_eq!(json["body"], json!({"sessionId": "sess-9"}));

    let captured = server.join().unwrap();
    assert!(captured.request_line.starts_with("POST / "));
    assert!(captured
        .headers
        .iter()
        .any(|h| h == "authorization: bearer hunter2"));
    assert_eq!(
        captured.body,
        json!({"storeId": "store-1", "data": {"purchases": ["l-1"]}})
    );
}

#[test]
fn rejected_key_is_permission_denied() {
    let (base_url, server) = serve_once(401, r#"{"error":"unauthorized"}"#);
    let output = embedlink(&[
        "session",
        "revoke",
        "sess-1",
        "--api-key",
        "wrong",
        "--api-url",
        &base_url,
    ]);
    assert_eq!(output.status.code(), Some(50));

    let captured = server.join().unwrap();
    assert!(captured.request_line.starts_with("DELETE / "));
}

#[test]
fn empty_api_key_is_a_usage_error() {
    let output = embedlink(&["session", "revoke", "sess-1", "--api-key", "", "--dry-run"]);
    assert_eq!(output.status.code(), Some(64));
}
