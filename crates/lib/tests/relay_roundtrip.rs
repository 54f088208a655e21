//! Integration test: start the relay server against a stub Chat API on free
//! ports and assert the HTTP contract end to end. Does not require real
//! Google credentials. The server tasks are left running when the tests end.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use lib::config::Config;
use lib::server;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

type Recorded = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

/// Stub Chat API: records (space, payload) for each create-message call.
async fn stub_create_message(
    State(recorded): State<Recorded>,
    Path(space): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    recorded.lock().await.push((space.clone(), payload));
    Json(serde_json::json!({ "name": format!("spaces/{}/messages/1", space) }))
}

async fn start_stub_chat_api(port: u16) -> Recorded {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1/spaces/:space/messages", post(stub_create_message))
        .with_state(recorded.clone());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("bind stub chat api");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    recorded
}

/// Config pointing the relay at the stub API, with a pre-existing key file so
/// the bootstrapper does not consult the environment.
fn relay_config(server_port: u16, api_port: u16, dir: &std::path::Path) -> Config {
    let key_file = dir.join("google_credentials.json");
    std::fs::write(&key_file, r#"{"project_id":"relay-test","client_id":"1234"}"#)
        .expect("write key file");
    let mut config = Config::default();
    config.server.port = server_port;
    config.server.bind = "127.0.0.1".to_string();
    config.credentials.key_file = key_file;
    config.chat.api_base = Some(format!("http://127.0.0.1:{}/v1", api_port));
    config.chat.token = Some("test-token".to_string());
    config
}

async fn get_json(url: &str) -> serde_json::Value {
    request_json(reqwest::Method::GET, url).await
}

async fn request_json(method: reqwest::Method, url: &str) -> serde_json::Value {
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.request(method.clone(), url).send().await {
            Ok(resp) => {
                assert!(resp.status().is_success(), "status: {}", resp.status());
                return resp.json().await.expect("parse JSON");
            }
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("{} {} did not respond within 5s; last error: {:?}", method, url, last_err);
}

#[tokio::test]
async fn get_relays_query_params_to_the_space() {
    let server_port = free_port();
    let api_port = free_port();
    let temp_dir = tempfile::tempdir().unwrap();

    let recorded = start_stub_chat_api(api_port).await;
    let config = relay_config(server_port, api_port, temp_dir.path());
    tokio::spawn(async move {
        let _ = server::run_server(config).await;
    });

    let url = format!("http://127.0.0.1:{}/?a=1&b=2", server_port);
    let json = get_json(&url).await;

    let expected = r#"Got your GET request with these params: {"a":"1","b":"2"}"#;
    assert_eq!(json.get("status").and_then(|v| v.as_u64()), Some(200));
    assert_eq!(json.get("message").and_then(|v| v.as_str()), Some(expected));
    assert_eq!(json.get("relayed").and_then(|v| v.as_bool()), Some(true));

    let calls = recorded.lock().await;
    assert_eq!(calls.len(), 1);
    let (space, payload) = &calls[0];
    assert_eq!(space, "iuAuLgAAAAE");
    assert_eq!(payload, &serde_json::json!({ "text": expected }));
}

#[tokio::test]
async fn post_without_params_relays_empty_object() {
    let server_port = free_port();
    let api_port = free_port();
    let temp_dir = tempfile::tempdir().unwrap();

    let recorded = start_stub_chat_api(api_port).await;
    let config = relay_config(server_port, api_port, temp_dir.path());
    tokio::spawn(async move {
        let _ = server::run_server(config).await;
    });

    let url = format!("http://127.0.0.1:{}/", server_port);
    let json = request_json(reqwest::Method::POST, &url).await;

    let expected = "Got your POST request with these params: {}";
    assert_eq!(json.get("message").and_then(|v| v.as_str()), Some(expected));
    assert_eq!(json.get("relayed").and_then(|v| v.as_bool()), Some(true));

    let calls = recorded.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, serde_json::json!({ "text": expected }));
}

#[tokio::test]
async fn relay_failure_still_returns_the_message() {
    let server_port = free_port();
    // Nothing listens on this port: every relay call fails.
    let dead_api_port = free_port();
    let temp_dir = tempfile::tempdir().unwrap();

    let config = relay_config(server_port, dead_api_port, temp_dir.path());
    tokio::spawn(async move {
        let _ = server::run_server(config).await;
    });

    let url = format!("http://127.0.0.1:{}/?a=1", server_port);
    let json = get_json(&url).await;

    assert_eq!(json.get("status").and_then(|v| v.as_u64()), Some(200));
    assert_eq!(
        json.get("message").and_then(|v| v.as_str()),
        Some(r#"Got your GET request with these params: {"a":"1"}"#)
    );
    assert_eq!(json.get("relayed").and_then(|v| v.as_bool()), Some(false));
}
