//! Integration tests for the HTTP webhook listener.
//!
//! Each test binds an ephemeral port and drives the listener with `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use branch_freezer::forge::ForgeClient;
use branch_freezer::webhook::dispatcher::Dispatcher;
use branch_freezer::webhook::server::{serve_on, WebhookState};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::test_helpers::{test_config, ForgeCall, RecordingForge, FREEZE, POLICY};

/// Spawn the listener, returning its base URL and shutdown token.
async fn spawn_server(forge: &Arc<RecordingForge>, secret: &str) -> (String, CancellationToken) {
    let client: Arc<dyn ForgeClient> = Arc::clone(forge) as Arc<dyn ForgeClient>;
    let state = Arc::new(WebhookState {
        dispatcher: Arc::new(Dispatcher::new(test_config(), client).expect("dispatcher")),
        webhook_secret: secret.into(),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    tokio::spawn(async move {
        let _ = serve_on(listener, state, server_ct).await;
    });

    (format!("http://{addr}"), ct)
}

fn opened_pr() -> serde_json::Value {
    json!({
        "action": "open",
        "pull_request": {
            "number": 9,
            "state": "open",
            "labels": [],
            "base": { "ref": "release-1" }
        },
        "repository": { "namespace": "o", "path": "r" }
    })
}

/// Poll until the forge has seen at least `n` mutations.
async fn wait_for_mutations(forge: &RecordingForge, n: usize) -> Vec<ForgeCall> {
    for _ in 0..50 {
        let seen = forge.mutations();
        if seen.len() >= n {
            return seen;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    forge.mutations()
}

#[tokio::test]
async fn health_returns_ok() {
    let forge = Arc::new(RecordingForge::with_policy(POLICY));
    let (base_url, ct) = spawn_server(&forge, "").await;

    let resp = reqwest::get(format!("{base_url}/health"))
        .await
        .expect("HTTP GET /health");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "ok");

    ct.cancel();
}

#[tokio::test]
async fn pull_request_hook_is_accepted_and_handled() {
    let forge = Arc::new(RecordingForge::with_policy(POLICY));
    let (base_url, ct) = spawn_server(&forge, "").await;

    let resp = reqwest::Client::new()
        .post(format!("{base_url}/hook"))
        .header("X-Gitee-Event", "Merge Request Hook")
        .json(&opened_pr())
        .send()
        .await
        .expect("POST /hook");
    assert_eq!(resp.status(), 202);

    let seen = wait_for_mutations(&forge, 1).await;
    assert_eq!(seen, vec![ForgeCall::AddLabel(9, FREEZE.into())]);

    ct.cancel();
}

#[tokio::test]
async fn unknown_event_kind_is_accepted_and_ignored() {
    let forge = Arc::new(RecordingForge::with_policy(POLICY));
    let (base_url, ct) = spawn_server(&forge, "").await;

    let resp = reqwest::Client::new()
        .post(format!("{base_url}/hook"))
        .header("X-Gitee-Event", "Push Hook")
        .body("{}")
        .send()
        .await
        .expect("POST /hook");
    assert_eq!(resp.status(), 202);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(forge.calls().is_empty());

    ct.cancel();
}

#[tokio::test]
async fn malformed_payload_is_bad_request() {
    let forge = Arc::new(RecordingForge::with_policy(POLICY));
    let (base_url, ct) = spawn_server(&forge, "").await;

    let resp = reqwest::Client::new()
        .post(format!("{base_url}/hook"))
        .header("X-Gitee-Event", "Note Hook")
        .body("not json")
        .send()
        .await
        .expect("POST /hook");
    assert_eq!(resp.status(), 400);

    ct.cancel();
}

#[tokio::test]
async fn missing_event_header_is_bad_request() {
    let forge = Arc::new(RecordingForge::with_policy(POLICY));
    let (base_url, ct) = spawn_server(&forge, "").await;

    let resp = reqwest::Client::new()
        .post(format!("{base_url}/hook"))
        .json(&opened_pr())
        .send()
        .await
        .expect("POST /hook");
    assert_eq!(resp.status(), 400);

    ct.cancel();
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let forge = Arc::new(RecordingForge::with_policy(POLICY));
    let (base_url, ct) = spawn_server(&forge, "s3cret").await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base_url}/hook"))
        .header("X-Gitee-Event", "Merge Request Hook")
        .header("X-Gitee-Token", "guess")
        .json(&opened_pr())
        .send()
        .await
        .expect("POST /hook");
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(format!("{base_url}/hook"))
        .header("X-Gitee-Event", "Merge Request Hook")
        .header("X-Gitee-Token", "s3cret")
        .json(&opened_pr())
        .send()
        .await
        .expect("POST /hook");
    assert_eq!(resp.status(), 202);

    let seen = wait_for_mutations(&forge, 1).await;
    assert_eq!(seen.len(), 1);

    ct.cancel();
}
