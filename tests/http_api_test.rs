//! HTTP API tests against a server bound to an ephemeral port

mod common;

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use cielo::adapters::http::types::{CHAT_FAILED, PATH_CREATION_FAILED};
use cielo::adapters::{AppState, CieloHttpServer, HttpServerConfig};
use cielo::services::{HandbookAssistant, SelectorPolicy};
use common::{assistant, planning_service, planning_service_with, FailingJustifier, ScriptedLlm};

struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start(state: AppState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = CieloHttpServer::new(state, HttpServerConfig::default());
        tokio::spawn(async move {
            let _ = server
                .serve_on(listener, async {
                    let _ = rx.await;
                })
                .await;
        });
        Self {
            addr,
            client: reqwest::Client::new(),
            shutdown: Some(tx),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn start_session(&self) -> String {
        let body: Value = self.get("/start").await.json().await.unwrap();
        body["sessionId"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn planning_state(policy: SelectorPolicy) -> AppState {
    AppState {
        planning: Arc::new(planning_service(policy)),
        assistant: None,
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start(planning_state(SelectorPolicy::direct())).await;
    let resp = server.get("/health").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_direct_flow_over_http() {
    let server = TestServer::start(planning_state(SelectorPolicy::direct())).await;

    let start: Value = server.get("/start").await.json().await.unwrap();
    assert_eq!(start["policy"], "direct");
    let id = start["sessionId"].as_str().unwrap().to_string();

    let resp = server
        .post(
            "/respond",
            json!({
                "sessionId": id,
                "scores": { "Abstand": { "capability": 7, "limitation": 2 } },
                "openAnswer": "Ich pendle täglich."
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(
        body["finalPath"],
        json!(["Aktivierung", "Abstand", "Risiken/Verantwortung", "Deaktivierung"])
    );
    assert_eq!(body["dangerGaps"]["Abstand"], 5);
    assert_eq!(body["currentChapter"], "Aktivierung");

    let step: Value = server
        .post("/advance", json!({ "sessionId": id }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(step, json!({ "status": "chapter", "index": 1, "chapter": "Abstand" }));

    let progress: Value = server
        .get(&format!("/progress?sessionId={id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(progress["cursor"], 1);
    assert_eq!(progress["currentChapter"], "Abstand");

    let resp = server
        .client
        .delete(server.url(&format!("/sessions/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    let resp = server.get(&format!("/progress?sessionId={id}")).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_verified_flow_over_http() {
    let server = TestServer::start(planning_state(SelectorPolicy::Verified)).await;
    let id = server.start_session().await;

    let body: Value = server
        .post(
            "/respond",
            json!({
                "sessionId": id,
                "scores": { "Notbremsung": { "capability": 6, "limitation": 1 } }
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "needs_verification");
    assert_eq!(body["pendingChapters"], json!(["Notbremsung"]));

    let question: Value = server
        .get(&format!("/question?sessionId={id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(question["chapter"], "Notbremsung");
    assert!(question["choices"][0].get("archetype").is_none());

    let resp = server
        .post(
            "/answer",
            json!({ "sessionId": id, "chapter": "Notbremsung", "choice": "x" }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["code"], "INVALID_ANSWER_KEY");

    let body: Value = server
        .post(
            "/answer",
            json!({ "sessionId": id, "chapter": "Notbremsung", "choice": "b" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["mandatoryChapters"], json!(["Notbremsung"]));
    assert_eq!(body["verification"][0]["archetype"], "overconfident");
}

#[tokio::test]
async fn test_client_errors() {
    let server = TestServer::start(planning_state(SelectorPolicy::direct())).await;

    let resp = server.post("/advance", json!({ "sessionId": "sess_missing" })).await;
    assert_eq!(resp.status(), 404);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["code"], "SESSION_NOT_FOUND");

    let id = server.start_session().await;
    let resp = server
        .post(
            "/respond",
            json!({
                "sessionId": id,
                "scores": { "Abstand": { "capability": 0, "limitation": 2 } }
            }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["code"], "SCORE_OUT_OF_RANGE");

    let resp = server.post("/advance", json!({ "sessionId": id })).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_malformed_bodies_keep_error_shape() {
    let server = TestServer::start(planning_state(SelectorPolicy::direct())).await;
    let id = server.start_session().await;

    for (capability, code) in [
        (json!(300), "SCORE_OUT_OF_RANGE"),
        (json!(-1), "SCORE_OUT_OF_RANGE"),
        (json!(null), "VALIDATION_FAILED"),
    ] {
        let resp = server
            .post(
                "/respond",
                json!({
                    "sessionId": id,
                    "scores": { "Abstand": { "capability": capability, "limitation": 2 } }
                }),
            )
            .await;
        assert_eq!(resp.status(), 400, "capability {capability}");
        let err: Value = resp.json().await.unwrap();
        assert_eq!(err["code"], code, "capability {capability}");
        assert!(err["error"].is_string());
    }

    let resp = server.post("/advance", json!({})).await;
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["code"], "VALIDATION_FAILED");
    assert!(err["error"].as_str().unwrap().contains("sessionId"));

    let resp = server.get("/progress").await;
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["code"], "VALIDATION_FAILED");

    // Out-of-range ratings for non-adaptive chapters are ignored.
    let resp = server
        .post(
            "/respond",
            json!({
                "sessionId": id,
                "scores": {
                    "Aktivierung": { "capability": -9, "limitation": 0 },
                    "Parken": { "capability": 300, "limitation": -4 },
                    "Abstand": { "capability": 7, "limitation": 2 }
                }
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["mandatoryChapters"], json!(["Abstand"]));
}

#[tokio::test]
async fn test_justification_failure_returns_generic_message() {
    let state = AppState {
        planning: Arc::new(planning_service_with(
            SelectorPolicy::direct(),
            Arc::new(FailingJustifier),
        )),
        assistant: None,
    };
    let server = TestServer::start(state).await;
    let id = server.start_session().await;

    let resp = server
        .post(
            "/respond",
            json!({
                "sessionId": id,
                "scores": { "Abstand": { "capability": 7, "limitation": 2 } }
            }),
        )
        .await;
    assert_eq!(resp.status(), 500);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], PATH_CREATION_FAILED);
    assert!(!err["error"].as_str().unwrap().contains("upstream"));
}

#[tokio::test]
async fn test_chapters_listing() {
    let server = TestServer::start(planning_state(SelectorPolicy::direct())).await;
    let chapters: Vec<Value> = server.get("/chapters").await.json().await.unwrap();
    assert_eq!(chapters.len(), 8);
    assert_eq!(chapters[0]["id"], "Aktivierung");
    assert_eq!(chapters[0]["hasQuestion"], false);
    assert_eq!(chapters[2]["id"], "Abstand");
    assert_eq!(chapters[2]["hasQuestion"], true);
}

#[tokio::test]
async fn test_chat_disabled_returns_503() {
    let server = TestServer::start(planning_state(SelectorPolicy::direct())).await;
    let resp = server.post("/start-chat", json!({})).await;
    assert_eq!(resp.status(), 503);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["code"], "CHAT_UNAVAILABLE");
}

#[tokio::test]
async fn test_chat_over_http() {
    let assistant: HandbookAssistant = assistant(Arc::new(ScriptedLlm::new("Hallo zurück")));
    assistant.ingest(common::HANDBOOK).await.unwrap();
    let state = AppState {
        planning: Arc::new(planning_service(SelectorPolicy::direct())),
        assistant: Some(Arc::new(assistant)),
    };
    let server = TestServer::start(state).await;

    let start: Value = server
        .post(
            "/start-chat",
            json!({ "scores": { "Abstand": { "capability": 2, "limitation": 5 } } }),
        )
        .await
        .json()
        .await
        .unwrap();
    let chat_id = start["sessionId"].as_str().unwrap().to_string();
    assert!(start["message"].as_str().unwrap().contains("Abstand"));

    let reply: Value = server
        .post(
            "/chat-message",
            json!({ "sessionId": chat_id, "message": "Wie aktiviere ich das System?" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(reply["message"], "Hallo zurück");

    let resp = server
        .post("/chat-message", json!({ "sessionId": "sess_missing", "message": "Hallo" }))
        .await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_chat_failure_returns_generic_message() {
    let assistant = assistant(Arc::new(ScriptedLlm::new("   ")));
    assistant.ingest(common::HANDBOOK).await.unwrap();
    let state = AppState {
        planning: Arc::new(planning_service(SelectorPolicy::direct())),
        assistant: Some(Arc::new(assistant)),
    };
    let server = TestServer::start(state).await;

    let start: Value = server
        .post("/start-chat", json!({}))
        .await
        .json()
        .await
        .unwrap();
    let resp = server
        .post(
            "/chat-message",
            json!({ "sessionId": start["sessionId"], "message": "Hallo" }),
        )
        .await;
    assert_eq!(resp.status(), 500);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], CHAT_FAILED);
}
