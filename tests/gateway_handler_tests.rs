//! Gateway handler tests.
//!
//! Drive the axum router with `tower::ServiceExt::oneshot` on top of a stub
//! transport, so every test sees the exact status, headers and bytes a browser
//! would.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use common::StubTransport;
use greenapi_gateway::gateway::event::{EventHandler, GatewayEvent};
use greenapi_gateway::gateway::handler::{handle_call, router, GatewayState};
use greenapi_gateway::ProviderClient;
use tower::ServiceExt;

fn state_with(stub: &Arc<StubTransport>) -> GatewayState {
    let client = ProviderClient::with_transport("https://api.green-api.com", stub.clone()).unwrap();
    GatewayState::new(Arc::new(client))
}

async fn send(state: GatewayState, method: Method, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    router(state).oneshot(request).await.unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

const VALID_CALL: &str =
    r#"{"idInstance":"1101","apiTokenInstance":"tok","method":"getStateInstance"}"#;

#[tokio::test]
async fn test_success_returns_result_verbatim() {
    let stub = StubTransport::responding(200, r#"{"stateInstance":"authorized"}"#);
    let response = send(state_with(&stub), Method::POST, "/api/call", VALID_CALL).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    assert_eq!(
        body_string(response).await,
        r#"{"result":{"stateInstance":"authorized"}}"#
    );
}

#[tokio::test]
async fn test_invalid_json_body() {
    let stub = StubTransport::responding(200, "{}");
    let response = send(state_with(&stub), Method::POST, "/api/call", "{not json").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, r#"{"error":"invalid JSON body"}"#);
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_blank_required_fields() {
    let stub = StubTransport::responding(200, "{}");
    let bodies = [
        r#"{"idInstance":"  ","apiTokenInstance":"tok","method":"getSettings"}"#,
        r#"{"idInstance":"1101","method":"getSettings"}"#,
        r#"{"idInstance":"1101","apiTokenInstance":"tok","method":"\t"}"#,
        "null",
    ];
    for body in bodies {
        let response = send(state_with(&stub), Method::POST, "/api/call", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"idInstance, apiTokenInstance and method are required"}"#
        );
    }
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_fields_are_trimmed_before_forwarding() {
    let stub = StubTransport::responding(200, "{}");
    let body = r#"{"idInstance":" 1101 ","apiTokenInstance":" tok ","method":" getSettings "}"#;
    let response = send(state_with(&stub), Method::POST, "/api/call", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        stub.last_request().url,
        "https://api.green-api.com/waInstance1101/getSettings/tok"
    );
}

#[tokio::test]
async fn test_unsupported_method_is_400_without_outbound_call() {
    let stub = StubTransport::responding(200, "{}");
    let body = r#"{"idInstance":"1101","apiTokenInstance":"tok","method":"reboot"}"#;
    let response = send(state_with(&stub), Method::POST, "/api/call", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_string(response).await,
        r#"{"error":"unsupported method \"reboot\""}"#
    );
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_upstream_500_becomes_400() {
    let stub = StubTransport::responding(500, "boom");
    let response = send(state_with(&stub), Method::POST, "/api/call", VALID_CALL).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("500") && error.contains("boom"), "{}", error);
    assert!(body.get("result").is_none());
}

#[tokio::test]
async fn test_plain_text_upstream_is_wrapped() {
    let stub = StubTransport::responding(200, "hello");
    let response = send(state_with(&stub), Method::POST, "/api/call", VALID_CALL).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"result":{"raw":"hello"}}"#);
}

#[tokio::test]
async fn test_empty_upstream_is_null() {
    let stub = StubTransport::responding(200, "");
    let response = send(state_with(&stub), Method::POST, "/api/call", VALID_CALL).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"result":null}"#);
}

#[tokio::test]
async fn test_transport_failure_is_400() {
    let stub = StubTransport::failing("connection refused");
    let response = send(state_with(&stub), Method::POST, "/api/call", VALID_CALL).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_string(response).await,
        r#"{"error":"send request: connection refused"}"#
    );
}

#[tokio::test]
async fn test_identical_calls_give_identical_responses() {
    let stub = StubTransport::responding(200, r#"{"idMessage":"BAE5F4886B6F6A9D"}"#);
    let state = state_with(&stub);
    let body = r#"{"idInstance":"1101","apiTokenInstance":"tok","method":"sendMessage","payload":{"chatId":"79991234567@c.us","message":"hi"}}"#;

    let first = body_string(send(state.clone(), Method::POST, "/api/call", body).await).await;
    let second = body_string(send(state, Method::POST, "/api/call", body).await).await;

    assert_eq!(first, second);
    assert_eq!(stub.calls(), 2);
}

#[tokio::test]
async fn test_preflight_and_wrong_method() {
    let stub = StubTransport::responding(200, "{}");

    let response = send(state_with(&stub), Method::OPTIONS, "/api/call", "").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()["access-control-allow-origin"].to_str().unwrap(),
        "*"
    );
    assert!(body_string(response).await.is_empty());

    let response = send(state_with(&stub), Method::GET, "/api/call", VALID_CALL).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_string(response).await, r#"{"error":"method not allowed"}"#);
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_cors_headers_on_every_response() {
    let stub = StubTransport::responding(500, "boom");
    let response = send(state_with(&stub), Method::POST, "/api/call", VALID_CALL).await;

    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
}

#[tokio::test]
async fn test_preview_endpoint() {
    let stub = StubTransport::responding(200, "{}");
    let form = r#"{"idInstance":"1101","apiTokenInstance":"tok","method":"sendFileByUrl","sendFileChatId":"7 999 123 45 67","sendFileUrl":"https://example.com/a.png"}"#;
    let response = send(state_with(&stub), Method::POST, "/api/preview", form).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        r#"{"result":{"idInstance":"1101","apiTokenInstance":"tok","method":"sendFileByUrl","payload":{"caption":"File by URL","chatId":"79991234567@c.us","fileName":"file","urlFile":"https://example.com/a.png"}}}"#
    );

    let form = r#"{"idInstance":"1101","apiTokenInstance":"tok","method":"sendMessage","sendMessageChatId":"x","sendMessageText":"hi"}"#;
    let response = send(state_with(&stub), Method::POST, "/api/preview", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_string(response).await,
        r#"{"error":"invalid chatId for sendMessage"}"#
    );
    assert_eq!(stub.calls(), 0);
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<GatewayEvent>>,
    count: AtomicUsize,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_gateway_event(&self, event: &GatewayEvent) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(event.clone());
    }
}

#[tokio::test]
async fn test_events_share_request_id() {
    let stub = StubTransport::responding(200, "{}");
    let handler = Arc::new(RecordingHandler::default());
    let state = state_with(&stub).with_event_handler(handler.clone());

    let outcome = handle_call(&state, VALID_CALL.as_bytes()).await;
    assert_eq!(outcome.status, StatusCode::OK);

    let events = handler.events.lock().unwrap().clone();
    assert_eq!(events.len(), 2);
    let (received_id, completed_id) = match (&events[0], &events[1]) {
        (
            GatewayEvent::CallReceived { request_id: a, method, .. },
            GatewayEvent::CallCompleted { request_id: b, .. },
        ) => {
            assert_eq!(method, "getStateInstance");
            (a.clone(), b.clone())
        }
        other => panic!("unexpected events: {:?}", other),
    };
    assert_eq!(received_id, completed_id);

    let outcome = handle_call(&state, b"[]").await;
    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
    assert!(matches!(
        handler.events.lock().unwrap().last(),
        Some(GatewayEvent::CallRejected { .. })
    ));
    assert_eq!(handler.count.load(Ordering::SeqCst), 3);
}
