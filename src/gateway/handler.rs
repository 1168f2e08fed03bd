//! HTTP handler for the gateway.
//!
//! Exposes the [`ProviderClient`] behind `POST /api/call` and the request
//! preview behind `POST /api/preview`. Every answer, success or failure, is a
//! JSON [`Envelope`] with exactly one of `result` or `error` set.
//!
//! Validation errors, transport errors and provider errors all map to
//! `400 Bad Request`; only the `error` text tells them apart.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::value::RawValue;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::gateway::client::ProviderClient;
use crate::gateway::error::GatewayError;
use crate::gateway::event::{EventHandler, GatewayEvent};
use crate::gateway::preview::{self, RequestForm};
use crate::gateway::request::CallRequest;

/// Path of the call endpoint.
pub const CALL_PATH: &str = "/api/call";
/// Path of the preview endpoint.
pub const PREVIEW_PATH: &str = "/api/preview";

/// Largest inbound request body accepted (1MB).
const MAX_REQUEST_BODY: usize = 1024 * 1024;

/// Uniform response body.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn success(result: Box<RawValue>) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Status code plus envelope, ready to be turned into a response.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl CallOutcome {
    fn ok(result: Box<RawValue>) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: Envelope::success(result),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            envelope: Envelope::failure(message),
        }
    }

    fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            envelope: Envelope::failure("method not allowed"),
        }
    }
}

impl IntoResponse for CallOutcome {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// Shared, read-only state handed to every request task.
#[derive(Clone)]
pub struct GatewayState {
    client: Arc<ProviderClient>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl GatewayState {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self {
            client,
            event_handler: None,
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    async fn emit(&self, event: GatewayEvent) {
        if let Some(ref handler) = self.event_handler {
            handler.on_gateway_event(&event).await;
        }
    }
}

/// Decode, validate and forward one call request.
///
/// The provider client is only invoked once the body decodes and the three
/// identifying fields are non-empty after trimming.
pub async fn handle_call(state: &GatewayState, raw_body: &[u8]) -> CallOutcome {
    let request_id = uuid::Uuid::new_v4().to_string();

    let mut request = match CallRequest::from_slice(raw_body) {
        Ok(request) => request,
        Err(err) => return reject(state, request_id, err).await,
    };
    if let Err(err) = request.normalize() {
        return reject(state, request_id, err).await;
    }

    info!(
        "greenapi_gateway::handler [{}]: {} for instance {}",
        request_id, request.method, request.id_instance
    );
    state
        .emit(GatewayEvent::CallReceived {
            request_id: request_id.clone(),
            id_instance: request.id_instance.clone(),
            method: request.method.clone(),
        })
        .await;

    let started = Instant::now();
    let result = state
        .client
        .call(
            &request.id_instance,
            &request.api_token_instance,
            &request.method,
            request.payload,
        )
        .await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(raw) => {
            state
                .emit(GatewayEvent::CallCompleted {
                    request_id,
                    method: request.method,
                    duration_ms,
                })
                .await;
            CallOutcome::ok(raw)
        }
        Err(err) => {
            let message = err.to_string();
            if err.is_validation() {
                warn!("greenapi_gateway::handler [{}]: {}", request_id, message);
            } else {
                error!("greenapi_gateway::handler [{}]: {}", request_id, message);
            }
            state
                .emit(GatewayEvent::CallFailed {
                    request_id,
                    method: request.method,
                    error: message.clone(),
                    duration_ms,
                })
                .await;
            CallOutcome::bad_request(message)
        }
    }
}

async fn reject(state: &GatewayState, request_id: String, err: GatewayError) -> CallOutcome {
    let message = err.to_string();
    warn!("greenapi_gateway::handler [{}]: rejected: {}", request_id, message);
    state
        .emit(GatewayEvent::CallRejected {
            request_id,
            reason: message.clone(),
        })
        .await;
    CallOutcome::bad_request(message)
}

/// Build the [`CallRequest`] a form would submit, without calling the provider.
pub fn handle_preview(raw_body: &[u8]) -> CallOutcome {
    let form: RequestForm = match serde_json::from_slice(raw_body) {
        Ok(form) => form,
        Err(_) => return CallOutcome::bad_request(GatewayError::InvalidBody.to_string()),
    };

    let request = match preview::build_request(&form) {
        Ok(request) => request,
        Err(err) => return CallOutcome::bad_request(err.to_string()),
    };

    match serde_json::to_string(&request).and_then(RawValue::from_string) {
        Ok(raw) => CallOutcome::ok(raw),
        Err(err) => CallOutcome::bad_request(GatewayError::from(err).to_string()),
    }
}

async fn call_endpoint(State(state): State<GatewayState>, request: Request) -> Response {
    match read_post_body(request).await {
        Ok(body) => handle_call(&state, &body).await.into_response(),
        Err(response) => response,
    }
}

async fn preview_endpoint(request: Request) -> Response {
    match read_post_body(request).await {
        Ok(body) => handle_preview(&body).into_response(),
        Err(response) => response,
    }
}

/// Answer preflight and wrong-method requests before the body is read.
async fn read_post_body(request: Request) -> Result<axum::body::Bytes, Response> {
    let method = request.method().clone();
    match method {
        Method::OPTIONS => Err(StatusCode::NO_CONTENT.into_response()),
        Method::POST => axum::body::to_bytes(request.into_body(), MAX_REQUEST_BODY)
            .await
            .map_err(|_| CallOutcome::bad_request(GatewayError::InvalidBody.to_string()).into_response()),
        _ => Err(CallOutcome::method_not_allowed().into_response()),
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("greenapi_gateway::handler: request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::failure("internal server error")),
    )
        .into_response()
}

/// Build the gateway router.
///
/// Every response, including the one produced for a panicking handler, gets
/// permissive CORS headers. `OPTIONS` requests reach the endpoints and are
/// answered with an empty `204`.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route(CALL_PATH, any(call_endpoint))
        .route(PREVIEW_PATH, any(preview_endpoint))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static("*"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static("GET, POST, OPTIONS"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static("Content-Type"),
                ))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_has_exactly_one_field() {
        let ok = serde_json::to_string(&Envelope::success(
            RawValue::from_string("null".to_string()).unwrap(),
        ))
        .unwrap();
        assert_eq!(ok, r#"{"result":null}"#);

        let err = serde_json::to_string(&Envelope::failure("boom")).unwrap();
        assert_eq!(err, r#"{"error":"boom"}"#);
    }

    #[test]
    fn preview_rejects_bad_json() {
        let outcome = handle_preview(b"{");
        assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
        assert_eq!(outcome.envelope.error.as_deref(), Some("invalid JSON body"));
    }

    #[test]
    fn preview_returns_call_request() {
        let outcome = handle_preview(
            br#"{"idInstance":"1","apiTokenInstance":"t","method":"getStateInstance"}"#,
        );
        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(
            outcome.envelope.result.unwrap().get(),
            r#"{"idInstance":"1","apiTokenInstance":"t","method":"getStateInstance","payload":{}}"#
        );
    }
}
