//! GREEN-API provider client.
//!
//! Turns an `(idInstance, apiTokenInstance, method, payload)` tuple into a
//! single outbound call and normalizes whatever comes back into either an
//! opaque JSON value or a [`GatewayError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use greenapi_gateway::gateway::client::ProviderClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ProviderClient::new("https://api.green-api.com")?;
//!     let state = client.get_state_instance("1101000001", "d75b3a66374942c5b3c019c698abc2067e151558acbd412345").await?;
//!     println!("{}", state.get());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use log::debug;
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use crate::gateway::error::GatewayError;
use crate::gateway::operation::{HttpVerb, Operation, PayloadFields};
use crate::gateway::transport::{
    OutboundRequest, ProviderTransport, ReqwestTransport, TransportResponse, DEFAULT_TIMEOUT,
};

/// Placeholder used in provider errors whose body is blank.
const EMPTY_RESPONSE: &str = "empty response";

/// Forwards calls to a single GREEN-API base URL.
///
/// Immutable after construction; share it across requests behind an `Arc`.
pub struct ProviderClient {
    base_url: String,
    transport: Arc<dyn ProviderTransport>,
}

impl ProviderClient {
    /// Create a client that talks to `base_url` through a [`ReqwestTransport`]
    /// bounded by [`DEFAULT_TIMEOUT`].
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let transport = ReqwestTransport::new(DEFAULT_TIMEOUT)?;
        Self::with_transport(base_url, Arc::new(transport))
    }

    /// Create a client with a caller-supplied transport.
    pub fn with_transport(
        base_url: &str,
        transport: Arc<dyn ProviderTransport>,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            base_url: validate_base_url(base_url)?,
            transport,
        })
    }

    /// Base URL with trailing slashes removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Provider URL for `operation`, with the credentials escaped as path segments.
    pub fn endpoint(&self, id_instance: &str, operation: Operation, api_token: &str) -> String {
        format!(
            "{}/waInstance{}/{}/{}",
            self.base_url,
            urlencoding::encode(id_instance),
            operation.as_str(),
            urlencoding::encode(api_token),
        )
    }

    /// Assemble the outbound request without sending it.
    ///
    /// GET operations never carry a body. POST operations always do: an absent
    /// payload is sent as `{}`. Credentials that a URL parser would resolve as
    /// `.` or `..` segments are rejected.
    pub fn build_request(
        &self,
        id_instance: &str,
        api_token: &str,
        operation: Operation,
        payload: Option<&Map<String, Value>>,
    ) -> Result<OutboundRequest, GatewayError> {
        check_path_segment("idInstance", id_instance)?;
        check_path_segment("apiTokenInstance", api_token)?;

        let mut headers = Vec::with_capacity(2);
        let body = match operation.verb() {
            HttpVerb::Get => None,
            HttpVerb::Post => {
                let raw = match payload {
                    Some(map) => serde_json::to_vec(map)?,
                    None => serde_json::to_vec(&Map::new())?,
                };
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                Some(raw)
            }
        };
        headers.push(("Accept".to_string(), "application/json".to_string()));

        Ok(OutboundRequest {
            verb: operation.verb(),
            url: self.endpoint(id_instance, operation, api_token),
            headers,
            body,
        })
    }

    /// Forward `method` to the provider.
    ///
    /// Unknown methods fail with [`GatewayError::UnsupportedMethod`] before the
    /// transport is touched.
    pub async fn call(
        &self,
        id_instance: &str,
        api_token: &str,
        method: &str,
        payload: Option<Map<String, Value>>,
    ) -> Result<Box<RawValue>, GatewayError> {
        let operation: Operation = method.parse()?;
        self.call_operation(id_instance, api_token, operation, payload.as_ref())
            .await
    }

    /// Forward an already-resolved [`Operation`].
    pub async fn call_operation(
        &self,
        id_instance: &str,
        api_token: &str,
        operation: Operation,
        payload: Option<&Map<String, Value>>,
    ) -> Result<Box<RawValue>, GatewayError> {
        let request = self.build_request(id_instance, api_token, operation, payload)?;
        debug!(
            "greenapi_gateway::client: {} {} for instance {} via {}",
            request.verb,
            operation,
            id_instance,
            self.transport.name()
        );

        let response = self.transport.send(request).await?;
        normalize_response(response)
    }

    pub async fn get_settings(
        &self,
        id_instance: &str,
        api_token: &str,
    ) -> Result<Box<RawValue>, GatewayError> {
        self.call_operation(id_instance, api_token, Operation::GetSettings, None)
            .await
    }

    pub async fn get_state_instance(
        &self,
        id_instance: &str,
        api_token: &str,
    ) -> Result<Box<RawValue>, GatewayError> {
        self.call_operation(id_instance, api_token, Operation::GetStateInstance, None)
            .await
    }

    /// Send a text message. `chat_id` may be a bare phone number.
    pub async fn send_message(
        &self,
        id_instance: &str,
        api_token: &str,
        chat_id: &str,
        text: &str,
    ) -> Result<Box<RawValue>, GatewayError> {
        let payload = Operation::SendMessage.build_payload(&PayloadFields {
            chat_id,
            text,
            ..Default::default()
        })?;
        self.call_operation(id_instance, api_token, Operation::SendMessage, Some(&payload))
            .await
    }

    /// Send a file the provider downloads from `file_url`.
    pub async fn send_file_by_url(
        &self,
        id_instance: &str,
        api_token: &str,
        chat_id: &str,
        file_url: &str,
    ) -> Result<Box<RawValue>, GatewayError> {
        let payload = Operation::SendFileByUrl.build_payload(&PayloadFields {
            chat_id,
            file_url,
            ..Default::default()
        })?;
        self.call_operation(id_instance, api_token, Operation::SendFileByUrl, Some(&payload))
            .await
    }
}

/// Percent-escaping leaves `.` and `..` intact, and `%2e` is still a dot
/// segment to the URL parser, so these values can only be refused.
fn check_path_segment(field: &'static str, value: &str) -> Result<(), GatewayError> {
    match value.trim() {
        "." | ".." => Err(GatewayError::InvalidPathSegment {
            field,
            value: value.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Validate a provider base URL and strip its trailing slashes.
///
/// Only absolute `http` and `https` URLs with a host are accepted.
pub fn validate_base_url(raw: &str) -> Result<String, GatewayError> {
    let normalized = raw.trim().trim_end_matches('/');
    if normalized.is_empty() {
        return Err(GatewayError::Config(
            "green api base url is required".to_string(),
        ));
    }

    let parsed = reqwest::Url::parse(normalized).map_err(|_| {
        GatewayError::Config(format!("invalid green api base url {:?}", normalized))
    })?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(GatewayError::Config(format!(
            "invalid green api base url {:?}",
            normalized
        )));
    }

    match parsed.scheme() {
        "http" | "https" => Ok(normalized.to_string()),
        other => Err(GatewayError::Config(format!(
            "unsupported green api base url scheme {:?}",
            other
        ))),
    }
}

/// Classify a provider response.
///
/// - status ≥ 400 → [`GatewayError::Provider`] with the trimmed body text
/// - empty body → `null`
/// - body that is not valid JSON → `{"raw": "<body>"}`
/// - anything else → the body, verbatim
pub fn normalize_response(response: TransportResponse) -> Result<Box<RawValue>, GatewayError> {
    if response.status >= 400 {
        let text = String::from_utf8_lossy(&response.body);
        let trimmed = text.trim();
        let body = if trimmed.is_empty() {
            EMPTY_RESPONSE.to_string()
        } else {
            trimmed.to_string()
        };
        return Err(GatewayError::Provider {
            status: response.status,
            body,
        });
    }

    if response.body.is_empty() {
        return Ok(RawValue::from_string("null".to_string())?);
    }

    match String::from_utf8(response.body) {
        Ok(text) => match serde_json::from_str::<Box<RawValue>>(&text) {
            Ok(raw) => Ok(raw),
            Err(_) => wrap_raw(&text),
        },
        Err(e) => wrap_raw(&String::from_utf8_lossy(e.as_bytes())),
    }
}

fn wrap_raw(text: &str) -> Result<Box<RawValue>, GatewayError> {
    let wrapped = serde_json::to_string(&serde_json::json!({ "raw": text }))?;
    Ok(RawValue::from_string(wrapped)?)
}
