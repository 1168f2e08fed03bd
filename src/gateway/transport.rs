//! Outbound HTTP transport.
//!
//! [`ProviderClient`](crate::gateway::client::ProviderClient) builds a fully
//! formed [`OutboundRequest`] and hands it to a [`ProviderTransport`]. The
//! default implementation is [`ReqwestTransport`]; tests plug in a stub that
//! records requests and replays canned responses without touching the network.
//!
//! ```text
//! ProviderClient
//!        ↓ OutboundRequest
//! ProviderTransport (trait)
//!        ↓ (implements)
//!   ┌────┴──────────┐
//!   ↓               ↓
//! ReqwestTransport  StubTransport (tests)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::gateway::error::GatewayError;
use crate::gateway::operation::HttpVerb;

/// Client-wide bound on a single provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest provider response body the gateway will buffer (10MB).
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// A provider call ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub verb: HttpVerb,
    /// Absolute URL including the escaped instance id and token.
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON bytes for POST operations, `None` for GET.
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw status and body returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Something that can execute an [`OutboundRequest`].
///
/// Implementations report connection failures and timeouts as
/// [`GatewayError::Transport`]. HTTP error statuses are *not* errors at this
/// layer; they come back as a normal [`TransportResponse`].
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, GatewayError>;

    /// Name of this transport (for logging/debugging)
    fn name(&self) -> &str {
        "unknown"
    }
}

/// [`ProviderTransport`] backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    max_response_size: usize,
}

impl ReqwestTransport {
    /// Create a transport whose every request is bounded by `timeout`.
    ///
    /// The underlying client keeps idle connections to the provider for 90
    /// seconds and sends TCP keepalives every 60 seconds, so consecutive form
    /// submissions reuse the same TLS session.
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("build http client: {}", e)))?;

        Ok(Self {
            client,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        })
    }

    /// Override the response size cap.
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }
}

#[async_trait]
impl ProviderTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, GatewayError> {
        let method = match request.verb {
            HttpVerb::Get => reqwest::Method::GET,
            HttpVerb::Post => reqwest::Method::POST,
        };

        let mut req = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            req = req.body(body);
        }

        let response = req
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();

        // Read incrementally so an oversized body is rejected before it is
        // fully buffered.
        let mut stream = response.bytes_stream();
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                GatewayError::Transport(format!("read response: {}", e.without_url()))
            })?;
            if body.len() + chunk.len() > self.max_response_size {
                return Err(GatewayError::Transport(format!(
                    "response body exceeds maximum size of {} bytes",
                    self.max_response_size
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(TransportResponse { status, body })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

/// The request URL embeds the API token, so it never reaches the message.
fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.without_url().to_string())
}
