//! Shared test doubles.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use greenapi_gateway::gateway::error::GatewayError;
use greenapi_gateway::gateway::transport::{OutboundRequest, ProviderTransport, TransportResponse};

/// Transport that records every request and answers with a fixed response.
pub struct StubTransport {
    status: u16,
    body: Vec<u8>,
    fail_with: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl StubTransport {
    pub fn responding(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.as_bytes().to_vec(),
            fail_with: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            status: 0,
            body: Vec::new(),
            fail_with: Some(message.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> OutboundRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl ProviderTransport for StubTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if let Some(ref message) = self.fail_with {
            return Err(GatewayError::Transport(message.clone()));
        }
        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}
