//! Gateway event system.
//!
//! Implement [`EventHandler`] to observe what the gateway does with each call:
//! when it arrives, when it is rejected before reaching the provider, and how
//! the provider call ended. Every event for the same inbound request carries
//! the same `request_id`.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use greenapi_gateway::gateway::event::{EventHandler, GatewayEvent};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl EventHandler for Printer {
//!     async fn on_gateway_event(&self, event: &GatewayEvent) {
//!         if let GatewayEvent::CallCompleted { method, duration_ms, .. } = event {
//!             println!("{} took {}ms", method, duration_ms);
//!         }
//!     }
//! }
//! ```

use async_trait::async_trait;

/// Events emitted by the gateway handler and server.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// The server bound its listener.
    ServerStarted {
        /// Address actually bound (useful when port 0 was requested).
        addr: String,
    },
    /// A call request was decoded and passed field validation.
    CallReceived {
        request_id: String,
        id_instance: String,
        method: String,
    },
    /// The call was refused before any provider request was made.
    CallRejected { request_id: String, reason: String },
    /// The provider call succeeded.
    CallCompleted {
        request_id: String,
        method: String,
        duration_ms: u64,
    },
    /// The provider call failed (unsupported method, transport or provider error).
    CallFailed {
        request_id: String,
        method: String,
        error: String,
        duration_ms: u64,
    },
}

/// Receiver for [`GatewayEvent`]s.
///
/// The default implementation is a no-op. The `Send + Sync` bound lets one
/// handler be shared by every request task via `Arc<dyn EventHandler>`.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_gateway_event(&self, _event: &GatewayEvent) {}
}
