//! # greenapi-gateway
//!
//! A small HTTP gateway between a browser form and the GREEN-API messaging
//! API. The form posts `{idInstance, apiTokenInstance, method, payload}` to
//! `/api/call`; the gateway checks the method against a fixed whitelist,
//! forwards the call to `{base}/waInstance{id}/{method}/{token}`, and answers
//! with a uniform `{"result": ...}` or `{"error": "..."}` envelope.
//!
//! The crate is layered bottom-up:
//!
//! * [`gateway::operation`]: the closed set of supported methods, their HTTP
//!   verbs and payload rules, with [`gateway::chat_id`] normalizing phone
//!   numbers into chat identifiers
//! * [`gateway::client`]: [`ProviderClient`], which builds the outbound call,
//!   sends it through a pluggable [`gateway::transport::ProviderTransport`] and
//!   normalizes the response
//! * [`gateway::preview`]: the pure request builder the form uses to show the
//!   exact request before submitting it
//! * `gateway::handler` and `gateway::server` (on the default `server`
//!   feature): the axum front end
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use greenapi_gateway::ProviderClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     greenapi_gateway::init_logger();
//!
//!     let client = ProviderClient::new("https://api.green-api.com")?;
//!     let reply = client
//!         .send_message("1101000001", "my-token", "+7 999 123-45-67", "Hello from the gateway")
//!         .await?;
//!
//!     println!("{}", reply.get());
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Diagnostics are driven by `RUST_LOG`, e.g. `RUST_LOG=greenapi_gateway=debug`.
///
/// ```rust
/// greenapi_gateway::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

pub mod gateway;

// Re-exporting key items for easier external access.
pub use gateway::client::ProviderClient;
pub use gateway::config::GatewayConfig;
pub use gateway::error::GatewayError;
pub use gateway::event::{EventHandler, GatewayEvent};
pub use gateway::operation::{HttpVerb, Operation};
pub use gateway::preview::{build_request, PreviewError, RequestForm};
pub use gateway::request::CallRequest;
pub use gateway::transport::{ProviderTransport, ReqwestTransport};

#[cfg(feature = "server")]
pub use gateway::server::GatewayServer;
