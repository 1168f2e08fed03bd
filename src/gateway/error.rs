//! Error type shared by every layer of the gateway.
//!
//! The `Display` text of a [`GatewayError`] is exactly what ends up in the
//! `error` field of the JSON envelope, so the messages are written for the
//! person filling in the form.

use thiserror::Error;

use crate::gateway::operation::Operation;

/// Errors produced while configuring the gateway or forwarding a call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid or missing start-up configuration (base URL, listen address, config file).
    #[error("{0}")]
    Config(String),

    /// The requested method is not one of the supported provider operations.
    #[error("unsupported method {0:?}")]
    UnsupportedMethod(String),

    /// idInstance, apiTokenInstance or method missing from an inbound call.
    #[error("idInstance, apiTokenInstance and method are required")]
    MissingCallFields,

    /// A method-specific required field was left empty.
    #[error("{operation} requires {fields}")]
    MissingFields { operation: Operation, fields: String },

    /// An instance id or token that would be read as a `.` or `..` path segment.
    #[error("invalid {field} {value:?}")]
    InvalidPathSegment { field: &'static str, value: String },

    /// The chat identifier had no digits left after normalization.
    #[error("invalid chatId {0:?}")]
    InvalidChatId(String),

    /// The inbound body could not be decoded as a call request.
    #[error("invalid JSON body")]
    InvalidBody,

    /// Connection failure, timeout or unreadable response body.
    #[error("send request: {0}")]
    Transport(String),

    /// The provider answered with a status of 400 or above.
    #[error("green-api status {status}: {body}")]
    Provider { status: u16, body: String },

    /// Payload serialization failure.
    #[error("marshal payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// True for errors caused by the caller's input rather than by the network
    /// or the provider.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GatewayError::UnsupportedMethod(_)
                | GatewayError::MissingCallFields
                | GatewayError::MissingFields { .. }
                | GatewayError::InvalidChatId(_)
                | GatewayError::InvalidPathSegment { .. }
                | GatewayError::InvalidBody
        )
    }
}
