//! The closed set of provider operations the gateway forwards.
//!
//! Each [`Operation`] knows its wire name, the HTTP verb the provider expects,
//! the form fields it needs, and how to turn those fields into a request body.
//! Both the server-side typed calls on
//! [`ProviderClient`](crate::gateway::client::ProviderClient) and the
//! [`preview`](crate::gateway::preview) builder go through
//! [`Operation::build_payload`], so the two can never produce different bodies.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::gateway::chat_id;
use crate::gateway::error::GatewayError;

/// File name attached to every `sendFileByUrl` request.
pub const FILE_NAME: &str = "file";
/// Caption attached to every `sendFileByUrl` request.
pub const FILE_CAPTION: &str = "File by URL";

/// HTTP verb used for an outbound provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supported GREEN-API method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetSettings,
    GetStateInstance,
    SendMessage,
    SendFileByUrl,
}

/// Method-specific form input, before trimming or normalization.
///
/// Only the fields relevant to the operation are read; the rest may be empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadFields<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub file_url: &'a str,
}

impl Operation {
    /// Every supported operation, in the order the form lists them.
    pub const ALL: [Operation; 4] = [
        Operation::GetSettings,
        Operation::GetStateInstance,
        Operation::SendMessage,
        Operation::SendFileByUrl,
    ];

    /// Method name as it appears in the provider path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetSettings => "getSettings",
            Operation::GetStateInstance => "getStateInstance",
            Operation::SendMessage => "sendMessage",
            Operation::SendFileByUrl => "sendFileByUrl",
        }
    }

    pub fn verb(&self) -> HttpVerb {
        match self {
            Operation::GetSettings | Operation::GetStateInstance => HttpVerb::Get,
            Operation::SendMessage | Operation::SendFileByUrl => HttpVerb::Post,
        }
    }

    /// Form fields that must be non-empty for this operation.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Operation::GetSettings | Operation::GetStateInstance => &[],
            Operation::SendMessage => &["chatId", "text"],
            Operation::SendFileByUrl => &["chatId", "fileUrl"],
        }
    }

    /// Build the request body for this operation.
    ///
    /// Inputs are trimmed. Missing fields are reported before the chat id is
    /// normalized, so an empty chat id is a [`GatewayError::MissingFields`] and
    /// never a [`GatewayError::InvalidChatId`].
    ///
    /// ```rust
    /// use greenapi_gateway::gateway::operation::{Operation, PayloadFields};
    ///
    /// let payload = Operation::SendMessage
    ///     .build_payload(&PayloadFields { chat_id: "79991234567", text: "hi", ..Default::default() })
    ///     .unwrap();
    /// assert_eq!(
    ///     serde_json::to_string(&payload).unwrap(),
    ///     r#"{"chatId":"79991234567@c.us","message":"hi"}"#
    /// );
    /// ```
    pub fn build_payload(&self, fields: &PayloadFields<'_>) -> Result<Map<String, Value>, GatewayError> {
        let chat_id = fields.chat_id.trim();
        let mut payload = Map::new();

        match self {
            Operation::GetSettings | Operation::GetStateInstance => {}
            Operation::SendMessage => {
                let text = fields.text.trim();
                if chat_id.is_empty() || text.is_empty() {
                    return Err(self.missing_fields());
                }
                payload.insert("chatId".into(), Value::String(chat_id::normalize(chat_id)?));
                payload.insert("message".into(), Value::String(text.to_string()));
            }
            Operation::SendFileByUrl => {
                let file_url = fields.file_url.trim();
                if chat_id.is_empty() || file_url.is_empty() {
                    return Err(self.missing_fields());
                }
                payload.insert("chatId".into(), Value::String(chat_id::normalize(chat_id)?));
                payload.insert("urlFile".into(), Value::String(file_url.to_string()));
                payload.insert("fileName".into(), Value::String(FILE_NAME.to_string()));
                payload.insert("caption".into(), Value::String(FILE_CAPTION.to_string()));
            }
        }

        Ok(payload)
    }

    fn missing_fields(&self) -> GatewayError {
        GatewayError::MissingFields {
            operation: *self,
            fields: self.required_fields().join(" and "),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = GatewayError;

    /// Exact, case-sensitive match against the provider method names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| GatewayError::UnsupportedMethod(s.to_string()))
    }
}
