//! The inbound call request shared by the handler and the preview builder.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::gateway::error::GatewayError;

/// Body of `POST /api/call`.
///
/// Missing string fields decode as empty strings so that the handler can
/// report them with a single "required" message instead of a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(default)]
    pub id_instance: String,
    #[serde(default)]
    pub api_token_instance: String,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

impl CallRequest {
    /// Decode a raw request body. A JSON `null` decodes as an empty request,
    /// which [`normalize`](Self::normalize) then rejects for its missing
    /// fields. Anything else that is not a JSON object with the expected field
    /// types is [`GatewayError::InvalidBody`].
    pub fn from_slice(raw: &[u8]) -> Result<Self, GatewayError> {
        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Null) => Ok(Self::default()),
            Ok(value @ Value::Object(_)) => {
                serde_json::from_value(value).map_err(|_| GatewayError::InvalidBody)
            }
            _ => Err(GatewayError::InvalidBody),
        }
    }

    /// Trim the identifying fields in place and check none of them is empty.
    pub fn normalize(&mut self) -> Result<(), GatewayError> {
        trim_in_place(&mut self.id_instance);
        trim_in_place(&mut self.api_token_instance);
        trim_in_place(&mut self.method);

        if self.id_instance.is_empty() || self.api_token_instance.is_empty() || self.method.is_empty()
        {
            return Err(GatewayError::MissingCallFields);
        }
        Ok(())
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}
