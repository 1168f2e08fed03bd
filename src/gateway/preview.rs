//! Request preview for the browser form.
//!
//! The form collects seven loose fields and needs to show the user the exact
//! [`CallRequest`] that will be submitted before sending it. [`build_request`]
//! does that without any network access, and goes through the same
//! [`Operation::build_payload`] as the typed client calls.

use serde::{Deserialize, Serialize};

use crate::gateway::error::GatewayError;
use crate::gateway::operation::{Operation, PayloadFields};
use crate::gateway::request::CallRequest;

/// Raw form state. Every field may contain surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestForm {
    pub id_instance: String,
    pub api_token_instance: String,
    pub method: String,
    pub send_message_chat_id: String,
    pub send_message_text: String,
    pub send_file_chat_id: String,
    pub send_file_url: String,
}

/// Why a form could not be turned into a request.
///
/// The messages point at the form fields the user has to fix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    #[error("idInstance and apiTokenInstance are required")]
    MissingCredentials,
    #[error("sendMessage requires chatId and text")]
    MissingMessageFields,
    #[error("sendFileByUrl requires chatId and fileUrl")]
    MissingFileFields,
    #[error("invalid chatId for {0}")]
    InvalidChatId(Operation),
    #[error("unknown method: {0}")]
    UnknownMethod(String),
}

/// Build the [`CallRequest`] the form would submit.
///
/// ```rust
/// use greenapi_gateway::gateway::preview::{build_request, RequestForm};
///
/// let form = RequestForm {
///     id_instance: "1101000001".into(),
///     api_token_instance: "token".into(),
///     method: "sendMessage".into(),
///     send_message_chat_id: "+7 999 123-45-67".into(),
///     send_message_text: "Hello".into(),
///     ..Default::default()
/// };
/// let request = build_request(&form).unwrap();
/// assert_eq!(
///     serde_json::to_string(&request).unwrap(),
///     r#"{"idInstance":"1101000001","apiTokenInstance":"token","method":"sendMessage","payload":{"chatId":"79991234567@c.us","message":"Hello"}}"#
/// );
/// ```
pub fn build_request(form: &RequestForm) -> Result<CallRequest, PreviewError> {
    let id_instance = form.id_instance.trim();
    let api_token = form.api_token_instance.trim();
    let method = form.method.trim();

    if id_instance.is_empty() || api_token.is_empty() {
        return Err(PreviewError::MissingCredentials);
    }

    let operation: Operation = method
        .parse()
        .map_err(|_| PreviewError::UnknownMethod(method.to_string()))?;

    let fields = match operation {
        Operation::GetSettings | Operation::GetStateInstance => PayloadFields::default(),
        Operation::SendMessage => PayloadFields {
            chat_id: &form.send_message_chat_id,
            text: &form.send_message_text,
            ..Default::default()
        },
        Operation::SendFileByUrl => PayloadFields {
            chat_id: &form.send_file_chat_id,
            file_url: &form.send_file_url,
            ..Default::default()
        },
    };

    let payload = operation
        .build_payload(&fields)
        .map_err(|err| match err {
            GatewayError::InvalidChatId(_) => PreviewError::InvalidChatId(operation),
            _ if operation == Operation::SendFileByUrl => PreviewError::MissingFileFields,
            _ => PreviewError::MissingMessageFields,
        })?;

    Ok(CallRequest {
        id_instance: id_instance.to_string(),
        api_token_instance: api_token.to_string(),
        method: operation.as_str().to_string(),
        payload: Some(payload),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(method: &str) -> RequestForm {
        RequestForm {
            id_instance: " 1101000001 ".into(),
            api_token_instance: " secret ".into(),
            method: method.into(),
            ..Default::default()
        }
    }

    #[test]
    fn get_methods_send_empty_payload() {
        let request = build_request(&form("getSettings")).unwrap();
        assert_eq!(request.id_instance, "1101000001");
        assert_eq!(request.api_token_instance, "secret");
        assert_eq!(request.payload, Some(serde_json::Map::new()));
    }

    #[test]
    fn credentials_checked_first() {
        let mut f = form("noSuchMethod");
        f.api_token_instance = "  ".into();
        assert_eq!(build_request(&f), Err(PreviewError::MissingCredentials));
    }

    #[test]
    fn unknown_method_is_named() {
        let err = build_request(&form("deleteMessage")).unwrap_err();
        assert_eq!(err.to_string(), "unknown method: deleteMessage");
    }

    #[test]
    fn each_send_method_reads_its_own_fields() {
        let mut f = form("sendFileByUrl");
        f.send_message_chat_id = "79990000000".into();
        f.send_message_text = "hi".into();
        assert_eq!(build_request(&f), Err(PreviewError::MissingFileFields));

        f.method = "sendMessage".into();
        f.send_message_text = String::new();
        assert_eq!(build_request(&f), Err(PreviewError::MissingMessageFields));
    }

    #[test]
    fn bad_chat_id_names_the_method() {
        let mut f = form("sendFileByUrl");
        f.send_file_chat_id = "no digits".into();
        f.send_file_url = "https://example.com/x.pdf".into();
        let err = build_request(&f).unwrap_err();
        assert_eq!(err.to_string(), "invalid chatId for sendFileByUrl");
    }
}
