//! Chat identifier normalization.
//!
//! GREEN-API addresses a chat as `<digits>@c.us` for private chats and
//! `<id>@g.us` for groups. Form users usually type a phone number with
//! spaces, dashes or a leading `+`, so anything without an `@` is reduced to
//! its digits and qualified with the private-chat domain.

use crate::gateway::error::GatewayError;

/// Domain appended to bare phone numbers.
pub const PRIVATE_CHAT_SUFFIX: &str = "@c.us";

/// Normalize a user-supplied chat identifier.
///
/// ```rust
/// use greenapi_gateway::gateway::chat_id::normalize;
///
/// assert_eq!(normalize("+7 (999) 123-45-67").unwrap(), "79991234567@c.us");
/// assert_eq!(normalize("120363043968066561@g.us").unwrap(), "120363043968066561@g.us");
/// assert!(normalize("abc").is_err());
/// ```
pub fn normalize(raw: &str) -> Result<String, GatewayError> {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        return Ok(trimmed.to_string());
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(GatewayError::InvalidChatId(trimmed.to_string()));
    }

    Ok(digits + PRIVATE_CHAT_SUFFIX)
}
