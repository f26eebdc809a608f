use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation
// =============================================================================

/// Who authored a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person typing or speaking into the page.
    User,
    /// The language model. Older clients label these turns `bot`.
    #[serde(alias = "bot")]
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message exchanged in the conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// =============================================================================
// POST /chat wire format
// =============================================================================

/// Request body for `POST /chat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The new user message.
    pub text: String,
    /// Prior turns, oldest first. Does not include `text`.
    #[serde(default)]
    pub history: Vec<Turn>,
}

/// Success body for `POST /chat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Failure body returned with any non-2xx status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short error label, e.g. "API Error".
    pub error: String,
    /// Optional human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Single-line description suitable for a notification payload.
    pub fn describe(&self) -> String {
        match &self.message {
            Some(message) if !message.is_empty() => format!("{}: {}", self.error, message),
            _ => self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_role_accepts_bot_alias() {
        let role: Role = serde_json::from_str("\"bot\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn test_role_rejects_unknown() {
        let role: Result<Role, _> = serde_json::from_str("\"unknown\"");
        assert!(role.is_err());
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let req = ChatRequest {
            text: "Hello".to_string(),
            history: vec![Turn::user("Hi"), Turn::assistant("Hi there")],
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "text": "Hello",
                "history": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hi there"}
                ]
            })
        );
    }

    #[test]
    fn test_chat_request_history_defaults_to_empty() {
        let req: ChatRequest = serde_json::from_str(r#"{"text":"Hello"}"#).unwrap();
        assert!(req.history.is_empty());
    }

    #[test]
    fn test_error_body_without_message_omits_field() {
        let body = ErrorBody::new("Internal Server Error");
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"Internal Server Error"}"#);
    }

    #[test]
    fn test_error_body_describe() {
        assert_eq!(ErrorBody::new("API Error").describe(), "API Error");
        assert_eq!(
            ErrorBody::new("API Error")
                .with_message("rate limited")
                .describe(),
            "API Error: rate limited"
        );
        assert_eq!(
            ErrorBody::new("API Error").with_message("").describe(),
            "API Error"
        );
    }
}
