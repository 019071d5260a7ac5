//! Request/response DTOs for the gateway API.
//!
//! Field names are camelCase on the wire for the benefit of web clients.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// The full reply, chunks joined with newlines.
    pub response: String,
    /// The reply split into short message chunks for paced delivery.
    pub messages: Vec<String>,
    /// Current emotional state as a dimension → value map.
    pub emotions: serde_json::Value,
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndChatResponse {
    pub success: bool,
    pub message: String,
    pub memory_saved: bool,
    pub emotions_saved: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionsResponse {
    pub emotions: serde_json::Value,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_camel_case() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"message": "hi", "sessionId": "abc", "userId": "u1"}"#,
        )
        .unwrap();
        assert_eq!(req.message, "hi");
        assert_eq!(req.session_id.as_deref(), Some("abc"));
        assert_eq!(req.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_chat_response_serializes_session_id() {
        let resp = ChatResponse {
            response: "hey".to_string(),
            messages: vec!["hey".to_string()],
            emotions: serde_json::json!({ "Sadness_Joy": 10 }),
            session_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["sessionId"], Uuid::nil().to_string());
        assert_eq!(json["emotions"]["Sadness_Joy"], 10);
    }
}
