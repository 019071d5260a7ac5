//! Thin HTTP plumbing over the session orchestrator.
//!
//! Sessions live in an in-memory map keyed by UUID; each is guarded by
//! its own async mutex so different users' turns run concurrently while
//! one user's turns serialize. Persistence consistency across instances
//! relies on the store's per-record last-writer-wins semantics.

use crate::types::*;
use aura_core::emotion::{EmotionSpace, EmotionVector};
use aura_reasoning::session::{Session, SessionContext};
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

/// A session slot; `None` once the session has been closed.
type SessionSlot = Arc<Mutex<Option<Session>>>;

#[derive(Clone)]
pub struct AppState {
    ctx: Arc<SessionContext>,
    sessions: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
}

impl AppState {
    pub fn new(ctx: Arc<SessionContext>) -> Self {
        Self {
            ctx,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

pub fn router(state: AppState, allowed_origin: Option<&str>) -> Router {
    let cors = match allowed_origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new()
                .allow_origin(value)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                tracing::warn!("invalid allowed_origin {:?}, falling back to permissive", origin);
                CorsLayer::permissive()
            }
        },
        None => CorsLayer::permissive(),
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/end-chat", post(end_chat))
        .route("/api/emotions", post(emotions))
        .route("/api/reset", post(reset))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: AppState, host: &str, port: u16, allowed_origin: Option<&str>) -> anyhow::Result<()> {
    let app = router(state, allowed_origin);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("gateway listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

fn emotions_json(vector: &EmotionVector, space: &EmotionSpace) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = space
        .dimensions
        .iter()
        .zip(vector.values().iter())
        .map(|(name, &value)| (name.clone(), serde_json::json!(value)))
        .collect();
    serde_json::Value::Object(map)
}

/// POST /api/chat — bootstrap-or-reuse a session and drive one turn.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(bad_request("No message provided"));
    }
    let user_id = req.user_id.as_deref().unwrap_or("anonymous").to_string();

    // Reuse the caller's session if it is still alive; otherwise bootstrap.
    let existing = match req.session_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()) {
        Some(id) => state.sessions.read().await.get(&id).cloned().map(|s| (id, s)),
        None => None,
    };
    let (session_id, slot) = match existing {
        Some(found) => found,
        None => {
            let session = Session::open(state.ctx.clone(), &user_id).await.map_err(|e| {
                tracing::error!(error = %e, "failed to open session");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "failed to open session".to_string(),
                    }),
                )
            })?;
            let id = Uuid::new_v4();
            let slot: SessionSlot = Arc::new(Mutex::new(Some(session)));
            state.sessions.write().await.insert(id, slot.clone());
            (id, slot)
        }
    };

    let mut guard = slot.lock().await;
    let session = guard
        .as_mut()
        .ok_or_else(|| bad_request("Session already ended"))?;

    let messages = session.send(message).await.map_err(|e| {
        tracing::error!(error = %e, "turn failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                error: format!("dialogue request failed: {}", e),
            }),
        )
    })?;

    Ok(Json(ChatResponse {
        response: messages.join("\n"),
        emotions: emotions_json(session.emotions(), session.space()),
        messages,
        session_id,
    }))
}

/// POST /api/end-chat — summarize memory, persist emotions, drop session.
async fn end_chat(
    State(state): State<AppState>,
    Json(req): Json<EndChatRequest>,
) -> Result<Json<EndChatResponse>, ApiError> {
    let Some(session_id) = req
        .session_id
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok())
    else {
        return Err(bad_request("Invalid session ID"));
    };
    if req.user_id.as_deref().unwrap_or("").is_empty() {
        return Err(bad_request("User ID is required"));
    }

    let Some(slot) = state.sessions.write().await.remove(&session_id) else {
        return Err(bad_request("Invalid session ID"));
    };
    let Some(session) = slot.lock().await.take() else {
        return Err(bad_request("Session already ended"));
    };

    let close = session.end().await;
    Ok(Json(EndChatResponse {
        success: close.memory_saved && close.emotions_saved,
        message: "Chat ended".to_string(),
        memory_saved: close.memory_saved,
        emotions_saved: close.emotions_saved,
    }))
}

/// POST /api/emotions — read a user's stored emotional state.
async fn emotions(
    State(state): State<AppState>,
    Json(req): Json<UserRequest>,
) -> Result<Json<EmotionsResponse>, ApiError> {
    let Some(user_id) = req.user_id.filter(|u| !u.is_empty()) else {
        return Err(bad_request("User ID is required"));
    };
    let vector = state.ctx.profile.emotions(&user_id).await.map_err(|e| {
        tracing::error!(user_id, error = %e, "failed to read emotions");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: "Failed to retrieve emotional state".to_string(),
            }),
        )
    })?;
    Ok(Json(EmotionsResponse {
        emotions: emotions_json(&vector, state.ctx.profile.space()),
        user_id,
    }))
}

/// POST /api/reset — forget a user's memory and emotional state.
async fn reset(
    State(state): State<AppState>,
    Json(req): Json<UserRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    let Some(user_id) = req.user_id.filter(|u| !u.is_empty()) else {
        return Err(bad_request("User ID is required"));
    };
    match state.ctx.profile.reset(&user_id).await {
        Ok(()) => Ok(Json(ResetResponse {
            success: true,
            message: "User data reset successfully".to_string(),
            user_id,
        })),
        Err(e) => {
            tracing::error!(user_id, error = %e, "reset failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Failed to reset user data".to_string(),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::prompt::PromptSet;
    use aura_memory::profile::{ProfileDefaults, ProfileStore};
    use aura_memory::store::InMemoryStore;
    use aura_reasoning::providers::MockClient;
    use aura_reasoning::session::SessionConfig;
    use aura_reasoning::tools::ToolRegistry;

    struct Harness {
        dialogue: Arc<MockClient>,
        scorer: Arc<MockClient>,
        summarizer: Arc<MockClient>,
        state: AppState,
    }

    fn harness() -> Harness {
        let dialogue = Arc::new(MockClient::new());
        let scorer = Arc::new(MockClient::new());
        let summarizer = Arc::new(MockClient::new());
        let profile = Arc::new(ProfileStore::new(
            Arc::new(InMemoryStore::new()),
            EmotionSpace::bipolar(),
            ProfileDefaults {
                first_contact_stub: "EMPTY. First meeting.".to_string(),
                sensitivity: 50,
            },
        ));
        let ctx = Arc::new(SessionContext {
            dialogue: dialogue.clone(),
            scorer: scorer.clone(),
            summarizer: summarizer.clone(),
            profile,
            tools: Arc::new(ToolRegistry::new()),
            prompts: PromptSet::default(),
            config: SessionConfig::default(),
        });
        Harness {
            dialogue,
            scorer,
            summarizer,
            state: AppState::new(ctx),
        }
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let h = harness();
        let err = chat(
            State(h.state.clone()),
            Json(ChatRequest {
                message: "   ".to_string(),
                session_id: None,
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_end_chat_flow() {
        let h = harness();
        h.scorer.push_text("20,-5,0,10");
        h.dialogue.push_text("hey there!");
        h.summarizer.push_text("Their name is Sam.");

        let resp = chat(
            State(h.state.clone()),
            Json(ChatRequest {
                message: "hi, I'm Sam".to_string(),
                session_id: None,
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.0.response, "hey there!");
        assert_eq!(resp.0.emotions["Sadness_Joy"], 20);
        let session_id = resp.0.session_id;

        let end = end_chat(
            State(h.state.clone()),
            Json(EndChatRequest {
                session_id: Some(session_id.to_string()),
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .unwrap();
        assert!(end.0.success);
        assert!(end.0.memory_saved);

        // Session is gone: a second end-chat is a client error.
        let err = end_chat(
            State(h.state.clone()),
            Json(EndChatRequest {
                session_id: Some(session_id.to_string()),
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        // The stored state reflects the finished conversation.
        let read = emotions(
            State(h.state.clone()),
            Json(UserRequest {
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(read.0.emotions["Sadness_Joy"], 20);
    }

    #[tokio::test]
    async fn test_chat_reuses_session() {
        let h = harness();
        h.scorer.push_text("0,0,0,0");
        h.scorer.push_text("0,0,0,0");
        h.dialogue.push_text("first reply");
        h.dialogue.push_text("second reply");

        let first = chat(
            State(h.state.clone()),
            Json(ChatRequest {
                message: "one".to_string(),
                session_id: None,
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .unwrap();

        let second = chat(
            State(h.state.clone()),
            Json(ChatRequest {
                message: "two".to_string(),
                session_id: Some(first.0.session_id.to_string()),
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(second.0.session_id, first.0.session_id);
        assert_eq!(second.0.response, "second reply");
        assert_eq!(h.state.sessions.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_turn_failure_maps_to_bad_gateway() {
        let h = harness();
        h.scorer.push_text("0,0,0,0");
        h.dialogue.push_error("upstream exploded");

        let err = chat(
            State(h.state.clone()),
            Json(ChatRequest {
                message: "hi".to_string(),
                session_id: None,
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_reset_clears_user_data() {
        let h = harness();
        h.state
            .ctx
            .profile
            .set_user_memory("u1", "facts about sam")
            .await
            .unwrap();

        let resp = reset(
            State(h.state.clone()),
            Json(UserRequest {
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .unwrap();
        assert!(resp.0.success);
        assert_eq!(
            h.state.ctx.profile.user_memory("u1").await.unwrap(),
            "EMPTY. First meeting."
        );
    }

    #[tokio::test]
    async fn test_emotions_requires_user_id() {
        let h = harness();
        let err = emotions(State(h.state.clone()), Json(UserRequest { user_id: None }))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}
