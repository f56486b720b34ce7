// SPDX-License-Identifier: MIT

//! AI assistant endpoints: chat threads, advisory prompts, and speech.
//!
//! Conversations are stored whole; only the most recent turns are sent
//! upstream as context. A conversation id belonging to another user is
//! treated as absent and a fresh thread is started, so callers cannot
//! append to or read someone else's thread.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ChatHistory, ChatMessage, ChatMetadata, MessageRole};
use crate::services::ChatTurn;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Stored turns sent upstream as context, not counting the new message.
const CHAT_CONTEXT_WINDOW: usize = 10;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

const PREVIEW_CHARS: usize = 60;
const LAST_MESSAGE_CHARS: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/chat", post(send_message))
        .route("/api/v1/chat/crop-advice", post(crop_advice))
        .route("/api/v1/chat/analyze-pest", post(analyze_pest))
        .route("/api/v1/chat/weather-advice", post(weather_advice))
        .route("/api/v1/chat/text-to-speech", post(text_to_speech))
        .route("/api/v1/chat/stream-speech", post(stream_speech))
        .route("/api/v1/chat/conversations", get(list_conversations))
        .route(
            "/api/v1/chat/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: Option<String>,
    conversation_id: Option<String>,
    language: Option<String>,
    crop_context: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CropAdviceRequest {
    crop_type: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PestRequest {
    description: Option<String>,
    crop_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherRequest {
    condition: Option<String>,
    crop_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpeechRequest {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

/// POST /api/v1/chat
async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>> {
    let message = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Message is required".to_string()))?
        .to_string();

    // Resolve the thread: a missing or foreign id starts a new one.
    let existing = match &payload.conversation_id {
        Some(id) => state
            .db
            .get_conversation(id)
            .await?
            .filter(|c| c.user_id == auth.user_id),
        None => None,
    };

    let mut conversation = existing.unwrap_or_else(|| {
        let now = now_rfc3339();
        ChatHistory {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: auth.user_id.clone(),
            messages: Vec::new(),
            language: payload.language.clone().unwrap_or_else(|| "en".to_string()),
            metadata: None,
            created_at: now.clone(),
            updated_at: now,
        }
    });

    if let Some(language) = &payload.language {
        conversation.language = language.clone();
    }
    if payload.crop_context.is_some() || payload.location.is_some() {
        let metadata = conversation.metadata.get_or_insert_with(ChatMetadata::default);
        if payload.crop_context.is_some() {
            metadata.crop_context = payload.crop_context.clone();
        }
        if payload.location.is_some() {
            metadata.location = payload.location.clone();
        }
    }

    let turns = build_context(&conversation.messages, &message);
    let reply = state.gemini.chat(&turns).await?;

    conversation.messages.push(ChatMessage {
        role: MessageRole::User,
        content: message,
        timestamp: now_rfc3339(),
        audio_url: None,
    });
    conversation.messages.push(ChatMessage {
        role: MessageRole::Model,
        content: reply.clone(),
        timestamp: now_rfc3339(),
        audio_url: None,
    });
    conversation.updated_at = now_rfc3339();

    state.db.upsert_conversation(&conversation).await?;

    Ok(Json(json!({
        "success": true,
        "response": reply,
        "conversation_id": conversation.id,
    })))
}

/// POST /api/v1/chat/crop-advice
async fn crop_advice(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CropAdviceRequest>,
) -> Result<Json<serde_json::Value>> {
    let crop_type = required(payload.crop_type.as_deref(), "Crop type is required")?;
    let language = payload.language.as_deref().unwrap_or("en");

    let advice = state.gemini.get_crop_advice(&crop_type, language).await?;

    Ok(Json(json!({
        "success": true,
        "advice": advice,
    })))
}

/// POST /api/v1/chat/analyze-pest
async fn analyze_pest(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PestRequest>,
) -> Result<Json<serde_json::Value>> {
    let description = required(payload.description.as_deref(), "Description is required")?;

    let analysis = state
        .gemini
        .analyze_pest_issue(&description, payload.crop_type.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "analysis": analysis,
    })))
}

/// POST /api/v1/chat/weather-advice
async fn weather_advice(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WeatherRequest>,
) -> Result<Json<serde_json::Value>> {
    let condition = required(payload.condition.as_deref(), "Weather condition is required")?;

    let advice = state
        .gemini
        .get_weather_advice(&condition, payload.crop_type.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "advice": advice,
    })))
}

/// POST /api/v1/chat/text-to-speech
///
/// Returns the full MP3 in one response.
async fn text_to_speech(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SpeechRequest>,
) -> Result<Response> {
    let text = required(payload.text.as_deref(), "Text is required")?;

    let audio = state.speech.text_to_speech(&text).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (header::CONTENT_LENGTH, audio.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                "inline; filename=\"speech.mp3\"".to_string(),
            ),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        audio,
    )
        .into_response())
}

/// POST /api/v1/chat/stream-speech
///
/// Streams audio bytes as they arrive from the provider.
async fn stream_speech(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SpeechRequest>,
) -> Result<Response> {
    let text = required(payload.text.as_deref(), "Text is required")?;

    let stream = state.speech.stream_text_to_speech(&text).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// GET /api/v1/chat/conversations
///
/// Paginated summaries, most recently updated first.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<serde_json::Value>> {
    let conversations = state.db.query_conversations(&auth.user_id).await?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);

    let total = conversations.len();
    let pages = total.div_ceil(limit);

    let summaries: Vec<_> = conversations
        .iter()
        .skip((page - 1) * limit)
        .take(limit)
        .map(|c| {
            json!({
                "id": c.id,
                "preview": c.messages.first().map(|m| truncate_chars(&m.content, PREVIEW_CHARS)),
                "last_message": c.messages.last().map(|m| truncate_chars(&m.content, LAST_MESSAGE_CHARS)),
                "message_count": c.messages.len(),
                "language": c.language,
                "created_at": c.created_at,
                "updated_at": c.updated_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "conversations": summaries,
        "total": total,
        "page": page,
        "pages": pages,
    })))
}

/// GET /api/v1/chat/conversations/{id}
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(conversation_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conversation = state
        .db
        .get_conversation(&conversation_id)
        .await?
        .filter(|c| c.user_id == auth.user_id)
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "conversation": conversation,
    })))
}

/// DELETE /api/v1/chat/conversations/{id}
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(conversation_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state
        .db
        .delete_conversation_owned(&conversation_id, &auth.user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Conversation deleted",
    })))
}

/// Last [`CHAT_CONTEXT_WINDOW`] stored turns plus the new message.
fn build_context(messages: &[ChatMessage], new_message: &str) -> Vec<ChatTurn> {
    let start = messages.len().saturating_sub(CHAT_CONTEXT_WINDOW);

    let mut turns: Vec<ChatTurn> = messages[start..]
        .iter()
        .map(|m| ChatTurn {
            role: m.role,
            text: m.content.clone(),
        })
        .collect();

    turns.push(ChatTurn::user(new_message));
    turns
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

fn required(value: Option<&str>, message: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(i: usize, role: MessageRole) -> ChatMessage {
        ChatMessage {
            role,
            content: format!("message {}", i),
            timestamp: "2025-01-01T00:00:00Z".to_string(),
            audio_url: None,
        }
    }

    #[test]
    fn test_context_window_caps_history() {
        let messages: Vec<ChatMessage> = (0..12)
            .map(|i| {
                let role = if i % 2 == 0 {
                    MessageRole::User
                } else {
                    MessageRole::Model
                };
                make_message(i, role)
            })
            .collect();

        let turns = build_context(&messages, "new question");

        // 10 stored turns + the new message
        assert_eq!(turns.len(), CHAT_CONTEXT_WINDOW + 1);
        // Oldest two dropped
        assert_eq!(turns[0].text, "message 2");
        assert_eq!(turns.last().unwrap().text, "new question");
        assert_eq!(turns.last().unwrap().role, MessageRole::User);
    }

    #[test]
    fn test_context_window_short_history() {
        let messages = vec![make_message(0, MessageRole::User)];
        let turns = build_context(&messages, "next");

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "message 0");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 60), "short");

        let long = "x".repeat(70);
        let out = truncate_chars(&long, 60);
        assert_eq!(out.chars().count(), 63);
        assert!(out.ends_with("..."));

        // Multi-byte content must not be split mid-char
        let hindi = "न".repeat(70);
        assert_eq!(truncate_chars(&hindi, 60).chars().count(), 63);
    }
}
