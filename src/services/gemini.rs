// SPDX-License-Identifier: MIT

//! Gemini chat-completion client for the agricultural assistant.
//!
//! The service is constructed with its API key and model name and holds
//! a fixed system persona that is sent ahead of every conversation.
//! Upstream failures collapse to a single generic chat error; only the
//! status is logged, never the key or headers.

use crate::error::AppError;
use crate::models::MessageRole;
use serde::{Deserialize, Serialize};

/// Fixed system persona for the assistant.
const SYSTEM_PERSONA: &str = "You are Sathi, an expert agricultural AI assistant for Indian farmers.\n\
\n\
Core responsibilities:\n\
- Provide farming advice in simple, clear Hindi and English\n\
- Help with crop cultivation techniques for Indian conditions\n\
- Advise on pest and disease management\n\
- Suggest irrigation and fertilization best practices\n\
- Provide information about crop prices and markets\n\
- Answer weather-related farming questions\n\
- Give seasonal planting advice\n\
\n\
Communication style:\n\
- Use simple language that farmers can understand\n\
- Provide practical, actionable advice\n\
- Be respectful and patient\n\
- Support both Hindi and English languages\n\
- Keep responses concise (2-3 paragraphs max)\n\
\n\
You are part of the Krishi Sathi platform that connects farmers with \
buyers and provides AI-powered farming assistance across India. \
Remember: you're helping real farmers improve their livelihoods. Be \
accurate, helpful, and empathetic.";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One turn of conversation context sent to the model.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }
}

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiService {
    /// Create a new Gemini client.
    ///
    /// A missing API key is tolerated at construction; calls fail with a
    /// chat service error instead of crashing the process.
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            model,
        }
    }

    /// Send a conversation to the model and return the generated text.
    ///
    /// `turns` is ordered oldest-first; the final turn is the new prompt,
    /// everything before it is context. The system persona is always
    /// prepended by the provider-side system instruction.
    pub async fn chat(&self, turns: &[ChatTurn]) -> Result<String, AppError> {
        if turns.is_empty() {
            return Err(AppError::BadRequest("Message is required".to_string()));
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ChatApi("API key not configured".to_string()))?;

        let body = GenerateContentRequest {
            system_instruction: ContentBlock {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_PERSONA.to_string(),
                }],
            },
            contents: turns
                .iter()
                .map(|turn| ContentBlock {
                    role: Some(turn.role.as_str().to_string()),
                    parts: vec![Part {
                        text: turn.text.clone(),
                    }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 1024,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ChatApi(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            // Status only; the response body may echo request details.
            return Err(AppError::ChatApi(format!(
                "Upstream returned HTTP {}",
                response.status()
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::ChatApi(format!("JSON parse error: {}", e)))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::ChatApi("Empty model response".to_string()))
    }

    /// Cultivation tips for a crop, worded per language.
    pub async fn get_crop_advice(
        &self,
        crop_type: &str,
        language: &str,
    ) -> Result<String, AppError> {
        let prompt = if language == "hi" {
            format!(
                "{} की खेती के लिए 5 महत्वपूर्ण सुझाव दें। मिट्टी, पानी, और कीटों की जानकारी शामिल करें।",
                crop_type
            )
        } else {
            format!(
                "Provide 5 key cultivation tips for growing {} in India. \
                 Include soil requirements, watering schedule, and common pests.",
                crop_type
            )
        };

        self.chat(&[ChatTurn::user(prompt)]).await
    }

    /// Structured pest analysis: diagnosis, immediate steps, treatment,
    /// prevention.
    pub async fn analyze_pest_issue(
        &self,
        description: &str,
        crop_type: Option<&str>,
    ) -> Result<String, AppError> {
        let crop_clause = crop_type
            .map(|c| format!(" on their {} crop", c))
            .unwrap_or_default();

        let prompt = format!(
            "A farmer reports: \"{}\"{}.\n\n\
             Please provide:\n\
             1. Possible diagnosis\n\
             2. Immediate action steps\n\
             3. Treatment recommendations\n\
             4. Prevention tips",
            description, crop_clause
        );

        self.chat(&[ChatTurn::user(prompt)]).await
    }

    /// Advice on farming activities for the given weather.
    pub async fn get_weather_advice(
        &self,
        weather: &str,
        crop_type: Option<&str>,
    ) -> Result<String, AppError> {
        let crop_clause = crop_type
            .map(|c| format!(" for {} crop", c))
            .unwrap_or_default();

        let prompt = format!(
            "Weather condition: {}{}. What farming activities should be done or avoided?",
            weather, crop_clause
        );

        self.chat(&[ChatTurn::user(prompt)]).await
    }
}

// ─── Wire types ──────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: ContentBlock,
    contents: Vec<ContentBlock>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct ContentBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chat_without_key_fails_before_network() {
        let service = GeminiService::new(None, "gemini-1.5-flash".to_string());
        let err = service
            .chat(&[ChatTurn::user("hello")])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ChatApi(_)));
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_history() {
        let service = GeminiService::new(Some("key".to_string()), "gemini-1.5-flash".to_string());
        let err = service.chat(&[]).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
