// SPDX-License-Identifier: MIT

//! ElevenLabs text-to-speech client.
//!
//! The synthesis key is optional at construction; every operation checks
//! `is_configured` first and fails with a typed error so handlers can
//! return 503 with a stable code. The key is sent in the `xi-api-key`
//! header and never logged.

use crate::error::AppError;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Default multilingual voice.
const VOICE_ID: &str = "pNInz6obpgDQGcFmaJgB";
const MODEL_ID: &str = "eleven_multilingual_v2";

/// Synthesis input cap; longer text is truncated with an ellipsis.
const MAX_TEXT_LENGTH: usize = 500;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// ElevenLabs API client.
#[derive(Clone)]
pub struct SpeechService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SpeechService {
    pub fn new(api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: ELEVENLABS_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Whether a synthesis key was provided at startup.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Synthesize `text` into a complete MP3 buffer.
    pub async fn text_to_speech(&self, text: &str) -> Result<Bytes, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::SpeechNotConfigured)?;

        let url = format!("{}/text-to-speech/{}", self.base_url, VOICE_ID);

        let response = self
            .http
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", api_key)
            .json(&SynthesisRequest::new(truncate_text(text)))
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        let response = check_status(response)?;

        response
            .bytes()
            .await
            .map_err(|e| AppError::SpeechUnavailable(format!("Failed to read audio body: {}", e)))
    }

    /// Synthesize `text` as a byte stream for incremental playback.
    pub async fn stream_text_to_speech(
        &self,
        text: &str,
    ) -> Result<BoxStream<'static, Result<Bytes, reqwest::Error>>, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::SpeechNotConfigured)?;

        let url = format!("{}/text-to-speech/{}/stream", self.base_url, VOICE_ID);

        let response = self
            .http
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", api_key)
            .json(&SynthesisRequest::new(truncate_text(text)))
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        let response = check_status(response)?;

        Ok(response.bytes_stream().boxed())
    }
}

/// Map upstream HTTP status codes to typed synthesis errors.
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    match response.status() {
        s if s.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(AppError::SpeechAuth),
        StatusCode::TOO_MANY_REQUESTS => Err(AppError::SpeechRateLimited),
        StatusCode::PAYMENT_REQUIRED => Err(AppError::SpeechQuota),
        s => Err(AppError::SpeechUnavailable(format!(
            "Upstream returned HTTP {}",
            s
        ))),
    }
}

fn map_transport_error(err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::SpeechUnavailable("Request timed out".to_string())
    } else {
        AppError::SpeechUnavailable(format!("Request failed: {}", err))
    }
}

/// Truncate synthesis input to the provider limit, on a char boundary.
fn truncate_text(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT_LENGTH {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_TEXT_LENGTH).collect();
    out.push_str("...");
    out
}

#[derive(Serialize)]
struct SynthesisRequest {
    text: String,
    model_id: &'static str,
    voice_settings: VoiceSettings,
}

impl SynthesisRequest {
    fn new(text: String) -> Self {
        Self {
            text,
            model_id: MODEL_ID,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
                style: 0.0,
                use_speaker_boost: true,
            },
        }
    }
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_text("hello"), "hello");
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "a".repeat(600);
        let truncated = truncate_text(&long);
        assert_eq!(truncated.chars().count(), MAX_TEXT_LENGTH + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_multibyte_text() {
        // Devanagari chars are multi-byte; truncation must not split one.
        let long = "क".repeat(600);
        let truncated = truncate_text(&long);
        assert_eq!(truncated.chars().count(), MAX_TEXT_LENGTH + 3);
    }

    #[tokio::test]
    async fn test_unconfigured_service_fails_fast() {
        let service = SpeechService::new(None);
        assert!(!service.is_configured());

        let err = service.text_to_speech("hello").await.unwrap_err();
        assert!(matches!(err, AppError::SpeechNotConfigured));

        let err = service.stream_text_to_speech("hello").await.err().unwrap();
        assert!(matches!(err, AppError::SpeechNotConfigured));
    }
}
