//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and held in memory. The JWT signing
//! secret is required; the process refuses to start without it. Provider
//! API keys are optional: a missing speech key degrades that feature to a
//! 503 response instead of crashing.

use std::env;

/// Default session token lifetime when JWT_EXPIRES_IN is not set.
const DEFAULT_JWT_EXPIRY: &str = "7d";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Gemini model name
    pub gemini_model: String,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes, required)
    pub jwt_secret: Vec<u8>,
    /// Session token lifetime in seconds (default 7 days)
    pub jwt_expiry_secs: i64,
    /// Gemini API key (chat assistant)
    pub gemini_api_key: Option<String>,
    /// ElevenLabs API key (text-to-speech)
    pub elevenlabs_api_key: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            gemini_model: "gemini-1.5-flash".to_string(),
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            jwt_expiry_secs: 7 * 24 * 60 * 60,
            gemini_api_key: None,
            elevenlabs_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let expiry_raw =
            env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| DEFAULT_JWT_EXPIRY.to_string());
        let jwt_expiry_secs = parse_expiry(&expiry_raw)
            .ok_or(ConfigError::Invalid("JWT_EXPIRES_IN"))?;

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
            jwt_expiry_secs,
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            elevenlabs_api_key: env::var("ELEVENLABS_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

/// Parse an expiry string like "7d", "12h", "30m", "45s" or plain seconds.
fn parse_expiry(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (digits, multiplier) = match raw.as_bytes()[raw.len() - 1] {
        b'd' => (&raw[..raw.len() - 1], 24 * 60 * 60),
        b'h' => (&raw[..raw.len() - 1], 60 * 60),
        b'm' => (&raw[..raw.len() - 1], 60),
        b's' => (&raw[..raw.len() - 1], 1),
        _ => (raw, 1),
    };

    let value: i64 = digits.parse().ok()?;
    if value <= 0 {
        return None;
    }
    value.checked_mul(multiplier)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expiry_suffixes() {
        assert_eq!(parse_expiry("7d"), Some(7 * 24 * 60 * 60));
        assert_eq!(parse_expiry("12h"), Some(12 * 60 * 60));
        assert_eq!(parse_expiry("30m"), Some(30 * 60));
        assert_eq!(parse_expiry("45s"), Some(45));
        assert_eq!(parse_expiry("3600"), Some(3600));
    }

    #[test]
    fn test_parse_expiry_rejects_garbage() {
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("7w"), None);
        assert_eq!(parse_expiry("-1d"), None);
        assert_eq!(parse_expiry("abc"), None);
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SECRET", "test_jwt_key_32_bytes_minimum!!!");
        env::remove_var("JWT_EXPIRES_IN");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_expiry_secs, 7 * 24 * 60 * 60);
        assert_eq!(config.gemini_model, "gemini-1.5-flash");
    }
}
