// SPDX-License-Identifier: MIT

//! Krishi Sathi API Server
//!
//! Marketplace and AI advisory backend for farmers and buyers: crop
//! listings, extended profiles, a Gemini-backed chat assistant, and
//! ElevenLabs text-to-speech.

use krishi_sathi_api::{
    config::Config,
    db::FirestoreDb,
    services::{GeminiService, SpeechService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment. Refuses to start without a
    // JWT signing secret.
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Krishi Sathi API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Provider clients are constructed here and passed by reference through
    // AppState; no module-level singletons.
    let gemini = GeminiService::new(config.gemini_api_key.clone(), config.gemini_model.clone());
    let speech = SpeechService::new(config.elevenlabs_api_key.clone());
    if !speech.is_configured() {
        tracing::warn!("ELEVENLABS_API_KEY not set, text-to-speech will return 503");
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        gemini,
        speech,
    });

    let app = krishi_sathi_api::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("krishi_sathi_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
