// SPDX-License-Identifier: MIT

//! Krishi Sathi: marketplace and AI advisory backend for farmers and buyers.
//!
//! This crate provides the backend API for user accounts, crop listings,
//! profile analytics, a Gemini-backed agricultural assistant, and
//! ElevenLabs text-to-speech.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{GeminiService, SpeechService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub gemini: GeminiService,
    pub speech: SpeechService,
}
