// SPDX-License-Identifier: MIT

//! Services module - external providers and aggregation logic.

pub mod analytics;
pub mod gemini;
pub mod speech;

pub use gemini::{ChatTurn, GeminiService};
pub use speech::SpeechService;
