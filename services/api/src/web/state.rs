//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use zodiac_tutor_core::ports::{ChatCompletionService, SpeechToTextService, TextToSpeechService};

/// The shared application state, created once at startup and passed to all
/// handlers. Handlers are stateless transforms; this only carries the config
/// and the three provider ports. No per-request state is retained server-side.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat_adapter: Arc<dyn ChatCompletionService>,
    pub sst_adapter: Arc<dyn SpeechToTextService>,
    pub tts_adapter: Arc<dyn TextToSpeechService>,
}
