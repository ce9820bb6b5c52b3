//! crates/zodiac_tutor_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete LLM provider behind the API.

use async_trait::async_trait;

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services
/// (network, auth, quota, malformed HTTP from the provider).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    /// Runs one system+user exchange and returns the raw completion text.
    /// No parsing happens here; interpretation is the caller's concern.
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> PortResult<String>;
}

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes recorded audio into text. `language` is a hint
    /// (`"en"` or `"ja"`), `filename` preserves the upload's container
    /// extension for the provider.
    async fn transcribe_audio(
        &self,
        audio_data: Vec<u8>,
        filename: &str,
        language: &str,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Generates audio data from a string of text.
    async fn generate_audio(&self, text: &str) -> PortResult<Vec<u8>>;
}
