//! services/api/src/adapters/sst.rs
//!
//! This module contains the adapter for OpenAI's Speech-to-Text (Whisper) service.
//! It implements the `SpeechToTextService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{AudioInput, CreateTranscriptionRequest},
    Client,
};
use async_trait::async_trait;
use zodiac_tutor_core::ports::{PortError, PortResult, SpeechToTextService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SpeechToTextService` port using the OpenAI Whisper API.
#[derive(Clone)]
pub struct OpenAiSstAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSstAdapter {
    /// Creates a new `OpenAiSstAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `SpeechToTextService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeechToTextService for OpenAiSstAdapter {
    /// Transcribes uploaded audio into text using the configured Whisper model.
    /// The upload is forwarded verbatim; the browser already records a
    /// container Whisper accepts (webm), so no re-encoding happens here.
    async fn transcribe_audio(
        &self,
        audio_data: Vec<u8>,
        filename: &str,
        language: &str,
    ) -> PortResult<String> {
        let input = AudioInput::from_vec_u8(filename.to_string(), audio_data);

        let request = CreateTranscriptionRequest {
            file: input,
            model: self.model.clone(),
            language: Some(language.to_string()),
            temperature: Some(0.2),
            ..Default::default()
        };

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .audio()
            .transcription()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        Ok(response.text)
    }
}
