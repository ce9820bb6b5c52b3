//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the four REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Every handler is a stateless request/response transform: validate input,
//! call the relevant provider port, shape the response. Failures are isolated
//! per call; nothing here shares mutable state.

use crate::web::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use zodiac_tutor_core::{
    build_follow_up_prompt, build_reading_prompt, interpret_reading,
    ports::{ChatCompletionService, PortResult},
    InterpretedReading, Topic, UsefulPhrase, ZodiacSign,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        horoscope_handler,
        chat_handler,
        transcribe_handler,
        tts_handler,
    ),
    components(
        schemas(
            HoroscopeRequest,
            ReadingResponse,
            PhraseDto,
            ChatRequest,
            ChatResponse,
            TranscriptionResponse,
            TtsRequest,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Zodiac Tutor API", description = "API endpoints for the English-learning horoscope tutor.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Payload Structs
//=========================================================================================

/// The profile submitted to generate a reading.
#[derive(Deserialize, ToSchema)]
pub struct HoroscopeRequest {
    pub name: String,
    /// RFC 3339 timestamp or bare `YYYY-MM-DD`.
    #[serde(rename = "birthISO")]
    pub birth_iso: String,
    /// One of `love`, `money`, `work-study`.
    #[schema(value_type = String)]
    pub topic: Topic,
}

#[derive(Serialize, ToSchema)]
pub struct PhraseDto {
    pub en: String,
    pub ja: String,
}

impl From<UsefulPhrase> for PhraseDto {
    fn from(p: UsefulPhrase) -> Self {
        Self { en: p.en, ja: p.ja }
    }
}

/// A fully-populated reading. Always complete: malformed model output is
/// absorbed field-by-field by the interpreter, and `usedFallback` reports
/// whether that happened.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingResponse {
    pub title: String,
    pub sign: String,
    pub english: String,
    pub japanese: String,
    pub lucky_color: String,
    pub lucky_number: i64,
    pub points: Vec<String>,
    pub useful_phrases: Vec<PhraseDto>,
    pub practice_prompts: Vec<String>,
    pub used_fallback: bool,
}

impl From<InterpretedReading> for ReadingResponse {
    fn from(interpreted: InterpretedReading) -> Self {
        let r = interpreted.reading;
        Self {
            title: r.title,
            sign: r.sign.as_str().to_string(),
            english: r.english,
            japanese: r.japanese,
            lucky_color: r.lucky_color,
            lucky_number: r.lucky_number,
            points: r.points,
            useful_phrases: r.useful_phrases.into_iter().map(PhraseDto::from).collect(),
            practice_prompts: r.practice_prompts,
            used_fallback: interpreted.used_fallback,
        }
    }
}

/// A follow-up question with the prior reading as context.
#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The previously generated reading (or any context object).
    #[schema(value_type = Object)]
    pub history: Value,
    pub question: String,
}

/// The raw combined English+Japanese answer. No structural validation is
/// attempted here; segmentation is the caller's concern.
#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub content: String,
}

#[derive(Serialize, ToSchema)]
pub struct TranscriptionResponse {
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TtsRequest {
    pub text: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

type JsonFailure = (StatusCode, Json<ErrorResponse>);

fn server_fault(message: impl Into<String>) -> JsonFailure {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn client_fault(message: impl Into<String>) -> JsonFailure {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

//=========================================================================================
// Pipelines (handler bodies without the transport, so they can be unit tested)
//=========================================================================================

/// Resolver → prompt builder → LLM → interpreter. An `Err` here means the
/// external call itself failed; malformed-but-received text never errors.
pub async fn run_reading_pipeline(
    llm: &dyn ChatCompletionService,
    name: &str,
    birth_iso: &str,
    topic: Topic,
) -> PortResult<InterpretedReading> {
    let sign = ZodiacSign::from_iso(birth_iso);
    let prompt = build_reading_prompt(name, sign, topic);
    let raw = llm.complete(&prompt.system, &prompt.user, 0.7).await?;
    Ok(interpret_reading(&raw, sign))
}

/// Prompt builder (with the history character budget) → LLM. Returns the
/// raw combined English+Japanese text.
pub async fn run_chat_pipeline(
    llm: &dyn ChatCompletionService,
    history: &Value,
    question: &str,
) -> PortResult<String> {
    let prompt = build_follow_up_prompt(history, question);
    llm.complete(&prompt.system, &prompt.user, 0.6).await
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate a horoscope reading for a learner profile.
#[utoipa::path(
    post,
    path = "/api/horoscope",
    request_body = HoroscopeRequest,
    responses(
        (status = 200, description = "Reading generated", body = ReadingResponse),
        (status = 500, description = "The LLM call failed", body = ErrorResponse)
    )
)]
pub async fn horoscope_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<HoroscopeRequest>,
) -> Result<Json<ReadingResponse>, JsonFailure> {
    match run_reading_pipeline(
        app_state.chat_adapter.as_ref(),
        &payload.name,
        &payload.birth_iso,
        payload.topic,
    )
    .await
    {
        Ok(interpreted) => {
            if interpreted.used_fallback {
                info!(
                    fields = ?interpreted.defaulted_fields,
                    "reading fields defaulted by the interpreter"
                );
            }
            Ok(Json(ReadingResponse::from(interpreted)))
        }
        Err(e) => {
            error!("Failed to generate reading: {e}");
            Err(server_fault(e.to_string()))
        }
    }
}

/// Answer a follow-up question about a previous reading.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Raw combined English+Japanese answer", body = ChatResponse),
        (status = 500, description = "The LLM call failed", body = ErrorResponse)
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, JsonFailure> {
    match run_chat_pipeline(
        app_state.chat_adapter.as_ref(),
        &payload.history,
        &payload.question,
    )
    .await
    {
        Ok(content) => Ok(Json(ChatResponse { content })),
        Err(e) => {
            error!("Failed to answer follow-up: {e}");
            Err(server_fault(e.to_string()))
        }
    }
}

/// Transcribe recorded speech to text.
///
/// Accepts a multipart/form-data request with a `file` part (the audio blob)
/// and an optional `lang` part (`en` or `ja`, default `en`).
#[utoipa::path(
    post,
    path = "/api/transcribe",
    request_body(content_type = "multipart/form-data", description = "file: audio blob, lang: en|ja"),
    responses(
        (status = 200, description = "Transcribed text", body = TranscriptionResponse),
        (status = 400, description = "No audio file supplied", body = ErrorResponse),
        (status = 500, description = "The transcription call failed", body = ErrorResponse)
    )
)]
pub async fn transcribe_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptionResponse>, JsonFailure> {
    let mut audio: Option<(String, Vec<u8>)> = None;
    let mut lang = "en".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| client_fault(format!("Failed to read multipart data: {e}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("speech.webm").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| client_fault(format!("Failed to read file bytes: {e}")))?;
                audio = Some((filename, data.to_vec()));
            }
            Some("lang") => {
                if let Ok(value) = field.text().await {
                    if !value.trim().is_empty() {
                        lang = value.trim().to_string();
                    }
                }
            }
            _ => {}
        }
    }

    let (filename, data) = audio.ok_or_else(|| client_fault("no file"))?;

    match app_state
        .sst_adapter
        .transcribe_audio(data, &filename, &lang)
        .await
    {
        Ok(text) => Ok(Json(TranscriptionResponse { text })),
        Err(e) => {
            error!("Failed to transcribe audio: {e}");
            Err(server_fault(e.to_string()))
        }
    }
}

/// Synthesize speech for the given text and return raw mp3 bytes.
#[utoipa::path(
    post,
    path = "/api/tts",
    request_body = TtsRequest,
    responses(
        (status = 200, description = "Raw audio bytes", body = Vec<u8>, content_type = "audio/mpeg"),
        (status = 400, description = "Empty text"),
        (status = 500, description = "The synthesis call failed")
    )
)]
pub async fn tts_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<TtsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "no text".to_string()));
    }

    match app_state.tts_adapter.generate_audio(&payload.text).await {
        Ok(bytes) => Ok((
            [
                (CONTENT_TYPE, "audio/mpeg"),
                (CACHE_CONTROL, "no-store"),
            ],
            bytes,
        )),
        Err(e) => {
            error!("Failed to synthesize speech: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use zodiac_tutor_core::ports::{PortError, PortResult};
    use zodiac_tutor_core::HISTORY_CHAR_BUDGET;

    /// Echoes a canned completion and records the user prompt it was given.
    struct CannedLlm {
        reply: String,
        seen: std::sync::Mutex<Vec<String>>,
    }

    impl CannedLlm {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatCompletionService for CannedLlm {
        async fn complete(
            &self,
            _system: &str,
            user: &str,
            _temperature: f32,
        ) -> PortResult<String> {
            self.seen.lock().unwrap().push(user.to_string());
            Ok(self.reply.clone())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl ChatCompletionService for FailingLlm {
        async fn complete(&self, _: &str, _: &str, _: f32) -> PortResult<String> {
            Err(PortError::Unexpected("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn reading_pipeline_absorbs_a_prose_wrapped_fragment() {
        let llm = CannedLlm::new("Sure! ```json\n{\"title\":\"Hi\"}\n```");
        let out = run_reading_pipeline(&llm, "Yuki", "1990-01-23", Topic::Love)
            .await
            .unwrap();
        assert_eq!(out.reading.title, "Hi");
        assert_eq!(out.reading.sign, ZodiacSign::Aquarius);
        assert_eq!(out.reading.lucky_color, "blue");
        assert!((1..=99).contains(&out.reading.lucky_number));
        assert!(out.reading.points.is_empty());
        assert!(out.used_fallback);

        // The prompt saw the resolved sign, not the raw date.
        let seen = llm.seen.lock().unwrap();
        assert!(seen[0].contains("Sign: Aquarius"));
        assert!(seen[0].contains("User name: Yuki"));
    }

    #[tokio::test]
    async fn reading_pipeline_propagates_a_failed_call() {
        let err = run_reading_pipeline(&FailingLlm, "Yuki", "1990-01-23", Topic::Money)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn chat_pipeline_returns_raw_text_and_bounds_the_context() {
        let llm = CannedLlm::new("Yes.\nはい。");
        let history = serde_json::json!({"english": "y".repeat(10_000)});
        let content = run_chat_pipeline(&llm, &history, "Is today lucky?")
            .await
            .unwrap();
        assert_eq!(content, "Yes.\nはい。");

        let seen = llm.seen.lock().unwrap();
        let marker = "Context (previous horoscope or info): ";
        let start = seen[0].find(marker).unwrap() + marker.len();
        let end = seen[0].find("\nLearner question:").unwrap();
        assert!(seen[0][start..end].chars().count() <= HISTORY_CHAR_BUDGET);
    }
}
