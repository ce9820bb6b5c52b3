//! crates/zodiac_tutor_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry the wire names the browser client already speaks
//! (camelCase), but are otherwise independent of any transport.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::zodiac::ZodiacSign;

/// The aspect of life a reading focuses on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Love,
    Money,
    WorkStudy,
}

impl Topic {
    /// The label used inside prompt text, matching the wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Love => "love",
            Topic::Money => "money",
            Topic::WorkStudy => "work-study",
        }
    }
}

/// A short bilingual phrase the learner can reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsefulPhrase {
    pub en: String,
    pub ja: String,
}

/// The generated horoscope result bundle: text, translation, lucky
/// attributes, and learning aids. Produced once per generation request and
/// superseded wholesale by the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub title: String,
    pub english: String,
    pub japanese: String,
    pub lucky_color: String,
    pub lucky_number: i64,
    pub points: Vec<String>,
    pub useful_phrases: Vec<UsefulPhrase>,
    pub practice_prompts: Vec<String>,
    pub sign: ZodiacSign,
}

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in the session transcript. Never mutated after creation;
/// the transcript is reset whenever a new reading is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub en: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ja: Option<String>,
}

impl ChatMessage {
    pub fn user(en: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            en: en.into(),
            ja: None,
        }
    }

    pub fn assistant(en: impl Into<String>, ja: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            en: en.into(),
            ja,
        }
    }
}
