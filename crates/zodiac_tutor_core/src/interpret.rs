//! crates/zodiac_tutor_core/src/interpret.rs
//!
//! Turns raw LLM output for the reading operation into a validated
//! [`Reading`]. The contract is total: whatever the model sent back, this
//! module produces a fully-populated object and never returns an error.
//! Each field falls back independently, so one bad field cannot poison the
//! rest of an otherwise usable response.

use rand::Rng;
use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::{Reading, UsefulPhrase};
use crate::zodiac::ZodiacSign;

const DEFAULT_LUCKY_COLOR: &str = "blue";

const DEFAULT_ENGLISH: &str =
    "Today brings steady, positive energy. Keep practicing your English one small step at a time.";

const DEFAULT_JAPANESE: &str =
    "今日は穏やかで前向きなエネルギーに包まれています。少しずつ英語の練習を続けましょう。";

/// A validated reading plus diagnostics about how much of it came from
/// fallback defaults rather than the model.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretedReading {
    pub reading: Reading,
    /// True when at least one field was substituted.
    pub used_fallback: bool,
    /// Names of the fields that were defaulted, in schema order.
    pub defaulted_fields: Vec<&'static str>,
}

/// Interprets raw model output for the reading-generation operation.
///
/// Extraction order: strip fence markers and try a direct parse; failing
/// that, try the greedy outer-brace substring of the *original* text;
/// failing that, start from an empty object and let every field default.
/// The resolver-computed `sign` is always attached; model output never
/// overrides it.
pub fn interpret_reading(raw: &str, sign: ZodiacSign) -> InterpretedReading {
    let candidate = extract_candidate(raw);
    build_reading(candidate, sign)
}

/// Pulls the best-effort JSON object out of free-form model text.
fn extract_candidate(raw: &str) -> Map<String, Value> {
    let fences = Regex::new(r"```(?:json)?").unwrap();
    let cleaned = fences.replace_all(raw, "");
    let cleaned = cleaned.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(cleaned) {
        return map;
    }

    // The fenced payload may be buried in prose; take the widest brace span
    // of the original text and try that.
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return map;
            }
        }
    }

    Map::new()
}

fn build_reading(mut candidate: Map<String, Value>, sign: ZodiacSign) -> InterpretedReading {
    let mut defaulted = Vec::new();

    let title = match candidate.remove("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        _ => {
            defaulted.push("title");
            format!("Your {} reading", sign.as_str())
        }
    };

    let english = match candidate.remove("english") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        _ => {
            defaulted.push("english");
            DEFAULT_ENGLISH.to_string()
        }
    };

    let japanese = match candidate.remove("japanese") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        _ => {
            defaulted.push("japanese");
            DEFAULT_JAPANESE.to_string()
        }
    };

    let lucky_color = match candidate.remove("luckyColor") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        _ => {
            defaulted.push("luckyColor");
            DEFAULT_LUCKY_COLOR.to_string()
        }
    };

    let lucky_number = match candidate.remove("luckyNumber").and_then(finite_f64) {
        Some(n) => (n.round() as i64).clamp(1, 99),
        None => {
            defaulted.push("luckyNumber");
            rand::thread_rng().gen_range(1..=99)
        }
    };

    let points = match candidate.remove("points") {
        Some(Value::Array(items)) => string_items(items),
        _ => {
            defaulted.push("points");
            Vec::new()
        }
    };

    let useful_phrases = match candidate.remove("usefulPhrases") {
        Some(Value::Array(items)) => phrase_items(items),
        _ => {
            defaulted.push("usefulPhrases");
            Vec::new()
        }
    };

    let practice_prompts = match candidate.remove("practicePrompts") {
        Some(Value::Array(items)) => string_items(items),
        _ => {
            defaulted.push("practicePrompts");
            Vec::new()
        }
    };

    InterpretedReading {
        reading: Reading {
            title,
            english,
            japanese,
            lucky_color,
            lucky_number,
            points,
            useful_phrases,
            practice_prompts,
            sign,
        },
        used_fallback: !defaulted.is_empty(),
        defaulted_fields: defaulted,
    }
}

fn finite_f64(value: Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

fn string_items(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
        .collect()
}

/// Entries that do not look like `{en, ja}` are dropped rather than
/// failing the whole sequence.
fn phrase_items(items: Vec<Value>) -> Vec<UsefulPhrase> {
    items
        .into_iter()
        .filter_map(|v| serde_json::from_value::<UsefulPhrase>(v).ok())
        .collect()
}
