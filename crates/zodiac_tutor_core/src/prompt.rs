//! crates/zodiac_tutor_core/src/prompt.rs
//!
//! Builds the instruction text sent to the LLM for the two generative
//! operations: the initial reading and follow-up questions. Pure string
//! construction; caller-supplied text is embedded verbatim and never
//! interpreted here.

use crate::domain::Topic;
use crate::zodiac::ZodiacSign;

/// Maximum number of characters of serialized prior-reading context that
/// may be embedded in a follow-up prompt. Bounds token cost and keeps the
/// prompt from growing with the session.
pub const HISTORY_CHAR_BUDGET: usize = 2000;

const READING_SYSTEM: &str =
    "You are an ESL-friendly horoscope guide. CEFR A2-B1. Short, encouraging, concrete.";

const FOLLOW_UP_SYSTEM: &str =
    "You are a friendly ESL tutor giving astrology-themed advice. CEFR A2-B1 English. Be practical.";

const READING_SCHEMA: &str = r#"{
  "title": string,
  "english": string, // 6-8 sentences, learner-friendly
  "japanese": string, // faithful JP translation
  "luckyColor": string, // a common English color name
  "luckyNumber": integer, // between 1 and 99
  "points": string[], // 3-5 short takeaways
  "usefulPhrases": {"en": string, "ja": string}[], // 3-5 items
  "practicePrompts": string[] // 3-5 speaking prompts
}"#;

/// A system/user instruction pair ready to hand to a chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds the prompt for the initial reading. The user message pins the
/// sign, name, and topic, and demands a single strict JSON object so the
/// response interpreter has something deterministic to aim at.
pub fn build_reading_prompt(name: &str, sign: ZodiacSign, topic: Topic) -> Prompt {
    let user = format!(
        "Create a concise horoscope (6-8 sentences) for Sign: {sign}. \
         User name: {name}. Topic: {topic} (love/money/work-study).\n\
         Return ONLY a single JSON object, no commentary before or after it:\n{schema}",
        sign = sign.as_str(),
        name = name,
        topic = topic.as_str(),
        schema = READING_SCHEMA,
    );
    Prompt {
        system: READING_SYSTEM.to_string(),
        user,
    }
}

/// Builds the prompt for a follow-up question. The prior reading is
/// serialized and truncated to [`HISTORY_CHAR_BUDGET`] characters before
/// being embedded, on a character boundary so multi-byte Japanese text is
/// never split mid-scalar.
pub fn build_follow_up_prompt(prior_reading: &serde_json::Value, question: &str) -> Prompt {
    let serialized = prior_reading.to_string();
    let context: String = serialized.chars().take(HISTORY_CHAR_BUDGET).collect();
    let user = format!(
        "Answer concisely in English first (4-6 sentences), then provide a \
         Japanese translation on its own lines after the English.\n\
         Context (previous horoscope or info): {context}\n\
         Learner question: {question}"
    );
    Prompt {
        system: FOLLOW_UP_SYSTEM.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reading_prompt_names_sign_name_and_topic() {
        let p = build_reading_prompt("Yuki", ZodiacSign::Leo, Topic::Money);
        assert_eq!(p.system, READING_SYSTEM);
        assert!(p.user.contains("Sign: Leo"));
        assert!(p.user.contains("User name: Yuki"));
        assert!(p.user.contains("Topic: money"));
        assert!(p.user.contains("\"luckyNumber\""));
        assert!(p.user.contains("ONLY a single JSON object"));
    }

    #[test]
    fn follow_up_prompt_embeds_context_and_question() {
        let reading = json!({"title": "Hi", "english": "Good luck."});
        let p = build_follow_up_prompt(&reading, "What should I do today?");
        assert!(p.user.contains("\"title\":\"Hi\""));
        assert!(p.user.contains("Learner question: What should I do today?"));
    }

    #[test]
    fn oversized_history_is_truncated_to_the_character_budget() {
        let big = json!({"english": "x".repeat(10_000)});
        let p = build_follow_up_prompt(&big, "q");
        let marker = "Context (previous horoscope or info): ";
        let start = p.user.find(marker).unwrap() + marker.len();
        let end = p.user.find("\nLearner question:").unwrap();
        let embedded = &p.user[start..end];
        assert!(embedded.chars().count() <= HISTORY_CHAR_BUDGET);
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let big = json!({"japanese": "星".repeat(5_000)});
        let p = build_follow_up_prompt(&big, "q");
        // Building the String would have panicked on a split scalar; this
        // just pins the budget.
        assert!(p.user.contains("星"));
    }
}
