//! crates/zodiac_tutor_core/src/session.rs
//!
//! The client session state machine: profile form, generation, the
//! follow-up loop, and voice capture. State lives in one struct and every
//! user action is a reducer-style method, so a UI layer only dispatches
//! events and renders.
//!
//! In-flight LLM calls are tagged with a monotonically increasing
//! generation token; a completion whose token no longer matches the latest
//! issued one is discarded, so a learner who re-triggers generation cannot
//! have a stale response clobber the newer one.

use serde_json::Value;

use crate::domain::{ChatMessage, Reading, Topic};
use crate::interpret::InterpretedReading;
use crate::zodiac::ZodiacSign;

/// Where the controller currently is in the profile → reading → follow-up
/// flow. Recording is tracked separately since it nests inside two phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingProfile,
    Generating,
    Reading,
    AskingFollowUp,
}

/// The text input a finished transcription should land in. Explicit by
/// design: the field is chosen when recording starts, never inferred from
/// which profile fields happen to be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptTarget {
    Name,
    BirthDate,
    Question,
}

/// The learner's profile form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    /// `YYYY-MM-DD`, as typed or transcribed.
    pub birth: String,
    pub topic: Option<Topic>,
}

impl Profile {
    /// A profile can be submitted once it has a name and a date that the
    /// zodiac resolver can actually place.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && self.topic.is_some()
            && ZodiacSign::from_iso(self.birth.trim()) != ZodiacSign::Unknown
    }
}

/// An opaque token identifying one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationToken(u64);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("profile is incomplete: name, birth date, and topic are all required")]
    IncompleteProfile,
    #[error("no reading has been generated yet")]
    NoReading,
    #[error("another request is already in flight")]
    Busy,
    #[error("recording is not active")]
    NotRecording,
    #[error("recording is already active")]
    AlreadyRecording,
}

/// Owns all mutable session state: the profile, the active reading, the
/// transcript, and the recording sub-state.
#[derive(Debug)]
pub struct SessionController {
    phase: Phase,
    profile: Profile,
    reading: Option<Reading>,
    transcript: Vec<ChatMessage>,
    question_draft: String,
    recording_target: Option<TranscriptTarget>,
    next_token: u64,
    pending: Option<GenerationToken>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingProfile,
            profile: Profile::default(),
            reading: None,
            transcript: Vec::new(),
            question_draft: String::new(),
            recording_target: None,
            next_token: 0,
            pending: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn reading(&self) -> Option<&Reading> {
        self.reading.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn question_draft(&self) -> &str {
        &self.question_draft
    }

    pub fn is_recording(&self) -> bool {
        self.recording_target.is_some()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.profile.name = name.into();
    }

    pub fn set_birth(&mut self, birth: impl Into<String>) {
        self.profile.birth = birth.into();
    }

    pub fn set_topic(&mut self, topic: Topic) {
        self.profile.topic = Some(topic);
    }

    pub fn set_question_draft(&mut self, text: impl Into<String>) {
        self.question_draft = text.into();
    }

    fn issue_token(&mut self) -> GenerationToken {
        self.next_token += 1;
        let token = GenerationToken(self.next_token);
        self.pending = Some(token);
        token
    }

    fn is_current(&self, token: GenerationToken) -> bool {
        self.pending == Some(token)
    }

    /// Submits the profile and moves to `Generating`. The returned token
    /// must accompany the eventual completion.
    pub fn submit_profile(&mut self) -> Result<GenerationToken, SessionError> {
        if !self.profile.is_complete() {
            return Err(SessionError::IncompleteProfile);
        }
        if self.pending.is_some() {
            return Err(SessionError::Busy);
        }
        self.phase = Phase::Generating;
        Ok(self.issue_token())
    }

    /// Installs a finished reading. The transcript is reset to a single
    /// assistant message carrying the reading text plus the lucky-info
    /// suffix. Stale tokens are ignored.
    pub fn reading_ready(&mut self, token: GenerationToken, result: InterpretedReading) {
        if !self.is_current(token) {
            return;
        }
        self.pending = None;
        let reading = result.reading;
        let en = format!(
            "{}\n\nLucky Color: {}  •  Lucky Number: {}",
            reading.english, reading.lucky_color, reading.lucky_number
        );
        self.transcript = vec![ChatMessage::assistant(en, Some(reading.japanese.clone()))];
        self.reading = Some(reading);
        self.phase = Phase::Reading;
    }

    /// A failed generation returns to the profile form; the transcript and
    /// any prior reading are left alone so the learner can retry.
    pub fn reading_failed(&mut self, token: GenerationToken) {
        if !self.is_current(token) {
            return;
        }
        self.pending = None;
        self.phase = if self.reading.is_some() {
            Phase::Reading
        } else {
            Phase::AwaitingProfile
        };
    }

    /// Sends the current question draft as a follow-up. Appends the user
    /// message immediately and enters the transient wait.
    pub fn ask_follow_up(&mut self) -> Result<(GenerationToken, String), SessionError> {
        let question = self.question_draft.trim().to_string();
        if question.is_empty() || self.reading.is_none() {
            return Err(SessionError::NoReading);
        }
        if self.pending.is_some() {
            return Err(SessionError::Busy);
        }
        self.transcript.push(ChatMessage::user(question.clone()));
        self.question_draft.clear();
        self.phase = Phase::AskingFollowUp;
        Ok((self.issue_token(), question))
    }

    /// Serialization of the active reading, for embedding in the follow-up
    /// prompt. `None` before the first generation.
    pub fn reading_context(&self) -> Option<Value> {
        self.reading
            .as_ref()
            .and_then(|r| serde_json::to_value(r).ok())
    }

    /// Appends the assistant's follow-up answer, segmented into English and
    /// Japanese blocks. Stale tokens are ignored.
    pub fn follow_up_answered(&mut self, token: GenerationToken, raw: &str) {
        if !self.is_current(token) {
            return;
        }
        self.pending = None;
        let (en, ja) = split_en_ja(raw);
        self.transcript.push(ChatMessage::assistant(en, ja));
        self.phase = Phase::Reading;
    }

    /// A failed follow-up leaves the user message in place and returns to
    /// the reading view so the learner can re-ask.
    pub fn follow_up_failed(&mut self, token: GenerationToken) {
        if !self.is_current(token) {
            return;
        }
        self.pending = None;
        self.phase = Phase::Reading;
    }

    /// Starts voice capture aimed at an explicit input field.
    pub fn start_recording(&mut self, target: TranscriptTarget) -> Result<(), SessionError> {
        if self.recording_target.is_some() {
            return Err(SessionError::AlreadyRecording);
        }
        self.recording_target = Some(target);
        Ok(())
    }

    /// Routes a finished transcription into the field chosen at
    /// `start_recording`. Never auto-submits.
    pub fn transcription_ready(&mut self, text: &str) -> Result<(), SessionError> {
        let target = self.recording_target.take().ok_or(SessionError::NotRecording)?;
        let text = text.trim();
        match target {
            TranscriptTarget::Name => self.profile.name = text.to_string(),
            TranscriptTarget::BirthDate => self.profile.birth = text.to_string(),
            TranscriptTarget::Question => self.question_draft = text.to_string(),
        }
        Ok(())
    }

    /// Abandons an active recording without routing any text.
    pub fn cancel_recording(&mut self) -> Result<(), SessionError> {
        self.recording_target
            .take()
            .map(|_| ())
            .ok_or(SessionError::NotRecording)
    }
}

/// Splits a combined answer into an English block and an optional Japanese
/// block. The boundary is the first line containing Japanese-script
/// characters. Best effort: responses that interleave scripts per sentence
/// stay unsplit rather than erroring.
pub fn split_en_ja(raw: &str) -> (String, Option<String>) {
    let lines: Vec<&str> = raw.trim().lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() <= 1 {
        return (raw.trim().to_string(), None);
    }
    let boundary = lines.iter().position(|l| contains_japanese(l));
    match boundary {
        Some(idx) if idx > 0 => (
            lines[..idx].join("\n"),
            Some(lines[idx..].join("\n")),
        ),
        _ => (raw.trim().to_string(), None),
    }
}

fn contains_japanese(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{3040}'..='\u{309F}' | // hiragana
            '\u{30A0}'..='\u{30FF}' | // katakana
            '\u{4E00}'..='\u{9FFF}'   // CJK unified ideographs
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::interpret_reading;
    use crate::domain::Role;

    fn complete_profile(ctl: &mut SessionController) {
        ctl.set_name("Yuki");
        ctl.set_birth("1990-01-23");
        ctl.set_topic(Topic::Love);
    }

    fn some_reading() -> InterpretedReading {
        interpret_reading(
            r#"{"title":"T","english":"Good day.","japanese":"良い日。","luckyColor":"red","luckyNumber":8,"points":[],"usefulPhrases":[],"practicePrompts":[]}"#,
            ZodiacSign::Aquarius,
        )
    }

    #[test]
    fn incomplete_profile_cannot_be_submitted() {
        let mut ctl = SessionController::new();
        assert_eq!(ctl.submit_profile(), Err(SessionError::IncompleteProfile));
        ctl.set_name("Yuki");
        ctl.set_birth("not-a-date");
        ctl.set_topic(Topic::Love);
        assert_eq!(ctl.submit_profile(), Err(SessionError::IncompleteProfile));
    }

    #[test]
    fn happy_path_resets_transcript_to_one_assistant_message() {
        let mut ctl = SessionController::new();
        complete_profile(&mut ctl);
        let token = ctl.submit_profile().unwrap();
        assert_eq!(ctl.phase(), Phase::Generating);

        ctl.reading_ready(token, some_reading());
        assert_eq!(ctl.phase(), Phase::Reading);
        assert_eq!(ctl.transcript().len(), 1);
        let first = &ctl.transcript()[0];
        assert_eq!(first.role, Role::Assistant);
        assert!(first.en.contains("Lucky Color: red"));
        assert!(first.en.contains("Lucky Number: 8"));
        assert_eq!(first.ja.as_deref(), Some("良い日。"));
    }

    #[test]
    fn stale_generation_token_is_discarded() {
        let mut ctl = SessionController::new();
        complete_profile(&mut ctl);
        let stale = ctl.submit_profile().unwrap();
        ctl.reading_failed(stale); // first attempt resolved as failure
        let fresh = ctl.submit_profile().unwrap();

        // The first call resolves late; it must not install anything.
        ctl.reading_ready(stale, some_reading());
        assert_eq!(ctl.phase(), Phase::Generating);
        assert!(ctl.reading().is_none());

        ctl.reading_ready(fresh, some_reading());
        assert_eq!(ctl.phase(), Phase::Reading);
        assert!(ctl.reading().is_some());
    }

    #[test]
    fn overlapping_submissions_are_gated() {
        let mut ctl = SessionController::new();
        complete_profile(&mut ctl);
        let _token = ctl.submit_profile().unwrap();
        assert_eq!(ctl.submit_profile(), Err(SessionError::Busy));
    }

    #[test]
    fn follow_up_requires_a_reading_and_a_question() {
        let mut ctl = SessionController::new();
        ctl.set_question_draft("What about money?");
        assert!(ctl.ask_follow_up().is_err());

        complete_profile(&mut ctl);
        let token = ctl.submit_profile().unwrap();
        ctl.reading_ready(token, some_reading());

        ctl.set_question_draft("   ");
        assert!(ctl.ask_follow_up().is_err());
    }

    #[test]
    fn follow_up_round_trip_appends_user_then_assistant() {
        let mut ctl = SessionController::new();
        complete_profile(&mut ctl);
        let token = ctl.submit_profile().unwrap();
        ctl.reading_ready(token, some_reading());

        let context = ctl.reading_context().unwrap();
        assert_eq!(context["title"], "T");

        ctl.set_question_draft("Should I study tonight?");
        let (token, question) = ctl.ask_follow_up().unwrap();
        assert_eq!(question, "Should I study tonight?");
        assert_eq!(ctl.phase(), Phase::AskingFollowUp);
        assert_eq!(ctl.transcript().len(), 2);
        assert_eq!(ctl.question_draft(), "");

        ctl.follow_up_answered(token, "Yes, a short session helps.\n短い勉強が役に立ちます。");
        assert_eq!(ctl.phase(), Phase::Reading);
        let last = ctl.transcript().last().unwrap();
        assert_eq!(last.en, "Yes, a short session helps.");
        assert_eq!(last.ja.as_deref(), Some("短い勉強が役に立ちます。"));
    }

    #[test]
    fn new_generation_supersedes_transcript_and_reading() {
        let mut ctl = SessionController::new();
        complete_profile(&mut ctl);
        let token = ctl.submit_profile().unwrap();
        ctl.reading_ready(token, some_reading());

        ctl.set_question_draft("q");
        let (token, _) = ctl.ask_follow_up().unwrap();
        ctl.follow_up_answered(token, "Answer.");
        assert_eq!(ctl.transcript().len(), 3);

        let token = ctl.submit_profile().unwrap();
        ctl.reading_ready(token, some_reading());
        assert_eq!(ctl.transcript().len(), 1);
    }

    #[test]
    fn transcription_routes_to_the_explicit_target_only() {
        let mut ctl = SessionController::new();
        // All fields empty; the heuristic version would have picked `name`.
        ctl.start_recording(TranscriptTarget::Question).unwrap();
        assert!(ctl.is_recording());
        ctl.transcription_ready(" When is my lucky day? ").unwrap();
        assert!(!ctl.is_recording());
        assert_eq!(ctl.question_draft(), "When is my lucky day?");
        assert_eq!(ctl.profile().name, "");
    }

    #[test]
    fn recording_is_exclusive_and_cancellable() {
        let mut ctl = SessionController::new();
        ctl.start_recording(TranscriptTarget::Name).unwrap();
        assert_eq!(
            ctl.start_recording(TranscriptTarget::Question),
            Err(SessionError::AlreadyRecording)
        );
        ctl.cancel_recording().unwrap();
        assert_eq!(ctl.cancel_recording(), Err(SessionError::NotRecording));
        assert_eq!(
            ctl.transcription_ready("lost"),
            Err(SessionError::NotRecording)
        );
    }

    #[test]
    fn split_en_ja_finds_the_first_japanese_line() {
        let (en, ja) = split_en_ja("Line one.\nLine two.\n今日は良い日です。\n頑張って。");
        assert_eq!(en, "Line one.\nLine two.");
        assert_eq!(ja.as_deref(), Some("今日は良い日です。\n頑張って。"));
    }

    #[test]
    fn split_en_ja_leaves_single_block_text_alone() {
        let (en, ja) = split_en_ja("Only English here.");
        assert_eq!(en, "Only English here.");
        assert!(ja.is_none());

        // Japanese-first text has no English prefix to split off.
        let (en, ja) = split_en_ja("こんにちは。\nHello.");
        assert_eq!(en, "こんにちは。\nHello.");
        assert!(ja.is_none());
    }
}
