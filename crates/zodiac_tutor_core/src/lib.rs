pub mod domain;
pub mod interpret;
pub mod ports;
pub mod prompt;
pub mod session;
pub mod zodiac;

pub use domain::{ChatMessage, Reading, Role, Topic, UsefulPhrase};
pub use interpret::{interpret_reading, InterpretedReading};
pub use ports::{ChatCompletionService, PortError, PortResult, SpeechToTextService, TextToSpeechService};
pub use prompt::{build_follow_up_prompt, build_reading_prompt, Prompt, HISTORY_CHAR_BUDGET};
pub use session::{Phase, Profile, SessionController, SessionError, TranscriptTarget};
pub use zodiac::ZodiacSign;
