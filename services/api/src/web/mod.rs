pub mod rest;
pub mod state;

// Re-export the REST handlers to make them easily accessible to the binary
// that builds the web server router.
pub use rest::{chat_handler, horoscope_handler, transcribe_handler, tts_handler};
