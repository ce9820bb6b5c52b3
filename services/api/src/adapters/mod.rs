pub mod chat_llm;
pub mod sst;
pub mod tts;

pub use chat_llm::OpenAiChatAdapter;
pub use sst::OpenAiSstAdapter;
pub use tts::OpenAiTtsAdapter;
