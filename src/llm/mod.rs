pub mod interface;
pub mod openai;

pub use interface::{ChatMessage, LlmClient};
pub use openai::OpenAiClient;
