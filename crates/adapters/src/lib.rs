mod base_url;
mod error;
mod llm;

pub use base_url::chat_completions_url;
pub use error::AdapterError;
pub use llm::{create_chat_model, OpenAiChatAdapter};

pub use rewriter_core::config::{Config, ConfigStore, LlmConfig};
pub use rewriter_core::{ChatModel, CompletionError};
