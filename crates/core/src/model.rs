use thiserror::Error;

/// Why a chat completion produced no text. Closed set: callers match every
/// variant.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("rate limit reached")]
    RateLimited,
    #[error("service error: {0}")]
    Service(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

/// A remote chat-completion endpoint taking one system and one user message.
pub trait ChatModel: Send + Sync {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, CompletionError>;
}

impl<M: ChatModel + ?Sized> ChatModel for Box<M> {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, CompletionError> {
        (**self).complete(system_prompt, user_text)
    }
}
