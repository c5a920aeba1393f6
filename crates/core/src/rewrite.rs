use thiserror::Error;

use crate::logging::{LogLevel, LogRecord, LogSink};
use crate::model::{ChatModel, CompletionError};
use crate::session::Session;
use crate::style::{PromptSelector, RewriteStyle};

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter some text.";
pub const RATE_LIMITED_MESSAGE: &str =
    "Rate limit reached. Please wait a moment before trying again.";
pub const SUCCESS_MESSAGE: &str = "Here's your rewritten paragraph:";
pub const SAVED_MESSAGE: &str = "Saved! You can add more or download all below.";
pub const CONNECTION_TEST_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const CONNECTION_TEST_PROMPT: &str = "Please reply 'OK'";

/// Outcome of a failed rewrite attempt. Every variant ends that attempt; none
/// is retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("draft is empty")]
    EmptyInput,
    #[error("rate limited by the API")]
    RateLimited,
    #[error("API error: {0}")]
    ServiceError(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl RewriteError {
    pub fn level(&self) -> LogLevel {
        match self {
            RewriteError::EmptyInput | RewriteError::RateLimited => LogLevel::Warn,
            RewriteError::ServiceError(_) | RewriteError::Unexpected(_) => LogLevel::Error,
        }
    }

    /// Inline message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            RewriteError::EmptyInput => EMPTY_INPUT_MESSAGE.to_string(),
            RewriteError::RateLimited => RATE_LIMITED_MESSAGE.to_string(),
            RewriteError::ServiceError(detail) => format!("OpenAI API error: {detail}"),
            RewriteError::Unexpected(detail) => format!("Something went wrong: {detail}"),
        }
    }
}

impl From<CompletionError> for RewriteError {
    fn from(error: CompletionError) -> Self {
        match error {
            CompletionError::RateLimited => RewriteError::RateLimited,
            CompletionError::Service(detail) => RewriteError::ServiceError(detail),
            CompletionError::Other(detail) => RewriteError::Unexpected(detail),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteRequest {
    pub style: RewriteStyle,
    pub draft: String,
}

impl RewriteRequest {
    pub fn new(style: RewriteStyle, draft: impl Into<String>) -> Self {
        Self {
            style,
            draft: draft.into(),
        }
    }
}

/// A validated request with its system prompt resolved. Safe to hand to a
/// background worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRewrite {
    pub style_label: &'static str,
    pub system_prompt: String,
    pub draft: String,
}

impl PreparedRewrite {
    pub fn execute<M: ChatModel + ?Sized>(
        &self,
        model: &M,
        sink: &dyn LogSink,
    ) -> Result<String, RewriteError> {
        sink.log(LogRecord::info(format!(
            "Rewriting {} characters ({})",
            self.draft.chars().count(),
            self.style_label
        )));
        match model.complete(&self.system_prompt, &self.draft) {
            Ok(text) => {
                sink.log(LogRecord::info(format!(
                    "Received {} characters",
                    text.chars().count()
                )));
                Ok(text)
            }
            Err(err) => {
                let err = RewriteError::from(err);
                sink.log(LogRecord::new(err.level(), format!("Rewrite failed: {err}")));
                Err(err)
            }
        }
    }
}

/// Sends the fixed connection-test prompt and returns the reply unchanged.
pub fn check_connection<M: ChatModel + ?Sized>(
    model: &M,
    sink: &dyn LogSink,
) -> Result<String, RewriteError> {
    sink.log(LogRecord::new(
        LogLevel::Debug,
        format!("Sending test prompt: {CONNECTION_TEST_PROMPT}"),
    ));
    match model.complete(CONNECTION_TEST_SYSTEM_PROMPT, CONNECTION_TEST_PROMPT) {
        Ok(reply) => {
            sink.log(LogRecord::info(format!("Connection OK: {}", reply.trim())));
            Ok(reply)
        }
        Err(err) => {
            let err = RewriteError::from(err);
            sink.log(LogRecord::new(
                err.level(),
                format!("Connection test failed: {err}"),
            ));
            Err(err)
        }
    }
}

pub struct RewriteService<'a> {
    selector: &'a PromptSelector,
    sink: &'a dyn LogSink,
}

impl<'a> RewriteService<'a> {
    pub fn new(selector: &'a PromptSelector, sink: &'a dyn LogSink) -> Self {
        Self { selector, sink }
    }

    /// Rejects blank drafts and resolves the system prompt. The draft is kept
    /// verbatim, surrounding whitespace included.
    pub fn prepare(&self, request: &RewriteRequest) -> Result<PreparedRewrite, RewriteError> {
        if request.draft.trim().is_empty() {
            self.sink.log(LogRecord::warn(EMPTY_INPUT_MESSAGE));
            return Err(RewriteError::EmptyInput);
        }
        Ok(PreparedRewrite {
            style_label: request.style.label(),
            system_prompt: self.selector.system_prompt(&request.style).to_string(),
            draft: request.draft.clone(),
        })
    }

    /// Runs one rewrite and stores the result as the session's latest
    /// result. On failure the session is left as it was.
    pub fn rewrite<M: ChatModel + ?Sized>(
        &self,
        model: &M,
        session: &mut Session,
        request: &RewriteRequest,
    ) -> Result<(), RewriteError> {
        let prepared = self.prepare(request)?;
        let text = prepared.execute(model, self.sink)?;
        session.set_latest(text);
        Ok(())
    }
}
