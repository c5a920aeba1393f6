pub mod config;
pub mod export;
pub mod logging;
pub mod model;
pub mod prompts;
pub mod rewrite;
pub mod session;
pub mod style;

pub use config::{
    Config, ConfigError, ConfigStore, ExportConfig, LlmConfig, PromptConfig, API_KEY_ENV,
};
pub use export::{entries_to_csv, entries_to_docx, write_export, ExportError, ExportFormat};
pub use logging::{LogLevel, LogRecord, LogSink, NullLogSink, StdoutLogSink, VecLogSink};
pub use model::{ChatModel, CompletionError};
pub use prompts::{PromptError, PromptRegistry, PromptSource, PromptText};
pub use rewrite::{
    check_connection, PreparedRewrite, RewriteError, RewriteRequest, RewriteService,
};
pub use session::{Entry, Session};
pub use style::{PromptSelector, RewriteStyle};
