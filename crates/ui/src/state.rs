use crate::tasks::{RewriteCommand, TaskKind, TestConnectionCommand};
use crate::text_editor::TextEditorState;
use rewriter_core::config::{Config, ConfigError, ConfigStore, LlmConfig};
use rewriter_core::export::{write_export, ExportError, ExportFormat};
use rewriter_core::logging::{LogLevel, LogRecord, LogSink};
use rewriter_core::prompts::{PromptError, PromptRegistry};
use rewriter_core::rewrite::{
    PreparedRewrite, RewriteError, RewriteRequest, RewriteService, SAVED_MESSAGE,
};
use rewriter_core::session::Session;
use rewriter_core::style::{PromptSelector, RewriteStyle};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_CAPACITY: usize = 500;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActiveTab {
    Rewrite,
    Settings,
    Logs,
}

impl ActiveTab {
    pub const ALL: [Self; 3] = [ActiveTab::Rewrite, ActiveTab::Settings, ActiveTab::Logs];

    pub fn label(&self) -> &'static str {
        match self {
            ActiveTab::Rewrite => "Rewrite",
            ActiveTab::Settings => "Settings",
            ActiveTab::Logs => "Logs",
        }
    }
}

/// Style picked in the form. The custom prompt text lives beside it so that
/// switching styles back and forth keeps what the user typed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum StyleChoice {
    #[default]
    InterpretExpand,
    ImproveGrammar,
    Custom,
}

impl StyleChoice {
    pub const ALL: [Self; 3] = [
        StyleChoice::InterpretExpand,
        StyleChoice::ImproveGrammar,
        StyleChoice::Custom,
    ];

    pub fn to_style(self, custom_prompt: &str) -> RewriteStyle {
        match self {
            StyleChoice::InterpretExpand => RewriteStyle::InterpretExpand,
            StyleChoice::ImproveGrammar => RewriteStyle::ImproveGrammar,
            StyleChoice::Custom => RewriteStyle::Custom(custom_prompt.to_string()),
        }
    }

    pub fn label(self) -> &'static str {
        self.to_style("").label()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkflowPhase {
    Idle,
    Rewriting,
    ResultReady,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    fn from_rewrite_error(err: &RewriteError) -> Self {
        let message = err.user_message();
        match err.level() {
            LogLevel::Error => Self::error(message),
            _ => Self::warning(message),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl ValidationError {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

pub struct AppState {
    config_store: ConfigStore,
    selector: PromptSelector,
    session: Session,
    pub config_path_input: String,
    pub settings: LlmSettingsForm,
    pub draft: TextEditorState,
    pub style: StyleChoice,
    pub custom_prompt: TextEditorState,
    pub save_form: SaveForm,
    pub notice: Option<Notice>,
    pub settings_status: Option<Notice>,
    pub logs: LogPanelState,
    pub active_tab: ActiveTab,
    pub active_task: Option<TaskKind>,
}

impl AppState {
    pub fn new(config_path: PathBuf) -> Result<Self, ValidationError> {
        let store = ConfigStore::open(config_path)?;
        let selector = load_selector(store.config())?;
        Ok(Self::from_parts(store, selector))
    }

    /// Like [`AppState::new`], but falls back to default settings or the
    /// built-in prompts when the config file or a prompt directory cannot be
    /// read. The returned errors are meant for the log panel.
    pub fn new_or_default(config_path: PathBuf) -> (Self, Vec<ValidationError>) {
        let mut problems = Vec::new();
        let store = match ConfigStore::open(config_path.clone()) {
            Ok(store) => store,
            Err(err) => {
                problems.push(err.into());
                ConfigStore::with_config(config_path, Config::default())
            }
        };
        let selector = match load_selector(store.config()) {
            Ok(selector) => selector,
            Err(err) => {
                problems.push(err.into());
                builtin_selector()
            }
        };
        (Self::from_parts(store, selector), problems)
    }

    fn from_parts(store: ConfigStore, selector: PromptSelector) -> Self {
        let config_path_input = store.path().to_string_lossy().to_string();
        let settings = LlmSettingsForm::from_config(&store.config().llm);
        Self {
            config_store: store,
            selector,
            session: Session::new(),
            config_path_input,
            settings,
            draft: TextEditorState::with_hint("Write your messy draft here"),
            style: StyleChoice::default(),
            custom_prompt: TextEditorState::with_hint("Enter your own system prompt"),
            save_form: SaveForm::default(),
            notice: None,
            settings_status: None,
            logs: LogPanelState::new(),
            active_tab: ActiveTab::Rewrite,
            active_task: None,
        }
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.config_store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_busy(&self) -> bool {
        self.active_task.is_some()
    }

    pub fn phase(&self) -> WorkflowPhase {
        if self.active_task == Some(TaskKind::Rewrite) {
            WorkflowPhase::Rewriting
        } else if self.session.has_latest() {
            WorkflowPhase::ResultReady
        } else {
            WorkflowPhase::Idle
        }
    }

    pub fn reload_from_path(&mut self, path: PathBuf) -> Result<(), ValidationError> {
        let store = ConfigStore::open(path.clone())?;
        self.selector = load_selector(store.config())?;
        self.config_store = store;
        self.refresh_from_store();
        self.config_path_input = path.to_string_lossy().to_string();
        Ok(())
    }

    pub fn refresh_from_store(&mut self) {
        self.settings = LlmSettingsForm::from_config(&self.config_store.config().llm);
    }

    pub fn sync_form_state(&mut self) -> Result<(), ValidationError> {
        self.config_store.config_mut().llm = self.settings.to_config()?;
        Ok(())
    }

    pub fn persist_config(&mut self) -> Result<(), ValidationError> {
        self.sync_form_state()?;
        self.config_store.save()?;
        self.refresh_from_store();
        Ok(())
    }

    pub fn reload_prompts(&mut self) -> Result<(), ValidationError> {
        self.selector = load_selector(self.config_store.config())?;
        Ok(())
    }

    pub fn request(&self) -> RewriteRequest {
        RewriteRequest::new(
            self.style.to_style(self.custom_prompt.text()),
            self.draft.text(),
        )
    }

    /// Packages a rewrite for the worker using the applied settings. Blank
    /// drafts are rejected here, before anything is dispatched.
    pub fn make_rewrite_command(&self, sink: &dyn LogSink) -> Result<RewriteCommand, RewriteError> {
        let prepared: PreparedRewrite =
            RewriteService::new(&self.selector, sink).prepare(&self.request())?;
        Ok(RewriteCommand {
            llm: self.config_store.config().llm.clone(),
            prepared,
        })
    }

    /// Tests the settings as currently typed, applied or not.
    pub fn make_test_command(&self) -> Result<TestConnectionCommand, ValidationError> {
        Ok(TestConnectionCommand {
            llm: self.settings.to_config()?,
        })
    }

    pub fn reject_rewrite(&mut self, err: &RewriteError) {
        self.notice = Some(Notice::from_rewrite_error(err));
    }

    /// Failures keep any earlier unsaved result in place.
    pub fn apply_rewrite_result(&mut self, result: Result<String, RewriteError>) {
        match result {
            Ok(text) => {
                self.session.set_latest(text);
                self.notice = None;
            }
            Err(err) => {
                self.push_log(LogRecord::new(err.level(), err.to_string()));
                self.notice = Some(Notice::from_rewrite_error(&err));
            }
        }
    }

    pub fn apply_test_result(&mut self, result: Result<String, RewriteError>) {
        self.settings_status = Some(match result {
            Ok(reply) => Notice::success(format!("Connection OK: {}", reply.trim())),
            Err(err) => Notice::from_rewrite_error(&err),
        });
    }

    /// Returns `false` when there was no result to save.
    pub fn save_latest(&mut self) -> bool {
        let saved = self
            .session
            .save_latest(self.save_form.title.clone(), self.save_form.keywords.clone())
            .map(|entry| entry.title().to_string());
        match saved {
            Some(title) => {
                self.push_log(LogRecord::info(format!("Saved entry \"{title}\"")));
                self.save_form.clear();
                self.notice = Some(Notice::success(SAVED_MESSAGE));
                true
            }
            None => false,
        }
    }

    pub fn default_export_name(&self, format: ExportFormat) -> &str {
        let export = &self.config_store.config().export;
        match format {
            ExportFormat::Csv => &export.csv_file_name,
            ExportFormat::Docx => &export.docx_file_name,
        }
    }

    pub fn export_to(&mut self, format: ExportFormat, path: &Path) -> Result<usize, ExportError> {
        let result = write_export(path, self.session.entries(), format);
        match &result {
            Ok(bytes) => self.push_log(LogRecord::info(format!(
                "Exported {} entries as {} to {} ({bytes} bytes)",
                self.session.entries().len(),
                format.label(),
                path.display()
            ))),
            Err(err) => {
                self.push_log(LogRecord::error(format!("Export failed: {err}")));
                self.notice = Some(Notice::error(format!("Export failed: {err}")));
            }
        }
        result
    }

    pub fn push_log(&mut self, record: LogRecord) {
        self.logs.push(record);
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }
}

fn load_selector(config: &Config) -> Result<PromptSelector, PromptError> {
    let registry = PromptRegistry::from_prompt_config(&config.prompts)?;
    PromptSelector::from_registry(&registry)
}

fn builtin_selector() -> PromptSelector {
    PromptRegistry::new()
        .and_then(|registry| PromptSelector::from_registry(&registry))
        .unwrap_or_else(|_| PromptSelector::new(String::new(), String::new()))
}

#[derive(Clone, Debug, Default)]
pub struct LlmSettingsForm {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
    pub temperature: String,
    pub timeout: String,
}

impl LlmSettingsForm {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model_name: config.model_name.clone(),
            temperature: format!("{:.2}", config.temperature),
            timeout: config.timeout.map(|t| t.to_string()).unwrap_or_default(),
        }
    }

    /// A blank timeout means no timeout.
    pub fn to_config(&self) -> Result<LlmConfig, ValidationError> {
        let temperature: f32 = self
            .temperature
            .trim()
            .parse()
            .map_err(|_| ValidationError::message("Temperature must be a number"))?;
        let timeout = match self.timeout.trim() {
            "" => None,
            value => Some(value.parse::<u64>().map_err(|_| {
                ValidationError::message("Timeout must be a whole number of seconds")
            })?),
        };
        Ok(LlmConfig {
            api_key: self.api_key.trim().to_string(),
            base_url: self.base_url.trim().to_string(),
            model_name: self.model_name.trim().to_string(),
            temperature,
            timeout,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct SaveForm {
    pub title: String,
    pub keywords: String,
}

impl SaveForm {
    pub fn clear(&mut self) {
        self.title.clear();
        self.keywords.clear();
    }
}

pub struct LogPanelState {
    records: VecDeque<LogRecord>,
    capacity: usize,
}

impl LogPanelState {
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, record: LogRecord) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }
}

impl Default for LogPanelState {
    fn default() -> Self {
        Self::new()
    }
}
