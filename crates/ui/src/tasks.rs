use std::thread;

use rewriter_adapters::{create_chat_model, LlmConfig};
use rewriter_core::logging::{LogRecord, LogSink};
use rewriter_core::{check_connection, CompletionError, PreparedRewrite, RewriteError};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub type EventSender = UnboundedSender<TaskEvent>;

#[derive(Clone, Debug)]
pub enum TaskCommand {
    Rewrite(RewriteCommand),
    TestConnection(TestConnectionCommand),
}

impl TaskCommand {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskCommand::Rewrite(_) => TaskKind::Rewrite,
            TaskCommand::TestConnection(_) => TaskKind::TestConnection,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TaskKind {
    Rewrite,
    TestConnection,
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Rewrite => "Rewriting...",
            TaskKind::TestConnection => "Testing connection...",
        }
    }
}

#[derive(Clone, Debug)]
pub struct RewriteCommand {
    pub llm: LlmConfig,
    pub prepared: PreparedRewrite,
}

#[derive(Clone, Debug)]
pub struct TestConnectionCommand {
    pub llm: LlmConfig,
}

/// Runs one command at a time on a worker thread and reports back through
/// [`TaskEvent`]s polled by the UI.
#[derive(Debug)]
pub struct TaskController {
    sender: UnboundedSender<TaskCommand>,
    receiver: UnboundedReceiver<TaskEvent>,
    _worker: thread::JoinHandle<()>,
}

impl TaskController {
    pub fn new() -> Self {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<TaskCommand>();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let handle = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");

            runtime.block_on(async move {
                while let Some(command) = command_rx.recv().await {
                    run_command(command, event_tx.clone()).await;
                }
            });
        });

        Self {
            sender: command_tx,
            receiver: event_rx,
            _worker: handle,
        }
    }

    pub fn send(&self, command: TaskCommand) -> Result<(), TaskSendError> {
        self.sender
            .send(command)
            .map_err(|_| TaskSendError::ChannelClosed)
    }

    pub fn try_recv(&mut self) -> Option<TaskEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Default for TaskController {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum TaskSendError {
    #[error("task channel closed")]
    ChannelClosed,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error("background task crashed: {0}")]
    Join(String),
}

impl TaskError {
    /// Join failures surface like any other unexpected error.
    pub fn into_rewrite_error(self) -> RewriteError {
        match self {
            TaskError::Rewrite(err) => err,
            TaskError::Join(detail) => RewriteError::Unexpected(detail),
        }
    }
}

#[derive(Clone, Debug)]
pub enum TaskEvent {
    Log(LogRecord),
    TaskStarted(TaskKind),
    RewriteFinished(Result<String, TaskError>),
    ConnectionTested(Result<String, TaskError>),
}

struct ChannelLogSink {
    sender: EventSender,
}

impl LogSink for ChannelLogSink {
    fn log(&self, record: LogRecord) {
        let _ = self.sender.send(TaskEvent::Log(record));
    }
}

async fn run_command(command: TaskCommand, sender: EventSender) {
    let kind = command.kind();
    let _ = sender.send(TaskEvent::TaskStarted(kind));
    let sink = ChannelLogSink {
        sender: sender.clone(),
    };
    let result = tokio::task::spawn_blocking(move || execute_command(&command, &sink))
        .await
        .map_err(|err| TaskError::Join(err.to_string()))
        .and_then(|res| res.map_err(TaskError::from));
    let event = match kind {
        TaskKind::Rewrite => TaskEvent::RewriteFinished(result),
        TaskKind::TestConnection => TaskEvent::ConnectionTested(result),
    };
    let _ = sender.send(event);
}

fn execute_command(command: &TaskCommand, sink: &dyn LogSink) -> Result<String, RewriteError> {
    match command {
        TaskCommand::Rewrite(cmd) => run_rewrite(cmd, sink),
        TaskCommand::TestConnection(cmd) => run_test_connection(cmd, sink),
    }
}

fn run_rewrite(command: &RewriteCommand, sink: &dyn LogSink) -> Result<String, RewriteError> {
    let model = create_chat_model(&command.llm)
        .map_err(|err| RewriteError::from(CompletionError::from(err)))?;
    command.prepared.execute(model.as_ref(), sink)
}

fn run_test_connection(
    command: &TestConnectionCommand,
    sink: &dyn LogSink,
) -> Result<String, RewriteError> {
    sink.log(LogRecord::info(format!(
        "Testing model `{}` at {}",
        command.llm.model_name, command.llm.base_url
    )));
    let model = create_chat_model(&command.llm)
        .map_err(|err| RewriteError::from(CompletionError::from(err)))?;
    check_connection(model.as_ref(), sink)
}
