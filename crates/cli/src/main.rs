use clap::{Args, Parser, Subcommand};
use rewriter_adapters::{create_chat_model, AdapterError};
use rewriter_core::rewrite::SUCCESS_MESSAGE;
use rewriter_core::{
    check_connection, write_export, ConfigError, ConfigStore, ExportError, ExportFormat,
    LlmConfig, LogRecord, LogSink, PromptError, PromptRegistry, PromptSelector, RewriteError,
    RewriteRequest, RewriteService, RewriteStyle, Session, StdoutLogSink,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MASKED_API_KEY: &str = "********";

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let sink = StdoutLogSink::with_verbosity(cli.verbose).on_stderr();

    match cli.command {
        Command::Config(command) => handle_config(&cli.config, command, &sink),
        Command::Rewrite(args) => run_rewrite(&cli.config, args, &sink),
    }
}

fn handle_config(
    config_path: &Path,
    command: ConfigCommand,
    sink: &dyn LogSink,
) -> Result<(), CliError> {
    match command {
        ConfigCommand::Test(args) => run_test_connection(config_path, args, sink),
        ConfigCommand::Show => {
            println!("{}", render_config(config_path)?);
            Ok(())
        }
    }
}

fn load_llm_config(config_path: &Path, overrides: &LlmOverrides) -> Result<LlmConfig, CliError> {
    let store = ConfigStore::open(config_path.to_path_buf())?;
    Ok(overrides.apply(store.config().llm.clone()))
}

fn run_test_connection(
    config_path: &Path,
    args: TestArgs,
    sink: &dyn LogSink,
) -> Result<(), CliError> {
    let llm = load_llm_config(config_path, &args.llm)?;
    sink.log(LogRecord::info(format!(
        "Testing model `{}` at {}",
        llm.model_name, llm.base_url
    )));
    if llm.resolved_api_key().is_none() {
        sink.log(LogRecord::warn(
            "No API key in config, flags or OPENAI_API_KEY; the request will likely fail",
        ));
    }

    let model = create_chat_model(&llm)?;
    check_connection(model.as_ref(), sink)?;
    Ok(())
}

/// The effective config as pretty JSON, with a non-empty API key masked.
fn render_config(config_path: &Path) -> Result<String, CliError> {
    let store = ConfigStore::open(config_path.to_path_buf())?;
    let mut config = store.config().clone();
    if !config.llm.api_key.is_empty() {
        config.llm.api_key = MASKED_API_KEY.to_string();
    }
    serde_json::to_string_pretty(&config).map_err(|err| CliError::Config(err.into()))
}

fn run_rewrite(config_path: &Path, args: RewriteArgs, sink: &dyn LogSink) -> Result<(), CliError> {
    let store = ConfigStore::open(config_path.to_path_buf())?;
    let llm = args.llm.apply(store.config().llm.clone());
    let registry = PromptRegistry::from_prompt_config(&store.config().prompts)?;
    let selector = PromptSelector::from_registry(&registry)?;

    let style = match args.style.clone() {
        RewriteStyle::Custom(_) => {
            RewriteStyle::Custom(args.prompt.clone().ok_or(CliError::MissingCustomPrompt)?)
        }
        style => style,
    };
    let draft = read_draft(args.text.as_deref(), args.input.as_deref())?;

    let model = create_chat_model(&llm)?;
    let service = RewriteService::new(&selector, sink);
    let mut session = Session::new();
    service.rewrite(model.as_ref(), &mut session, &RewriteRequest::new(style, draft))?;

    if let Some(latest) = session.latest() {
        sink.log(LogRecord::info(SUCCESS_MESSAGE));
        println!("{latest}");
    }

    if !args.should_save() {
        return Ok(());
    }
    session.save_latest(
        args.title.clone().unwrap_or_default(),
        args.keywords.clone().unwrap_or_default(),
    );

    let targets = [
        (ExportFormat::Csv, args.csv.as_ref()),
        (ExportFormat::Docx, args.docx.as_ref()),
    ];
    for (format, path) in targets {
        if let Some(path) = path {
            let bytes = write_export(path, session.entries(), format)?;
            sink.log(LogRecord::info(format!(
                "Wrote {} ({bytes} bytes) to {}",
                format.label(),
                path.display()
            )));
        }
    }
    Ok(())
}

/// Draft text comes from the positional argument, then `--input`, then stdin.
fn read_draft(text: Option<&str>, input: Option<&Path>) -> Result<String, CliError> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    if let Some(path) = input {
        return fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|source| CliError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    Ok(buffer)
}

#[derive(Parser)]
#[command(
    name = "rewriter-cli",
    version,
    about = "Rewrite rough non-fiction drafts into polished paragraphs"
)]
struct Cli {
    /// Path to the JSON config file
    #[arg(
        long,
        global = true,
        env = "REWRITER_CONFIG",
        default_value = "config.json"
    )]
    config: PathBuf,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Config file operations
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Rewrite a draft and print the result
    Rewrite(RewriteArgs),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Send a short test prompt with the current settings
    Test(TestArgs),
    /// Print the effective config with the API key masked
    Show,
}

#[derive(Args, Clone, Debug, Default)]
struct LlmOverrides {
    /// API key; overrides the config file
    #[arg(long)]
    api_key: Option<String>,
    /// Model name; overrides the config file
    #[arg(long)]
    model: Option<String>,
    /// API base URL; overrides the config file
    #[arg(long)]
    base_url: Option<String>,
}

impl LlmOverrides {
    fn apply(&self, mut llm: LlmConfig) -> LlmConfig {
        if let Some(key) = &self.api_key {
            llm.api_key = key.clone();
        }
        if let Some(model) = &self.model {
            llm.model_name = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            llm.base_url = base_url.clone();
        }
        llm
    }
}

#[derive(Args)]
struct TestArgs {
    #[command(flatten)]
    llm: LlmOverrides,
}

#[derive(Args)]
struct RewriteArgs {
    /// Draft text. Read from --input or stdin when omitted
    text: Option<String>,

    /// Read the draft from a file
    #[arg(short, long, conflicts_with = "text")]
    input: Option<PathBuf>,

    /// interpret, grammar or custom
    #[arg(short, long, default_value = "interpret")]
    style: RewriteStyle,

    /// System prompt for the custom style
    #[arg(short, long)]
    prompt: Option<String>,

    /// Save the result under this title
    #[arg(long)]
    title: Option<String>,

    /// Comma-separated keywords for the saved entry
    #[arg(long)]
    keywords: Option<String>,

    /// Export the saved entry as CSV
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Export the saved entry as a Word document
    #[arg(long, value_name = "PATH")]
    docx: Option<PathBuf>,

    #[command(flatten)]
    llm: LlmOverrides,
}

impl RewriteArgs {
    /// Any save metadata or export target commits the result.
    fn should_save(&self) -> bool {
        self.title.is_some() || self.keywords.is_some() || self.csv.is_some() || self.docx.is_some()
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to load prompts: {0}")]
    Prompt(#[from] PromptError),
    #[error("invalid model settings: {0}")]
    Adapter(#[from] AdapterError),
    #[error("{}", .0.user_message())]
    Rewrite(#[from] RewriteError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("--prompt is required with --style custom")]
    MissingCustomPrompt,
    #[error("failed to read `{path}`: {source}")]
    Io { path: PathBuf, source: io::Error },
}
