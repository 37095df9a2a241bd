//! CLI binary for chatty-pdf.
//!
//! A thin terminal front-end over the library: uploads the PDFs given on the
//! command line, reads prompts from stdin and prints replies as they stream.

use anyhow::{Context, Result};
use chatty_pdf::config::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use chatty_pdf::{
    ChatConfig, ChatDisplay, ChatSession, ContextLayout, Document, Message, Reply, Role,
    StreamChunk,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Terminal display ─────────────────────────────────────────────────────────

/// Prints streamed fragments to stdout and everything else to stderr.
///
/// A spinner runs from the moment a prompt is sent until the first fragment
/// arrives, which for a large context can take a while.
struct TerminalDisplay {
    spinner: Mutex<Option<ProgressBar>>,
    show_pages: bool,
}

impl TerminalDisplay {
    fn new(show_pages: bool) -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
            show_pages,
        })
    }

    fn stop_spinner(&self) {
        if let Some(bar) = self.spinner.lock().ok().and_then(|mut s| s.take()) {
            bar.finish_and_clear();
        }
    }
}

impl ChatDisplay for TerminalDisplay {
    fn on_document_ingested(&self, document: &Document) {
        if self.show_pages {
            for (i, text) in document.pages().iter().enumerate() {
                println!("{}", bold(&format!("### Page {}", i + 1)));
                println!("{text}");
            }
        }

        eprintln!(
            "{} {}  {}",
            green("✓"),
            bold(document.name()),
            dim(&format!("{} pages", document.page_count())),
        );
        for err in document.page_errors() {
            eprintln!("  {} {}", red("✗"), red(&err.to_string()));
        }
    }

    fn on_send_start(&self, message_count: usize) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("Sending {message_count} messages…"));
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(bar);
        }
    }

    fn on_chunk(&self, chunk: &StreamChunk) {
        self.stop_spinner();
        let mut out = io::stdout().lock();
        let written = match chunk {
            StreamChunk::Text(t) => write!(out, "{t}"),
            StreamChunk::Diagnostic(d) => write!(out, "{}", red(&d.marker())),
        };
        written.and_then(|_| out.flush()).ok();
    }

    fn on_turn_complete(&self, reply: &Reply) {
        self.stop_spinner();
        println!();
        if reply.is_failed() {
            eprintln!("{} {}", cyan("⚠"), dim("turn not recorded; send again to retry"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Chat about a paper with a local Ollama model
  chatty-pdf paper.pdf

  # Several documents, another model
  chatty-pdf --model mistral report.pdf appendix.pdf

  # One question, then exit
  chatty-pdf --prompt "List the key findings" paper.pdf

  # Use a hosted provider instead of the streaming endpoint
  chatty-pdf --provider openai --model gpt-4.1-mini paper.pdf

COMMANDS (at the prompt):
  /upload <path>   Add another PDF to the context
  /context         Print the accumulated context
  /history         Print the conversation so far
  /quit            Leave

ENVIRONMENT VARIABLES:
  CHATTY_PDF_ENDPOINT   Streaming chat endpoint (default: http://localhost:11434/api/chat)
  CHATTY_PDF_MODEL      Model ID (default: llama3.2)
  CHATTY_PDF_PROVIDER   Hosted provider (openai, anthropic, gemini, …)
  RUST_LOG              Log filter, e.g. chatty_pdf=debug
"#;

/// Chat with the text of PDF documents through a streaming LLM backend.
#[derive(Parser, Debug)]
#[command(
    name = "chatty-pdf",
    version,
    about = "Chat with the text of PDF documents through a streaming LLM backend",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to upload before the first prompt.
    files: Vec<PathBuf>,

    /// Streaming chat endpoint (Ollama-compatible /api/chat).
    #[arg(long, env = "CHATTY_PDF_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Model ID sent with every request.
    #[arg(short, long, env = "CHATTY_PDF_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Hosted provider for one-shot replies: openai, anthropic, gemini, …
    #[arg(long, env = "CHATTY_PDF_PROVIDER")]
    provider: Option<String>,

    /// How documents are laid out in the context.
    #[arg(long, env = "CHATTY_PDF_LAYOUT", value_enum, default_value = "plain")]
    layout: LayoutArg,

    /// Whole-request timeout in seconds.
    #[arg(long, env = "CHATTY_PDF_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Print each page's extracted text after upload.
    #[arg(long)]
    show_pages: bool,

    /// Send this prompt, print the reply and exit.
    #[arg(short, long)]
    prompt: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CHATTY_PDF_VERBOSE")]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LayoutArg {
    Plain,
    Headed,
}

impl From<LayoutArg> for ContextLayout {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Plain => ContextLayout::Plain,
            LayoutArg::Headed => ContextLayout::Headed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Warnings only by default: INFO lines would interleave with the reply.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let display = TerminalDisplay::new(cli.show_pages);
    let mut session = ChatSession::new(config)
        .context("Failed to start chat session")?
        .with_display(display);

    // ── Initial uploads ──────────────────────────────────────────────────
    for path in &cli.files {
        if let Err(e) = session.upload_path(path).await {
            eprintln!("{} {}", red("✗"), red(&e.to_string()));
        }
    }
    if !cli.files.is_empty() {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "{} chars of context from {} documents",
                session.context().len(),
                session.documents().len()
            ))
        );
    }

    // ── One-shot mode ────────────────────────────────────────────────────
    if let Some(ref prompt) = cli.prompt {
        let reply = session.send(prompt).await.context("Send failed")?;
        if reply.is_failed() {
            anyhow::bail!("The model backend did not answer");
        }
        return Ok(());
    }

    // ── Interactive loop ─────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{} ", bold(">"));
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();

        match parse_command(line) {
            Command::Quit => break,
            Command::Help => eprintln!("{AFTER_HELP}"),
            Command::Context => println!("{}", session.context()),
            Command::History => print_history(session.transcript()),
            Command::Upload(path) => {
                if let Err(e) = session.upload_path(path).await {
                    eprintln!("{} {}", red("✗"), red(&e.to_string()));
                }
            }
            Command::Usage(usage) => eprintln!("{} usage: {usage}", cyan("⚠")),
            Command::Prompt(text) => {
                if let Err(e) = session.send(text).await {
                    eprintln!("{} {}", cyan("⚠"), e);
                }
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ChatConfig`.
fn build_config(cli: &Cli) -> Result<ChatConfig> {
    let mut builder = ChatConfig::builder()
        .endpoint(cli.endpoint.clone())
        .model(cli.model.clone())
        .request_timeout_secs(cli.timeout)
        .context_layout(cli.layout.clone().into());

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    builder.build().context("Invalid configuration")
}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Help,
    Context,
    History,
    Upload(&'a str),
    /// A known command used wrongly; carries the usage line.
    Usage(&'static str),
    Prompt(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    match line.split_once(char::is_whitespace) {
        Some(("/upload", path)) if !path.trim().is_empty() => Command::Upload(path.trim()),
        _ => match line.trim() {
            "/upload" => Command::Usage("/upload <path>"),
            "/quit" | "/exit" => Command::Quit,
            "/help" => Command::Help,
            "/context" => Command::Context,
            "/history" => Command::History,
            other => Command::Prompt(other),
        },
    }
}

fn print_history(messages: &[Message]) {
    for message in messages {
        let who = match message.role() {
            Role::User => bold("You:"),
            Role::Assistant => bold("Assistant:"),
            Role::System => dim("System (Context):"),
        };
        println!("{who} {}", message.content());
    }
}
