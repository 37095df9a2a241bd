//! # chatty-pdf
//!
//! Chat with the text of your PDF documents through a streaming LLM backend.
//!
//! Uploaded PDFs are reduced to plain text and accumulated into one context.
//! Every chat turn sends that context as the leading system message, followed
//! by the conversation so far, and streams the model's reply back fragment by
//! fragment.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Extract  per-page text via lopdf (spawn_blocking)
//!  ├─ 2. Context  append page texts to the session context, in upload order
//!  ├─ 3. Inject   refresh the single system message at the head of the transcript
//!  ├─ 4. Send     POST to an Ollama-compatible /api/chat, read NDJSON lazily
//!  └─ 5. Record   append the user turn and the full assistant reply
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatty_pdf::{ChatConfig, ChatSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChatConfig::builder()
//!         .endpoint("http://localhost:11434/api/chat")
//!         .model("llama3.2")
//!         .build()?;
//!     let mut session = ChatSession::new(config)?;
//!
//!     session.upload_path("paper.pdf").await?;
//!     let reply = session.send("Summarise the paper in three sentences.").await?;
//!     println!("{}", reply.rendered());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `chatty-pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! chatty-pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod stream;
pub mod transcript;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ChatConfig, ChatConfigBuilder, ContextLayout};
pub use display::{ChatDisplay, DisplayHandle, NoopDisplay};
pub use error::{ChatPdfError, DecodeError, ExtractionError, PageError, TransportError};
pub use pipeline::context::{Document, DocumentStore};
pub use pipeline::extract::{LopdfExtractor, TextExtractor};
pub use pipeline::inject::prepare_transcript;
pub use pipeline::provider::ProviderBackend;
pub use pipeline::transport::{ChatBackend, StreamingChatClient};
pub use session::{ChatSession, Reply};
pub use stream::{ChunkStream, Diagnostic, DiagnosticKind, StreamChunk};
pub use transcript::{Message, Role, TranscriptLog};
