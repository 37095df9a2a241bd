//! Error types for the chatty-pdf library.
//!
//! Failures are split by how far they reach:
//!
//! * [`ChatPdfError`] — **Fatal** for the operation that raised it (bad
//!   configuration, unreadable document, empty prompt). Returned as
//!   `Err(ChatPdfError)` from [`crate::session::ChatSession`] methods.
//!
//! * [`ExtractionError`] — a whole document could not be opened. Ingestion of
//!   that one document fails; the context and every earlier document are
//!   untouched.
//!
//! * [`PageError`] — **Non-fatal**: a single page yielded no text. The page is
//!   kept with empty text and the error is stored on the
//!   [`crate::pipeline::context::Document`].
//!
//! * [`TransportError`] — the model backend refused or dropped the request.
//!   Terminal for one send, surfaced as a single diagnostic chunk rather than
//!   an `Err`.
//!
//! * [`DecodeError`] — one streamed line was malformed. Surfaced inline as a
//!   diagnostic chunk; the stream continues.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the chatty-pdf library.
#[derive(Debug, Error)]
pub enum ChatPdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A document could not be extracted.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The prompt was empty or whitespace only.
    #[error("Please enter a prompt!")]
    EmptyPrompt,

    // ── Transcript errors ─────────────────────────────────────────────────
    /// A system message was appended through the log instead of the injector.
    #[error("System messages are managed by the context injector and cannot be appended")]
    SystemMessageAppend,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A document that could not be opened at all.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other failure reading the file (a directory, a bad device, …).
    #[error("Could not read '{path}': {detail}")]
    Io { path: PathBuf, detail: String },

    /// The bytes do not start with the PDF magic number.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password.
    #[error("PDF '{name}' is encrypted and cannot be read without a password")]
    Encrypted { name: String },
}

/// A non-fatal error for a single page.
///
/// The page stays in the document with empty text.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The extractor could not produce text for the page.
    #[error("Page {page}: text extraction failed: {detail}")]
    ExtractFailed { page: usize, detail: String },

    /// The page parsed but carried no text: scanned, blank, or an
    /// undecodable content stream.
    #[error("Page {page}: no extractable text")]
    NoText { page: usize },
}

/// Why a send to the model backend failed.
///
/// Terminal for that send only; the context and the transcript are untouched.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Handshake { status: u16, body: String },

    /// The request could not be sent or the body stream broke.
    #[error("Network error talking to '{endpoint}': {detail}")]
    Network { endpoint: String, detail: String },

    /// The request or the body read exceeded the configured timeout.
    #[error("Request to '{endpoint}' timed out: {detail}")]
    Timeout { endpoint: String, detail: String },

    /// A hosted provider returned an error for a one-shot completion.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl TransportError {
    /// Classify a `reqwest` error for `endpoint`.
    pub fn from_reqwest(endpoint: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                endpoint: endpoint.to_string(),
                detail: err.to_string(),
            }
        } else {
            TransportError::Network {
                endpoint: endpoint.to_string(),
                detail: err.to_string(),
            }
        }
    }
}

/// One streamed line that could not be decoded.
#[derive(Debug, Clone, Error)]
#[error("{detail} in line: {line}")]
pub struct DecodeError {
    /// The decoder's complaint.
    pub detail: String,
    /// The offending line, lossily converted to UTF-8.
    pub line: String,
}
