//! Streamed assistant output: tagged chunks and the NDJSON line decoder.
//!
//! ## Why a tagged chunk?
//!
//! A failing backend must not look like a talkative one. Every element of a
//! [`ChunkStream`] is either model text or a [`Diagnostic`], so callers can
//! render both progressively while the transcript only ever stores text.
//!
//! ## Decoding
//!
//! The backend answers with one JSON record per line. [`decode_body`] pulls
//! bytes from the transport only when the consumer asks for the next chunk,
//! keeps nothing but the current partial line, and decodes each complete line
//! on its own. A malformed line becomes a [`DiagnosticKind::Decode`] chunk and
//! decoding carries on with the next line. A broken body becomes one final
//! [`DiagnosticKind::Transport`] chunk, and an `error` record one final
//! [`DiagnosticKind::Backend`] chunk: the backend has stopped generating.

use crate::error::{DecodeError, TransportError};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// A boxed, single-pass stream of reply chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A boxed stream of raw body bytes.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// One element of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamChunk {
    /// A fragment of the assistant's reply.
    Text(String),
    /// Something went wrong at this point of the stream.
    Diagnostic(Diagnostic),
}

impl StreamChunk {
    /// The text fragment, if this chunk carries one.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamChunk::Text(t) => Some(t),
            StreamChunk::Diagnostic(_) => None,
        }
    }

    /// The diagnostic, if this chunk carries one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            StreamChunk::Text(_) => None,
            StreamChunk::Diagnostic(d) => Some(d),
        }
    }

    /// True for a transport or backend failure, after which no further
    /// chunks follow.
    pub fn is_terminal(&self) -> bool {
        self.diagnostic().is_some_and(|d| d.kind.is_terminal())
    }

    /// Display form: the text itself, or an inline marker for a diagnostic.
    pub fn render(&self) -> String {
        match self {
            StreamChunk::Text(t) => t.clone(),
            StreamChunk::Diagnostic(d) => d.marker(),
        }
    }
}

impl From<TransportError> for StreamChunk {
    fn from(err: TransportError) -> Self {
        StreamChunk::Diagnostic(Diagnostic::new(DiagnosticKind::Transport, err.to_string()))
    }
}

impl From<DecodeError> for StreamChunk {
    fn from(err: DecodeError) -> Self {
        StreamChunk::Diagnostic(Diagnostic::new(DiagnosticKind::Decode, err.to_string()))
    }
}

/// Which layer produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Handshake, network or timeout failure. Terminal.
    Transport,
    /// A single malformed line. Non-fatal.
    Decode,
    /// The backend reported an error inside a well-formed record. Terminal.
    Backend,
}

impl DiagnosticKind {
    /// Whether the reply ends here and the turn is lost.
    pub fn is_terminal(self) -> bool {
        matches!(self, DiagnosticKind::Transport | DiagnosticKind::Backend)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Transport => "transport",
            DiagnosticKind::Decode => "decode",
            DiagnosticKind::Backend => "backend",
        })
    }
}

/// A user-visible description of a failure inside a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Inline marker shown in place of the missing text.
    pub fn marker(&self) -> String {
        format!("[{} error: {}]", self.kind, self.message)
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

/// One NDJSON record. Chat responses carry `message.content`, generate
/// responses carry `response`.
#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: String,
}

/// Decode one line of the response body.
///
/// Returns `None` for blank lines and for records with no text.
pub fn decode_line(line: &[u8]) -> Option<StreamChunk> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    let record: WireRecord = match serde_json::from_slice(line) {
        Ok(r) => r,
        Err(e) => {
            let err = DecodeError {
                detail: e.to_string(),
                line: String::from_utf8_lossy(line).into_owned(),
            };
            warn!("Skipping malformed stream line: {}", err);
            return Some(err.into());
        }
    };

    if let Some(message) = record.error {
        warn!("Backend reported an error mid-stream: {}", message);
        return Some(StreamChunk::Diagnostic(Diagnostic::new(
            DiagnosticKind::Backend,
            message,
        )));
    }

    if record.done {
        debug!(
            "Stream finished: {:?} prompt tokens, {:?} output tokens",
            record.prompt_eval_count, record.eval_count
        );
    }

    let fragment = record
        .message
        .map(|m| m.content)
        .or(record.response)
        .unwrap_or_default();

    if fragment.is_empty() {
        None
    } else {
        Some(StreamChunk::Text(fragment))
    }
}

/// Pull state for [`decode_body`].
struct LineDecoder {
    body: ByteStream,
    buf: Vec<u8>,
    terminal: Option<TransportError>,
    exhausted: bool,
    stopped: bool,
}

impl LineDecoder {
    /// Remove and return the next complete line, newline included.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        Some(self.buf.drain(..=pos).collect())
    }

    async fn next_chunk(&mut self) -> Option<StreamChunk> {
        if self.stopped {
            return None;
        }
        let chunk = self.pull().await?;
        if chunk.is_terminal() {
            // Whatever the backend sends after this is not part of the reply.
            self.stopped = true;
            self.buf.clear();
        }
        Some(chunk)
    }

    async fn pull(&mut self) -> Option<StreamChunk> {
        loop {
            while let Some(line) = self.take_line() {
                if let Some(chunk) = decode_line(&line) {
                    return Some(chunk);
                }
            }

            if let Some(err) = self.terminal.take() {
                self.exhausted = true;
                return Some(err.into());
            }

            if self.exhausted {
                // Trailing record without a final newline.
                let rest = std::mem::take(&mut self.buf);
                return decode_line(&rest);
            }

            match self.body.next().await {
                Some(Ok(bytes)) => self.buf.extend_from_slice(&bytes),
                Some(Err(err)) => {
                    warn!("Response body failed mid-stream: {}", err);
                    // An unterminated line is incomplete; drop it.
                    self.buf.clear();
                    self.terminal = Some(err);
                }
                None => self.exhausted = true,
            }
        }
    }
}

/// Turn a raw NDJSON body into a lazy stream of chunks.
pub fn decode_body(body: ByteStream) -> ChunkStream {
    let decoder = LineDecoder {
        body,
        buf: Vec::new(),
        terminal: None,
        exhausted: false,
        stopped: false,
    };

    let s = stream::unfold(decoder, |mut decoder| async move {
        let chunk = decoder.next_chunk().await?;
        Some((chunk, decoder))
    });

    Box::pin(s)
}

/// A stream holding a single transport failure.
pub fn failed(err: TransportError) -> ChunkStream {
    Box::pin(stream::iter([StreamChunk::from(err)]))
}
