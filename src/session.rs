//! Chat session: the handle threaded through every upload and send.
//!
//! A [`ChatSession`] owns the document store, the transcript and the backend
//! for one user. Every mutating method takes `&mut self`, so the borrow checker
//! guarantees one outstanding operation at a time: a new send cannot start
//! while a previous reply is still being consumed.
//!
//! ## Turn atomicity
//!
//! The user message and the assistant reply are appended together, after the
//! stream is exhausted. A transport or backend failure, or dropping the `send`
//! future halfway, appends nothing: the transcript holds whole turns only.

use crate::config::ChatConfig;
use crate::display::{DisplayHandle, NoopDisplay};
use crate::error::ChatPdfError;
use crate::pipeline::context::{Document, DocumentStore};
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::inject::prepare_transcript;
use crate::pipeline::provider::ProviderBackend;
use crate::pipeline::transport::{ChatBackend, StreamingChatClient};
use crate::stream::{Diagnostic, StreamChunk};
use crate::transcript::{Message, TranscriptLog};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Everything a backend streamed back for one send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    chunks: Vec<StreamChunk>,
}

impl Reply {
    pub fn push(&mut self, chunk: StreamChunk) {
        self.chunks.push(chunk);
    }

    /// Chunks in arrival order.
    pub fn chunks(&self) -> &[StreamChunk] {
        &self.chunks
    }

    /// The assistant's text: every text fragment, concatenated in order.
    pub fn text(&self) -> String {
        self.chunks.iter().filter_map(StreamChunk::text).collect()
    }

    /// Text with diagnostics shown inline where they occurred.
    pub fn rendered(&self) -> String {
        self.chunks.iter().map(StreamChunk::render).collect()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.chunks.iter().filter_map(StreamChunk::diagnostic)
    }

    /// True when the transport or the backend failed and the turn was not
    /// recorded.
    pub fn is_failed(&self) -> bool {
        self.chunks.iter().any(StreamChunk::is_terminal)
    }
}

/// Session-scoped state: context, transcript and backend.
pub struct ChatSession {
    store: DocumentStore,
    transcript: TranscriptLog,
    backend: Arc<dyn ChatBackend>,
    display: DisplayHandle,
}

impl ChatSession {
    /// Create a session, picking the backend from `config`.
    ///
    /// A configured provider (or provider name) selects a one-shot
    /// [`ProviderBackend`]; otherwise replies stream from `config.endpoint`.
    pub fn new(config: ChatConfig) -> Result<Self, ChatPdfError> {
        let backend = resolve_backend(&config)?;
        Ok(Self::with_backend(&config, backend))
    }

    /// Create a session around an existing backend.
    pub fn with_backend(config: &ChatConfig, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            store: DocumentStore::new(config.context_layout),
            transcript: TranscriptLog::new(),
            backend,
            display: Arc::new(NoopDisplay),
        }
    }

    /// Replace the text extractor. Documents already uploaded are kept.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        let layout = self.store.layout();
        let mut store = DocumentStore::with_extractor(extractor, layout);
        for document in self.store.documents().to_vec() {
            store.append_to_context(document);
        }
        self.store = store;
        self
    }

    /// Route session events to `display`.
    pub fn with_display(mut self, display: DisplayHandle) -> Self {
        self.display = display;
        self
    }

    /// The accumulated document context.
    pub fn context(&self) -> &str {
        self.store.context()
    }

    /// The transcript, for display.
    pub fn transcript(&self) -> &[Message] {
        self.transcript.render()
    }

    /// Documents in upload order.
    pub fn documents(&self) -> &[Document] {
        self.store.documents()
    }

    /// Extract `bytes` and append its text to the context.
    pub async fn upload(&mut self, name: &str, bytes: Vec<u8>) -> Result<&Document, ChatPdfError> {
        let document = self.store.ingest_async(bytes, name).await?;
        self.commit(document)
    }

    /// Read a local PDF and upload it.
    pub async fn upload_path(&mut self, path: impl AsRef<Path>) -> Result<&Document, ChatPdfError> {
        let document = self.store.ingest_path(path).await?;
        self.commit(document)
    }

    fn commit(&mut self, document: Document) -> Result<&Document, ChatPdfError> {
        self.store.append_to_context(document);

        let document = self
            .store
            .documents()
            .last()
            .ok_or_else(|| ChatPdfError::Internal("document vanished after append".into()))?;
        self.display.on_document_ingested(document);
        Ok(document)
    }

    /// Upload several documents in submission order.
    ///
    /// A document that fails does not stop the ones after it.
    pub async fn upload_all(
        &mut self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Vec<Result<Document, ChatPdfError>> {
        let mut results = Vec::with_capacity(files.len());
        for (name, bytes) in files {
            let result = self.upload(&name, bytes).await.map(Document::clone);
            if let Err(ref e) = result {
                warn!("Upload of '{}' failed: {}", name, e);
            }
            results.push(result);
        }
        results
    }

    /// Send `prompt` with the current context and stream the reply.
    ///
    /// Transport, backend and decode failures are reported inside the
    /// returned [`Reply`], never as `Err`. On a transport or backend failure
    /// the transcript is left as it was, apart from the refreshed context
    /// entry.
    pub async fn send(&mut self, prompt: &str) -> Result<Reply, ChatPdfError> {
        if prompt.trim().is_empty() {
            return Err(ChatPdfError::EmptyPrompt);
        }

        let start = Instant::now();
        prepare_transcript(&mut self.transcript, self.store.context());

        let user = Message::user(prompt);
        let mut outgoing = self.transcript.render().to_vec();
        outgoing.push(user.clone());

        self.display.on_send_start(outgoing.len());
        info!(
            "Turn {}: {} context chars via {}",
            self.transcript.turns().len() / 2 + 1,
            self.store.context().len(),
            self.backend.describe()
        );

        let mut reply = Reply::default();
        let mut chunks = self.backend.send(&outgoing).await;
        while let Some(chunk) = chunks.next().await {
            self.display.on_chunk(&chunk);
            reply.push(chunk);
        }
        drop(chunks);

        if reply.is_failed() {
            warn!(
                "Turn not recorded: {}",
                reply
                    .diagnostics()
                    .map(|d| d.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        } else {
            self.transcript.append(user)?;
            self.transcript.append(Message::assistant(reply.text()))?;
            info!(
                "Turn complete: {} chars in {}ms",
                reply.text().len(),
                start.elapsed().as_millis()
            );
        }

        self.display.on_turn_complete(&reply);
        Ok(reply)
    }
}

/// Pick the backend `config` asks for.
fn resolve_backend(config: &ChatConfig) -> Result<Arc<dyn ChatBackend>, ChatPdfError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderBackend::new(Arc::clone(provider))));
    }

    if let Some(ref name) = config.provider_name {
        return Ok(Arc::new(ProviderBackend::from_name(name, &config.model)?));
    }

    Ok(Arc::new(StreamingChatClient::new(config)?))
}
