//! One-shot completion through a hosted provider (OpenAI, Anthropic, Gemini, …).
//!
//! Hosted providers are called without streaming: the whole reply arrives at
//! once and is yielded as a single text chunk. Errors take the same shape as
//! the streaming transport (one terminal diagnostic) so the session handles
//! both backends identically. An empty reply counts as a backend failure.

use crate::error::{ChatPdfError, TransportError};
use crate::pipeline::transport::ChatBackend;
use crate::stream::{self, ChunkStream, Diagnostic, DiagnosticKind, StreamChunk};
use crate::transcript::{Message, Role};
use edgequake_llm::{ChatMessage, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// [`ChatBackend`] over an `edgequake_llm` provider.
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderBackend {
    /// Wrap a pre-constructed provider.
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            label: "custom provider".to_string(),
        }
    }

    /// Instantiate a named provider with the given model.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, ChatPdfError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            ChatPdfError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;

        Ok(Self {
            provider,
            label: format!("{provider_name} ({model})"),
        })
    }

    async fn complete(&self, transcript: &[Message]) -> ChunkStream {
        let messages: Vec<ChatMessage> = transcript.iter().map(to_chat_message).collect();
        info!("Sending {} messages to {}", messages.len(), self.label);

        match self.provider.chat(&messages, None).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens",
                    self.label, response.prompt_tokens, response.completion_tokens
                );
                if response.content.is_empty() {
                    let diag = Diagnostic::new(DiagnosticKind::Backend, "No response from provider");
                    Box::pin(futures::stream::iter([StreamChunk::Diagnostic(diag)]))
                } else {
                    Box::pin(futures::stream::iter([StreamChunk::Text(response.content)]))
                }
            }
            Err(e) => {
                warn!("{}: completion failed: {}", self.label, e);
                stream::failed(TransportError::Provider(e.to_string()))
            }
        }
    }
}

impl ChatBackend for ProviderBackend {
    fn send<'a>(&'a self, transcript: &'a [Message]) -> BoxFuture<'a, ChunkStream> {
        Box::pin(self.complete(transcript))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    match message.role() {
        Role::System => ChatMessage::system(message.content()),
        Role::User => ChatMessage::user(message.content()),
        Role::Assistant => ChatMessage::assistant(message.content()),
    }
}
