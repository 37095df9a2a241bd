//! Streaming chat transport: POST the transcript, stream the reply.
//!
//! ## Protocol
//!
//! Request: `{"model": ..., "messages": [{"role", "content"}...], "stream": true}`.
//! Response: newline-delimited JSON records, one text fragment each, ending
//! when the server closes the connection.
//!
//! Failures never surface as `Err`. A refused handshake, an unreachable host or
//! a timeout becomes a single [`crate::stream::DiagnosticKind::Transport`]
//! chunk, so callers display every outcome through the same loop.

use crate::config::ChatConfig;
use crate::error::{ChatPdfError, TransportError};
use crate::stream::{self, ChunkStream};
use crate::transcript::Message;
use futures::future::BoxFuture;
use futures::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Something that answers a transcript with a stream of chunks.
pub trait ChatBackend: Send + Sync {
    /// Send `transcript` and return the reply stream.
    ///
    /// The returned stream is single-pass; dropping it abandons the reply and
    /// releases the underlying connection.
    fn send<'a>(&'a self, transcript: &'a [Message]) -> BoxFuture<'a, ChunkStream>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// HTTP client for an Ollama-compatible `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct StreamingChatClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl StreamingChatClient {
    /// Build a client from the session configuration.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatPdfError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ChatPdfError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self::with_client(http, &config.endpoint, &config.model))
    }

    /// Use an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POST `transcript` and stream the reply.
    pub async fn stream_chat(&self, transcript: &[Message]) -> ChunkStream {
        let request = ChatRequest {
            model: &self.model,
            messages: transcript,
            stream: true,
        };

        info!(
            "Sending {} messages to {} (model {})",
            transcript.len(),
            self.endpoint,
            self.model
        );

        let response = match self.http.post(&self.endpoint).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                let err = TransportError::from_reqwest(&self.endpoint, &e);
                warn!("Request failed: {}", err);
                return stream::failed(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            let err = TransportError::Handshake {
                status: status.as_u16(),
                body,
            };
            warn!("Handshake refused: {}", err);
            return stream::failed(err);
        }

        let endpoint = self.endpoint.clone();
        let body = response.bytes_stream().map(move |read| {
            read.map(|bytes| bytes.to_vec())
                .map_err(|e| TransportError::from_reqwest(&endpoint, &e))
        });

        stream::decode_body(Box::pin(body))
    }
}

impl ChatBackend for StreamingChatClient {
    fn send<'a>(&'a self, transcript: &'a [Message]) -> BoxFuture<'a, ChunkStream> {
        Box::pin(self.stream_chat(transcript))
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.endpoint, self.model)
    }
}
