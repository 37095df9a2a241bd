//! Configuration types for a chat session.
//!
//! All session behaviour is controlled through [`ChatConfig`], built via its
//! [`ChatConfigBuilder`]. There is no configuration file: the endpoint and the
//! model are runtime strings, validated only for non-emptiness.

use crate::error::ChatPdfError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default Ollama chat endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/chat";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Configuration for a [`crate::session::ChatSession`].
///
/// # Example
/// ```rust
/// use chatty_pdf::ChatConfig;
///
/// let config = ChatConfig::builder()
///     .endpoint("http://localhost:11434/api/chat")
///     .model("llama3.2")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ChatConfig {
    /// URL of the streaming chat endpoint. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Model identifier sent with every request. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Whole-request timeout in seconds, body read included. Default: 300.
    ///
    /// Local models can take minutes to stream a long answer over a large
    /// context, so this is deliberately generous.
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// How document text is laid out in the context. Default: [`ContextLayout::Plain`].
    pub context_layout: ContextLayout,

    /// Hosted provider name (e.g. "openai", "anthropic", "gemini").
    ///
    /// When set, sends go through a one-shot
    /// [`crate::pipeline::provider::ProviderBackend`] instead of the streaming
    /// HTTP endpoint.
    pub provider_name: Option<String>,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: 300,
            connect_timeout_secs: 10,
            context_layout: ContextLayout::default(),
            provider_name: None,
            provider: None,
        }
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("context_layout", &self.context_layout)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .finish()
    }
}

impl ChatConfig {
    /// Create a new builder for `ChatConfig`.
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ChatConfig`].
#[derive(Debug)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs.max(1);
        self
    }

    pub fn context_layout(mut self, layout: ContextLayout) -> Self {
        self.config.context_layout = layout;
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ChatConfig, ChatPdfError> {
        let c = &self.config;
        if c.endpoint.trim().is_empty() {
            return Err(ChatPdfError::InvalidConfig(
                "Endpoint must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(ChatPdfError::InvalidConfig("Model must not be empty".into()));
        }
        if matches!(c.provider_name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(ChatPdfError::InvalidConfig(
                "Provider name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How each uploaded document's text is laid out in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContextLayout {
    /// Page texts concatenated exactly as extracted. (default)
    #[default]
    Plain,
    /// Each document prefixed with `### File: <name>` and followed by a blank line.
    Headed,
}

impl ContextLayout {
    /// Render one document's contribution to the context.
    pub fn render(&self, name: &str, body: &str) -> String {
        match self {
            ContextLayout::Plain => body.to_string(),
            ContextLayout::Headed => format!("### File: {name}\n\n{body}\n\n"),
        }
    }
}
