//! Document store: uploaded documents and the context they add up to.
//!
//! The context only ever grows. Each upload appends its page texts, in page
//! order, after everything uploaded before it. No deduplication, no
//! whitespace cleanup: the model sees exactly what extraction produced.

use crate::config::ContextLayout;
use crate::error::{ChatPdfError, ExtractionError, PageError};
use crate::pipeline::extract::{self, LopdfExtractor, PageText, TextExtractor};
use crate::pipeline::input;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// An extracted document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    name: String,
    pages: Vec<String>,
    page_errors: Vec<PageError>,
}

impl Document {
    /// Assemble a document from per-page extraction results.
    ///
    /// Failed pages keep their slot with empty text; the failure is recorded
    /// in [`Document::page_errors`].
    pub fn from_pages(name: impl Into<String>, pages: Vec<PageText>) -> Self {
        let name = name.into();
        let mut texts = Vec::with_capacity(pages.len());
        let mut page_errors = Vec::new();

        for page in pages {
            match page {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!("'{}': {} (page left empty)", name, e);
                    texts.push(String::new());
                    page_errors.push(e);
                }
            }
        }

        Self {
            name,
            pages: texts,
            page_errors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Page texts in page order.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages that yielded no text, with the reason.
    pub fn page_errors(&self) -> &[PageError] {
        &self.page_errors
    }

    /// All page texts concatenated in page order.
    pub fn text(&self) -> String {
        self.pages.concat()
    }
}

/// Accumulates uploaded documents into one context string.
pub struct DocumentStore {
    extractor: Arc<dyn TextExtractor>,
    layout: ContextLayout,
    context: String,
    documents: Vec<Document>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(ContextLayout::default())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("layout", &self.layout)
            .field("context_len", &self.context.len())
            .field("documents", &self.documents.len())
            .finish()
    }
}

impl DocumentStore {
    /// A store using the `lopdf` extractor.
    pub fn new(layout: ContextLayout) -> Self {
        Self::with_extractor(Arc::new(LopdfExtractor), layout)
    }

    pub fn with_extractor(extractor: Arc<dyn TextExtractor>, layout: ContextLayout) -> Self {
        Self {
            extractor,
            layout,
            context: String::new(),
            documents: Vec::new(),
        }
    }

    /// Extract `bytes` into a [`Document`] on the current thread.
    pub fn ingest(&self, bytes: &[u8], name: &str) -> Result<Document, ExtractionError> {
        let pages = self.extractor.extract(name, bytes)?;
        Ok(Document::from_pages(name, pages))
    }

    /// Extract `bytes` into a [`Document`] on the blocking pool.
    pub async fn ingest_async(&self, bytes: Vec<u8>, name: &str) -> Result<Document, ChatPdfError> {
        let pages =
            extract::extract_blocking(Arc::clone(&self.extractor), name.to_string(), bytes).await?;
        Ok(Document::from_pages(name, pages))
    }

    /// Read a local PDF and extract it on the blocking pool.
    ///
    /// The document is named after the file name component of `path`.
    pub async fn ingest_path(&self, path: impl AsRef<Path>) -> Result<Document, ChatPdfError> {
        let local = input::read_local(path).await?;
        self.ingest_async(local.bytes, &local.name).await
    }

    /// Append `document`'s text to the end of the context and keep the document.
    ///
    /// Returns the updated context.
    pub fn append_to_context(&mut self, document: Document) -> &str {
        let contribution = self.layout.render(document.name(), &document.text());
        self.context.push_str(&contribution);
        info!(
            "Added '{}' ({} pages, {} chars); context is now {} chars",
            document.name(),
            document.page_count(),
            contribution.len(),
            self.context.len()
        );
        self.documents.push(document);
        &self.context
    }

    /// The accumulated context.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Documents in upload order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn layout(&self) -> ContextLayout {
        self.layout
    }
}
