//! Per-page text extraction.
//!
//! Extraction is a black box behind [`TextExtractor`]: bytes in, one result per
//! page out, in page order. The default [`LopdfExtractor`] is pure Rust and
//! needs no native library.
//!
//! A document either opens or it does not ([`ExtractionError`]). Once open,
//! every page yields either text or a [`PageError`]; one unreadable page never
//! costs the rest of the document.

use crate::error::{ChatPdfError, ExtractionError, PageError};
use lopdf::Document;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extraction result for one page.
pub type PageText = Result<String, PageError>;

/// Turns document bytes into ordered per-page text.
pub trait TextExtractor: Send + Sync {
    /// Extract every page of `bytes`. `name` is used in errors and logs only.
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError>;
}

/// [`TextExtractor`] backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        check_magic(name, bytes)?;

        let document = Document::load_mem(bytes).map_err(|e| ExtractionError::CorruptPdf {
            name: name.to_string(),
            detail: e.to_string(),
        })?;

        if document.trailer.get(b"Encrypt").is_ok() {
            return Err(ExtractionError::Encrypted {
                name: name.to_string(),
            });
        }

        let pages = document.get_pages();
        info!("PDF '{}' loaded: {} pages", name, pages.len());

        let texts = pages
            .keys()
            .map(|&page_num| -> PageText {
                let text = document.extract_text(&[page_num]).map_err(|e| {
                    warn!("'{}' page {}: {}", name, page_num, e);
                    PageError::ExtractFailed {
                        page: page_num as usize,
                        detail: e.to_string(),
                    }
                })?;
                // lopdf reports an undecodable content stream as an empty page.
                if text.trim().is_empty() {
                    return Err(PageError::NoText {
                        page: page_num as usize,
                    });
                }
                debug!("Page {}: {} chars", page_num, text.len());
                Ok(text)
            })
            .collect();

        Ok(texts)
    }
}

/// Reject bytes that do not start with `%PDF`.
fn check_magic(name: &str, bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(ExtractionError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Run `extractor` on the blocking pool.
///
/// PDF parsing is CPU-bound; running it on a Tokio worker would stall every
/// other task on that thread.
pub async fn extract_blocking(
    extractor: Arc<dyn TextExtractor>,
    name: String,
    bytes: Vec<u8>,
) -> Result<Vec<PageText>, ChatPdfError> {
    let pages = tokio::task::spawn_blocking(move || extractor.extract(&name, &bytes))
        .await
        .map_err(|e| ChatPdfError::Internal(format!("Extraction task panicked: {}", e)))??;
    Ok(pages)
}
