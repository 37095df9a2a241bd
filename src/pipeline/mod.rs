//! Pipeline stages for chatting with PDF documents.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and swapped (another extractor, another backend) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ context ──▶ inject ──▶ transport ──▶ transcript
//! (path)    (lopdf)     (store)    (system)   (NDJSON)      (log)
//! ```
//!
//! 1. [`input`]     — read a user-supplied local path into bytes
//! 2. [`extract`]   — per-page text extraction; runs in `spawn_blocking`
//!    because PDF parsing is CPU-bound
//! 3. [`context`]   — accumulate document text into the session context
//! 4. [`inject`]    — keep exactly one system entry, carrying the context, at
//!    the head of the transcript
//! 5. [`transport`] — POST the transcript and stream the reply; the only stage
//!    with network I/O (alongside [`provider`] for hosted one-shot providers)

pub mod context;
pub mod extract;
pub mod inject;
pub mod input;
pub mod provider;
pub mod transport;
