//! Display-callback trait for session events.
//!
//! Inject an [`Arc<dyn ChatDisplay>`] via
//! [`crate::session::ChatSession::with_display`] to receive events as documents
//! are ingested and replies stream in.
//!
//! The callbacks are for presentation only. The transcript is updated by the
//! session once a reply is complete, whatever a display does with the
//! fragments it sees along the way.
//!
//! # Example
//!
//! ```rust
//! use chatty_pdf::{ChatDisplay, StreamChunk};
//! use std::io::Write;
//!
//! struct Stdout;
//!
//! impl ChatDisplay for Stdout {
//!     fn on_chunk(&self, chunk: &StreamChunk) {
//!         print!("{}", chunk.render());
//!         std::io::stdout().flush().ok();
//!     }
//! }
//! ```

use crate::pipeline::context::Document;
use crate::session::Reply;
use crate::stream::StreamChunk;
use std::sync::Arc;

/// Called by [`crate::session::ChatSession`] as it works.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ChatDisplay: Send + Sync {
    /// Called after a document has been extracted and added to the context.
    fn on_document_ingested(&self, document: &Document) {
        let _ = document;
    }

    /// Called just before a transcript of `message_count` messages is sent.
    fn on_send_start(&self, message_count: usize) {
        let _ = message_count;
    }

    /// Called once per streamed chunk, in stream order.
    fn on_chunk(&self, chunk: &StreamChunk) {
        let _ = chunk;
    }

    /// Called once the stream is exhausted.
    fn on_turn_complete(&self, reply: &Reply) {
        let _ = reply;
    }
}

/// A display that ignores every event. The session default.
pub struct NoopDisplay;

impl ChatDisplay for NoopDisplay {}

/// Convenience alias matching the type stored in the session.
pub type DisplayHandle = Arc<dyn ChatDisplay>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        chunks: Mutex<Vec<String>>,
        turns: Mutex<usize>,
    }

    impl ChatDisplay for Recorder {
        fn on_chunk(&self, chunk: &StreamChunk) {
            self.chunks.lock().unwrap().push(chunk.render());
        }

        fn on_turn_complete(&self, _reply: &Reply) {
            *self.turns.lock().unwrap() += 1;
        }
    }

    #[test]
    fn noop_display_does_not_panic() {
        let d = NoopDisplay;
        d.on_document_ingested(&Document::from_pages("a.pdf", vec![Ok("x".into())]));
        d.on_send_start(2);
        d.on_chunk(&StreamChunk::Text("hi".into()));
        d.on_turn_complete(&Reply::default());
    }

    #[test]
    fn recorder_sees_chunks_in_order() {
        let r = Recorder::default();
        r.on_chunk(&StreamChunk::Text("a".into()));
        r.on_chunk(&StreamChunk::Text("b".into()));
        r.on_turn_complete(&Reply::default());

        assert_eq!(*r.chunks.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(*r.turns.lock().unwrap(), 1);
    }

    #[test]
    fn arc_dyn_display_works() {
        let d: DisplayHandle = Arc::new(NoopDisplay);
        d.on_send_start(1);
    }
}
