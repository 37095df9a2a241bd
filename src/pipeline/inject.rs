//! Context injection: the transcript always opens with the current context.
//!
//! The system entry is refreshed before every send rather than captured once,
//! so documents uploaded between turns reach the model on the next turn.

use crate::transcript::TranscriptLog;
use tracing::debug;

/// Ensure `transcript` starts with exactly one system message holding `context`.
///
/// Inserts the entry at index 0 when missing and replaces its content when
/// present. Calling it again with the same context changes nothing.
///
/// An empty context still produces an (empty) system entry; sending without
/// any uploaded document is allowed.
pub fn prepare_transcript(transcript: &mut TranscriptLog, context: &str) {
    if context.is_empty() {
        debug!("No documents uploaded; sending with an empty context");
    }
    transcript.set_system(context);
}
