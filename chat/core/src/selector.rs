//! Transport Selection
//!
//! Picks the transport for one whole submission from the stored credential.
//! A missing credential is not an error; it means "use the socket".

use serde::{Deserialize, Serialize};

/// Which transport carries a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportKind {
    /// Single-shot completion request (credential present)
    Completion,
    /// Streaming socket (no credential)
    Stream,
}

/// Choose the transport for a submission.
///
/// An empty credential counts as absent.
#[must_use]
pub fn select_transport(credential: Option<&str>) -> TransportKind {
    match credential {
        Some(value) if !value.is_empty() => TransportKind::Completion,
        _ => TransportKind::Stream,
    }
}
