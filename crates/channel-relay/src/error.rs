//! Error taxonomy for the relay pipeline.
//!
//! Recoverable delivery conditions (`NotFound`, `ContentBlocked`) are
//! retried inside the lifecycle and never surface here; everything in
//! [`RelayError`] is fatal for the flush cycle that produced it. Filtered
//! events and cancelled deliveries are expected outcomes, not errors.

use crate::sink::SinkError;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The configured prefix/suffix/error-dump overhead alone reaches the
    /// per-message budget, leaving no room for message text. Indicates an
    /// inconsistency between the formatting configuration and the channel
    /// budget; splitting further would loop forever.
    #[error("formatting overhead of {overhead} chars leaves no room for content within the {budget}-char message budget")]
    FormattingOverflow { overhead: usize, budget: usize },

    /// An event could not be reduced under the per-message budget within
    /// the allowed number of continuation pieces.
    #[error("log event still exceeds the {budget}-char message budget after {max_pieces} pieces")]
    ClippingExhausted { budget: usize, max_pieces: usize },

    /// A single already-clipped event cannot fit an empty stack. Only
    /// reachable when clipping is misconfigured upstream.
    #[error("log event cannot fit an empty message stack: {detail}")]
    PackingImpossible { detail: String },

    /// The sink failed with an unrecoverable error; the cycle is abandoned
    /// and queue state is preserved for the next flush.
    #[error("message delivery failed: {0}")]
    Delivery(#[from] SinkError),
}
