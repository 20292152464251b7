//! The channel sink seam: the narrow interface the relay requires from the
//! transport that actually delivers messages to the remote channel.
//!
//! The sink owns authentication, rate limiting, and any wire protocol; the
//! relay only asks it to send a new message, edit an existing one, and
//! report the channel's per-message character ceiling. Implementations are
//! supplied by the hosting application; tests use in-process mocks.

use async_trait::async_trait;

/// Opaque identifier for a message the sink has delivered, used to edit it
/// in place on later flushes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle(String);

impl MessageHandle {
    pub fn new(id: impl Into<String>) -> Self {
        MessageHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Errors a sink operation can report.
///
/// `NotFound` and `ContentBlocked` are recoverable: the lifecycle retries
/// each exactly once (fresh send, URL-stripped body respectively). Anything
/// else is fatal for the current flush cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The target message no longer exists on the remote channel.
    #[error("remote message no longer exists")]
    NotFound,

    /// The channel's content filter rejected the payload, typically a
    /// spam/phishing-link filter.
    #[error("message content rejected by the channel's content filter")]
    ContentBlocked,

    /// Any other transport failure.
    #[error("channel sink error: {0}")]
    Other(String),
}

/// Transport interface to the remote text channel.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    /// Posts a new message and returns its handle.
    async fn send(&self, body: &str) -> Result<MessageHandle, SinkError>;

    /// Replaces the body of an existing message, returning the (possibly
    /// refreshed) handle.
    async fn edit(&self, handle: &MessageHandle, body: &str) -> Result<MessageHandle, SinkError>;

    /// Channel-imposed character ceiling for a single message.
    fn max_message_len(&self) -> usize;
}
