//! Message lifecycle: tracks the currently-open outbound message and
//! decides between editing it in place and posting a fresh one.
//!
//! Two sink failures are recoverable, each retried exactly once per
//! delivery: a missing remote message (someone deleted it) clears the open
//! handle and falls back to a fresh send, and a content-filter rejection
//! strips URL schemes from the body and resends. Any other failure is
//! surfaced to the caller with the open handle untouched, so the next flush
//! retries the same delivery. The handle is only written after a completed
//! sink call, which keeps a cancelled in-flight delivery from corrupting
//! state.

use tracing::debug;

use crate::constants::URL_RE;
use crate::sink::{ChannelSink, MessageHandle, SinkError};

/// De-links a body that tripped the channel's harmful-link filter by
/// dropping every URL scheme, leaving the readable remainder.
fn strip_url_schemes(body: &str) -> String {
    URL_RE.replace_all(body, "$1").into_owned()
}

#[derive(Debug, Default)]
pub(crate) struct MessageLifecycle {
    current: Option<MessageHandle>,
}

impl MessageLifecycle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn current(&self) -> Option<&MessageHandle> {
        self.current.as_ref()
    }

    /// Forgets the open message; the next delivery starts a fresh one.
    pub(crate) fn reset(&mut self) {
        self.current = None;
    }

    async fn send_or_edit(
        &self,
        sink: &dyn ChannelSink,
        body: &str,
    ) -> Result<MessageHandle, SinkError> {
        match &self.current {
            Some(handle) => sink.edit(handle, body).await,
            None => sink.send(body).await,
        }
    }

    /// Delivers `body` to the channel, editing the open message when one
    /// exists. On success the returned handle becomes the open message.
    pub(crate) async fn deliver(
        &mut self,
        sink: &dyn ChannelSink,
        body: &str,
    ) -> Result<(), SinkError> {
        match self.send_or_edit(sink, body).await {
            Ok(handle) => {
                self.current = Some(handle);
                Ok(())
            }
            Err(SinkError::NotFound) => {
                debug!("open message is gone from the channel, falling back to a fresh send");
                self.current = None;
                let handle = self.send_or_edit(sink, body).await?;
                self.current = Some(handle);
                Ok(())
            }
            Err(SinkError::ContentBlocked) => {
                debug!("content filter rejected the payload, retrying without links");
                let stripped = strip_url_schemes(body);
                let handle = self.send_or_edit(sink, &stripped).await?;
                self.current = Some(handle);
                Ok(())
            }
            Err(other) => Err(other),
        }
    }
}
