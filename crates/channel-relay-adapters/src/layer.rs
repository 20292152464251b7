//! Tracing adapter: mirrors `tracing` events into the relay.
//!
//! The layer is registered explicitly on a subscriber; each event's target
//! becomes the logger name and its `message` field becomes the relayed
//! text. `TRACE` events have no channel-side severity and are skipped.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use channel_relay::{ChannelRelay, ErrorInfo, LogEvent, LogLevel};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Mirrors tracing events into a [`ChannelRelay`].
///
/// ```ignore
/// use tracing_subscriber::prelude::*;
///
/// tracing_subscriber::registry()
///     .with(RelayLayer::new(Arc::clone(&relay)))
///     .init();
/// ```
pub struct RelayLayer {
    relay: Arc<ChannelRelay>,
}

impl RelayLayer {
    pub fn new(relay: Arc<ChannelRelay>) -> Self {
        RelayLayer { relay }
    }
}

fn map_level(level: &Level) -> Option<LogLevel> {
    if *level == Level::ERROR {
        Some(LogLevel::Error)
    } else if *level == Level::WARN {
        Some(LogLevel::Warn)
    } else if *level == Level::INFO {
        Some(LogLevel::Info)
    } else if *level == Level::DEBUG {
        Some(LogLevel::Debug)
    } else {
        None
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    error: Option<ErrorInfo>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(LogEvent::strip_ansi(value));
        }
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn std::error::Error + 'static)) {
        if self.error.is_none() {
            self.error = Some(ErrorInfo::from_error(value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" && self.message.is_none() {
            self.message = Some(LogEvent::strip_ansi(&format!("{value:?}")));
        }
    }
}

impl<S: Subscriber> Layer<S> for RelayLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(level) = map_level(event.metadata().level()) else {
            return;
        };

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        if visitor.message.is_none() && visitor.error.is_none() {
            return;
        }

        self.relay.enqueue(LogEvent::with_parts(
            event.metadata().target(),
            now_millis(),
            level,
            visitor.message,
            visitor.error,
        ));
    }
}
