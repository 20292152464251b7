//! Minimal end-to-end demo with a console-backed sink standing in for a
//! real chat channel: each "message" is printed, and edits reprint it.
//!
//! Run with `cargo run --example console_channel`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use channel_relay::{
    ChannelRelay, ChannelSink, FlushScheduler, LogEvent, LogLevel, MessageHandle, RelayConfig,
    SinkError,
};

struct ConsoleSink {
    next_id: AtomicU64,
}

#[async_trait]
impl ChannelSink for ConsoleSink {
    async fn send(&self, body: &str) -> Result<MessageHandle, SinkError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        println!("--- new message {id} ---\n{body}\n");
        Ok(MessageHandle::new(id.to_string()))
    }

    async fn edit(&self, handle: &MessageHandle, body: &str) -> Result<MessageHandle, SinkError> {
        println!("--- edit message {} ---\n{body}\n", handle.as_str());
        Ok(handle.clone())
    }

    fn max_message_len(&self) -> usize {
        2000
    }
}

#[tokio::main]
async fn main() {
    let mut config = RelayConfig::new();
    config.map_logger_name_friendly("demo");

    let sink = Arc::new(ConsoleSink {
        next_id: AtomicU64::new(1),
    });
    let relay = Arc::new(ChannelRelay::new(sink, config));
    let scheduler = FlushScheduler::start_with_period(Arc::clone(&relay), Duration::from_millis(200));

    relay.enqueue(LogEvent::new("demo.startup", LogLevel::Info, "service ready"));
    relay.enqueue(LogEvent::new(
        "demo.worker",
        LogLevel::Warn,
        "queue depth above watermark",
    ));
    tokio::time::sleep(Duration::from_millis(300)).await;

    relay.enqueue(LogEvent::new(
        "demo.worker",
        LogLevel::Error,
        format!("dump follows {}", "x".repeat(2500)),
    ));
    tokio::time::sleep(Duration::from_millis(300)).await;

    scheduler.shutdown().await;
}
