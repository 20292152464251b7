//! Relays application log events to a remote, size-constrained text
//! channel, batching many log lines into as few outbound messages as
//! possible.
//!
//! # Architecture
//!
//! The relay implements a multi-stage pipeline driven by a periodic flush
//! cycle:
//!
//! ```text
//!    Producers (adapters, app code)
//!         │ enqueue
//!         v
//!   ┌──────────────┐
//!   │ Inbound queue │ (unbounded, lock-free)
//!   └──────┬───────┘
//!          │ flush cycle (one mutex, one writer)
//!          v
//!   ┌──────────────┐
//!   │  Processing  │ (level filter, logger mapping, transformers)
//!   └──────┬───────┘
//!          │
//!          v
//!   ┌──────────────┐
//!   │   Clipper    │ (split oversized events into budget-fitting pieces)
//!   └──────┬───────┘
//!          │
//!          v
//!   ┌──────────────┐
//!   │    Packer    │ (bin-fit pieces into per-message stacks)
//!   └──────┬───────┘
//!          │
//!          v
//!   ┌──────────────┐
//!   │  Lifecycle   │ (send new message or edit the open one)
//!   └──────┬───────┘
//!          │
//!          v
//!      ChannelSink  (owned by the hosting application)
//! ```
//!
//! A burst of enqueued events coalesces into a single remote write per
//! flush cycle: the open channel message is edited in place until its
//! character budget runs out, then a fresh message is started. Delivery is
//! at-least-once; the current message is deduplicated through edits, but no
//! state survives a process restart.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use channel_relay::{ChannelRelay, FlushScheduler, LogEvent, LogLevel, RelayConfig};
//! # use channel_relay::{ChannelSink, MessageHandle, SinkError};
//! # struct MySink;
//! # #[async_trait::async_trait]
//! # impl ChannelSink for MySink {
//! #     async fn send(&self, _: &str) -> Result<MessageHandle, SinkError> { unimplemented!() }
//! #     async fn edit(&self, _: &MessageHandle, _: &str) -> Result<MessageHandle, SinkError> { unimplemented!() }
//! #     fn max_message_len(&self) -> usize { 2000 }
//! # }
//!
//! # #[tokio::main] async fn main() {
//! let mut config = RelayConfig::new();
//! config.map_logger_name("net.dv8tion.jda", "JDA");
//!
//! let relay = Arc::new(ChannelRelay::new(Arc::new(MySink), config));
//! let scheduler = FlushScheduler::start(Arc::clone(&relay));
//!
//! relay.enqueue(LogEvent::new("app.startup", LogLevel::Info, "ready"));
//!
//! scheduler.shutdown().await;
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod relay;
pub mod scheduler;
pub mod sink;

mod clip;
mod format;
mod lifecycle;
mod stack;

pub use config::RelayConfig;
pub use error::RelayError;
pub use event::{ErrorInfo, LogEvent, LogLevel};
pub use relay::ChannelRelay;
pub use scheduler::FlushScheduler;
pub use sink::{ChannelSink, MessageHandle, SinkError};
