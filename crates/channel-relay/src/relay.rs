//! The relay engine: ingestion, drain-time processing, bin packing, and
//! delivery, glued together behind two entry points.
//!
//! `enqueue` is callable from any thread and never blocks; it only appends
//! to an unbounded inbound queue. All other work happens inside `flush`,
//! which holds the single state mutex for the whole cycle: drain the
//! inbound queue, filter/transform/clip each event, pack the results into
//! stacks, and deliver through the sink. Concurrent flushes serialize on
//! the mutex; they never run in parallel.
//!
//! The inbound queue is unbounded by design. Backpressure is deliberately
//! not implemented: a slow sink grows memory instead of stalling producer
//! threads, which is the accepted tradeoff for a logging path.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

use crate::clip::split_to_budget;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::event::LogEvent;
use crate::format::formatted_len;
use crate::lifecycle::MessageLifecycle;
use crate::sink::ChannelSink;
use crate::stack::MessageStack;

struct FlushState {
    inbound_rx: UnboundedReceiver<LogEvent>,
    outbound: VecDeque<LogEvent>,
    stack: MessageStack,
    dirty: bool,
    lifecycle: MessageLifecycle,
}

/// Relays log events to a size-constrained remote text channel, batching
/// them into as few outbound messages as possible.
pub struct ChannelRelay {
    config: RelayConfig,
    sink: Arc<dyn ChannelSink>,
    inbound_tx: UnboundedSender<LogEvent>,
    state: Mutex<FlushState>,
}

impl ChannelRelay {
    pub fn new(sink: Arc<dyn ChannelSink>, config: RelayConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        ChannelRelay {
            config,
            sink,
            inbound_tx,
            state: Mutex::new(FlushState {
                inbound_rx,
                outbound: VecDeque::new(),
                stack: MessageStack::new(),
                dirty: false,
                lifecycle: MessageLifecycle::new(),
            }),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Hands an event to the relay. Never blocks and never fails; all
    /// filtering and budget work happens later, inside the flush cycle.
    pub fn enqueue(&self, event: LogEvent) {
        let _ = self.inbound_tx.send(event);
    }

    /// Per-message budget the clipper works against: the sink's ceiling
    /// minus the configured headroom.
    fn clip_budget(&self) -> usize {
        self.sink
            .max_message_len()
            .saturating_sub(self.config.clip_headroom)
    }

    /// Continuations allowed per event: enough pieces to cover the largest
    /// permitted multi-message burst.
    fn max_continuations(&self) -> usize {
        let per_message = self.sink.max_message_len().max(1);
        self.config
            .batch_total_budget
            .saturating_sub(per_message)
            .div_ceil(per_message)
    }

    /// Filters, transforms, and clips one drained event. Returns `None`
    /// when the event is dropped by level, logger mapping, or a filtering
    /// transformer.
    fn process(&self, event: LogEvent) -> Result<Option<Vec<LogEvent>>, RelayError> {
        if !self.config.accepts_level(event.level) {
            return Ok(None);
        }
        if self.config.resolve_logger_name(&event.logger).is_none() {
            return Ok(None);
        }

        let mut event = event;
        if let Some(message) = event.message.as_deref() {
            // Filtering pass first: a denying transformer suppresses the
            // event entirely, with no partial emission.
            for (predicate, mapper) in &self.config.message_transformers {
                if predicate(&event) && mapper(message).is_none() {
                    return Ok(None);
                }
            }

            for (predicate, mapper) in &self.config.message_transformers {
                if predicate(&event) {
                    let current = event.message.take().unwrap_or_default();
                    event.message = mapper(&current);
                }
            }
        }

        let pieces = split_to_budget(
            event,
            &self.config,
            self.clip_budget(),
            self.max_continuations(),
        )?;
        Ok(Some(pieces))
    }

    async fn close_stack(&self, state: &mut FlushState) -> Result<(), RelayError> {
        let body = state.stack.render(&self.config, self.clip_budget());
        state
            .lifecycle
            .deliver(self.sink.as_ref(), &body)
            .await
            .map_err(RelayError::Delivery)?;
        state.stack.clear();
        state.lifecycle.reset();
        Ok(())
    }

    /// Runs one full flush cycle: drain, process, pack, deliver.
    ///
    /// Many enqueued events coalesce into a single sink call per cycle; the
    /// open message is edited in place until it can no longer fit new
    /// lines. A fatal error abandons the cycle with queue and stack state
    /// preserved, so the next cycle retries delivery.
    pub async fn flush(&self) -> Result<(), RelayError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        while let Ok(event) = state.inbound_rx.try_recv() {
            if let Some(pieces) = self.process(event)? {
                state.outbound.extend(pieces);
            }
        }

        let clip_budget = self.clip_budget();
        let sink_max = self.sink.max_message_len();

        while let Some(event) = state.outbound.pop_front() {
            if event.is_empty() {
                // Nothing to log, typically a message cleared by a
                // transformer during the mutate pass.
                continue;
            }

            let own_len = formatted_len(&event, &self.config, clip_budget);
            if own_len > clip_budget {
                return Err(RelayError::PackingImpossible {
                    detail: format!(
                        "formatted length {own_len} exceeds the {clip_budget}-char clipping budget"
                    ),
                });
            }

            if !state
                .stack
                .can_fit(&event, &self.config, clip_budget, sink_max)
            {
                if state.stack.is_empty() {
                    return Err(RelayError::PackingImpossible {
                        detail: format!(
                            "event of formatted length {own_len} cannot fit an empty stack under the {sink_max}-char ceiling"
                        ),
                    });
                }
                if let Err(error) = self.close_stack(state).await {
                    state.outbound.push_front(event);
                    return Err(error);
                }
            }

            state.stack.push(event);
            state.dirty = true;
        }

        if state.dirty && !state.stack.is_empty() {
            let body = state.stack.render(&self.config, clip_budget);
            state
                .lifecycle
                .deliver(self.sink.as_ref(), &body)
                .await
                .map_err(RelayError::Delivery)?;
            state.dirty = false;
        }

        Ok(())
    }

    /// Closes the current stack immediately: delivers it if non-empty, then
    /// resets both the stack and the open-message handle so the next flush
    /// starts a clean message. Used for forced message boundaries, e.g.
    /// before shutdown.
    pub async fn dump_stack(&self) -> Result<(), RelayError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if !state.stack.is_empty() {
            let body = state.stack.render(&self.config, self.clip_budget());
            state
                .lifecycle
                .deliver(self.sink.as_ref(), &body)
                .await
                .map_err(RelayError::Delivery)?;
        }
        state.stack.clear();
        state.lifecycle.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LogLevel;
    use crate::sink::{MessageHandle, SinkError};
    use async_trait::async_trait;
    use std::collections::VecDeque as CallQueue;
    use std::sync::Mutex as StdMutex;

    /// Sink that records every call, with an optional script of failures
    /// popped one per call.
    struct RecordingSink {
        max_len: usize,
        calls: StdMutex<Vec<(String, String)>>,
        failures: StdMutex<CallQueue<SinkError>>,
        next_id: StdMutex<u64>,
    }

    impl RecordingSink {
        fn new(max_len: usize) -> Self {
            RecordingSink {
                max_len,
                calls: StdMutex::new(Vec::new()),
                failures: StdMutex::new(CallQueue::new()),
                next_id: StdMutex::new(0),
            }
        }

        fn with_failures(max_len: usize, failures: Vec<SinkError>) -> Self {
            let sink = Self::new(max_len);
            *sink.failures.lock().unwrap() = failures.into();
            sink
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, op: &str, body: &str) -> Result<MessageHandle, SinkError> {
            self.calls
                .lock()
                .unwrap()
                .push((op.to_string(), body.to_string()));
            if let Some(failure) = self.failures.lock().unwrap().pop_front() {
                return Err(failure);
            }
            let mut id = self.next_id.lock().unwrap();
            *id += 1;
            Ok(MessageHandle::new(format!("m{}", *id)))
        }
    }

    #[async_trait]
    impl ChannelSink for RecordingSink {
        async fn send(&self, body: &str) -> Result<MessageHandle, SinkError> {
            self.record("send", body)
        }

        async fn edit(
            &self,
            _handle: &MessageHandle,
            body: &str,
        ) -> Result<MessageHandle, SinkError> {
            self.record("edit", body)
        }

        fn max_message_len(&self) -> usize {
            self.max_len
        }
    }

    fn relay_with(sink: Arc<RecordingSink>, config: RelayConfig) -> ChannelRelay {
        ChannelRelay::new(sink, config)
    }

    fn plain_config() -> RelayConfig {
        RelayConfig {
            prefixer: None,
            ..RelayConfig::default()
        }
    }

    #[tokio::test]
    async fn flush_on_empty_queues_is_a_no_op() {
        let sink = Arc::new(RecordingSink::new(2000));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        relay.flush().await.unwrap();

        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn burst_of_small_events_coalesces_into_one_send() {
        let sink = Arc::new(RecordingSink::new(2000));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        for i in 0..20 {
            relay.enqueue(LogEvent::new("app", LogLevel::Info, format!("line {i}")));
        }
        relay.flush().await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "send");
        assert!(calls[0].1.contains("line 0"));
        assert!(calls[0].1.contains("line 19"));
    }

    #[tokio::test]
    async fn later_events_edit_the_open_message() {
        let sink = Arc::new(RecordingSink::new(2000));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        relay.enqueue(LogEvent::new("app", LogLevel::Info, "first"));
        relay.flush().await.unwrap();
        relay.enqueue(LogEvent::new("app", LogLevel::Info, "second"));
        relay.flush().await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "send");
        assert_eq!(calls[1].0, "edit");
        assert!(calls[1].1.contains("first"));
        assert!(calls[1].1.contains("second"));
    }

    #[tokio::test]
    async fn clean_flush_without_new_events_sends_nothing() {
        let sink = Arc::new(RecordingSink::new(2000));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        relay.enqueue(LogEvent::new("app", LogLevel::Info, "only"));
        relay.flush().await.unwrap();
        relay.flush().await.unwrap();

        assert_eq!(sink.calls().len(), 1);
    }

    #[tokio::test]
    async fn overflowing_stack_closes_and_opens_a_second_message() {
        let sink = Arc::new(RecordingSink::new(1500));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        for _ in 0..10 {
            relay.enqueue(LogEvent::new("app", LogLevel::Info, "m".repeat(150)));
        }
        relay.flush().await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "send");
        assert_eq!(calls[1].0, "send");
        assert_eq!(calls[0].1.matches("mmm").count() / 50, 9);
        assert_eq!(calls[1].1.matches("mmm").count() / 50, 1);
    }

    #[tokio::test]
    async fn rejected_levels_are_dropped() {
        let sink = Arc::new(RecordingSink::new(2000));
        let config = RelayConfig {
            levels: vec![LogLevel::Warn, LogLevel::Error],
            ..plain_config()
        };
        let relay = relay_with(Arc::clone(&sink), config);

        relay.enqueue(LogEvent::new("app", LogLevel::Info, "chatty"));
        relay.enqueue(LogEvent::new("app", LogLevel::Error, "broken"));
        relay.flush().await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].1.contains("chatty"));
        assert!(calls[0].1.contains("broken"));
    }

    #[tokio::test]
    async fn dropped_loggers_are_silenced() {
        let sink = Arc::new(RecordingSink::new(2000));
        let mut config = plain_config();
        config.map_logger_name_with("noisy", |_| None);
        let relay = relay_with(Arc::clone(&sink), config);

        relay.enqueue(LogEvent::new("noisy.dep", LogLevel::Info, "spam"));
        relay.enqueue(LogEvent::new("app", LogLevel::Info, "keep"));
        relay.flush().await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].1.contains("spam"));
        assert!(calls[0].1.contains("keep"));
    }

    #[tokio::test]
    async fn denying_transformer_drops_the_whole_event() {
        let sink = Arc::new(RecordingSink::new(2000));
        let mut config = plain_config();
        config.add_message_transformer(
            |event| event.message.as_deref().map_or(false, |m| m.contains("secret")),
            |_| None,
        );
        let relay = relay_with(Arc::clone(&sink), config);

        relay.enqueue(LogEvent::new("app", LogLevel::Info, "secret token=abc"));
        relay.enqueue(LogEvent::new("app", LogLevel::Info, "public"));
        relay.flush().await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].1.contains("secret"));
        assert!(calls[0].1.contains("public"));
    }

    #[tokio::test]
    async fn matching_transformers_mutate_in_order() {
        let sink = Arc::new(RecordingSink::new(2000));
        let mut config = plain_config();
        config.add_message_transformer(|_| true, |m| Some(format!("{m}!")));
        config.add_message_transformer(|_| true, |m| Some(m.to_uppercase()));
        let relay = relay_with(Arc::clone(&sink), config);

        relay.enqueue(LogEvent::new("app", LogLevel::Info, "ready"));
        relay.flush().await.unwrap();

        assert!(sink.calls()[0].1.contains("READY!"));
    }

    #[tokio::test]
    async fn events_with_no_content_are_dropped_during_packing() {
        let sink = Arc::new(RecordingSink::new(2000));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        relay.enqueue(LogEvent::with_parts("app", 0, LogLevel::Info, None, None));
        relay.flush().await.unwrap();

        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn oversized_event_spans_messages_in_order() {
        let sink = Arc::new(RecordingSink::new(2000));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        let head = "a".repeat(1975);
        let tail = "b".repeat(600);
        relay.enqueue(LogEvent::new("app", LogLevel::Info, format!("{head}{tail}")));
        relay.flush().await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].1.contains(&"a".repeat(100)));
        assert!(calls[1].1.contains(&"b".repeat(100)));
    }

    #[tokio::test]
    async fn fatal_delivery_error_preserves_state_for_the_next_cycle() {
        let sink = Arc::new(RecordingSink::with_failures(
            2000,
            vec![SinkError::Other("outage".into())],
        ));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        relay.enqueue(LogEvent::new("app", LogLevel::Info, "survives"));
        let err = relay.flush().await.unwrap_err();
        assert!(matches!(err, RelayError::Delivery(SinkError::Other(_))));

        relay.flush().await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.contains("survives"));
    }

    #[tokio::test]
    async fn dump_stack_forces_a_message_boundary() {
        let sink = Arc::new(RecordingSink::new(2000));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        relay.enqueue(LogEvent::new("app", LogLevel::Info, "before"));
        relay.flush().await.unwrap();
        relay.dump_stack().await.unwrap();

        relay.enqueue(LogEvent::new("app", LogLevel::Info, "after"));
        relay.flush().await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0, "send");
        assert_eq!(calls[1].0, "edit");
        assert_eq!(calls[2].0, "send");
        assert!(!calls[2].1.contains("before"));
    }

    #[tokio::test]
    async fn dump_stack_on_empty_state_sends_nothing() {
        let sink = Arc::new(RecordingSink::new(2000));
        let relay = relay_with(Arc::clone(&sink), plain_config());

        relay.dump_stack().await.unwrap();

        assert!(sink.calls().is_empty());
    }
}
