//! Mock channel sink for integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use channel_relay::{ChannelSink, MessageHandle, SinkError};

/// One observed sink call: the operation (`send`/`edit`), the target handle
/// for edits, and the delivered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkCall {
    pub op: &'static str,
    pub handle: Option<String>,
    pub body: String,
}

/// In-process channel sink that records every call and can be scripted to
/// fail, one scripted error consumed per call.
pub struct MockSink {
    max_len: usize,
    calls: Mutex<Vec<SinkCall>>,
    failures: Mutex<VecDeque<SinkError>>,
    next_id: Mutex<u64>,
}

impl MockSink {
    pub fn new(max_len: usize) -> Self {
        MockSink {
            max_len,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            next_id: Mutex::new(0),
        }
    }

    pub fn script_failures(&self, failures: Vec<SinkError>) {
        *self.failures.lock().unwrap() = failures.into();
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.body).collect()
    }

    fn answer(
        &self,
        op: &'static str,
        handle: Option<String>,
        body: &str,
    ) -> Result<MessageHandle, SinkError> {
        self.calls.lock().unwrap().push(SinkCall {
            op,
            handle,
            body: body.to_string(),
        });
        if let Some(failure) = self.failures.lock().unwrap().pop_front() {
            return Err(failure);
        }
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        Ok(MessageHandle::new(format!("message-{}", *id)))
    }
}

#[async_trait]
impl ChannelSink for MockSink {
    async fn send(&self, body: &str) -> Result<MessageHandle, SinkError> {
        self.answer("send", None, body)
    }

    async fn edit(&self, handle: &MessageHandle, body: &str) -> Result<MessageHandle, SinkError> {
        self.answer("edit", Some(handle.as_str().to_string()), body)
    }

    fn max_message_len(&self) -> usize {
        self.max_len
    }
}
