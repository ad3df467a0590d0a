//! In-process doubles for the storage contracts, used by engine tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::sink::{LogSink, ResultQueue};

/// Log sink collecting appends in memory, preserving call order.
#[derive(Default)]
pub struct MemoryLogSink {
    chunks: Mutex<Vec<Vec<u8>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All appended bytes, concatenated in append order.
    pub fn contents(&self) -> Vec<u8> {
        self.chunks
            .lock()
            .expect("log sink lock poisoned")
            .concat()
    }

    pub fn contents_utf8(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn append_count(&self) -> usize {
        self.chunks.lock().expect("log sink lock poisoned").len()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn append(&self, bytes: &[u8]) -> Result<(), StorageError> {
        self.chunks
            .lock()
            .expect("log sink lock poisoned")
            .push(bytes.to_vec());
        Ok(())
    }

    fn url(&self) -> String {
        "memory://logs".to_string()
    }
}

/// Queue collecting enqueued messages in memory.
#[derive(Default)]
pub struct MemoryQueue {
    messages: Mutex<Vec<String>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("queue lock poisoned").clone()
    }
}

#[async_trait]
impl ResultQueue for MemoryQueue {
    async fn enqueue(&self, message: &str) -> Result<(), StorageError> {
        self.messages
            .lock()
            .expect("queue lock poisoned")
            .push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sink_preserves_append_order() {
        let sink = MemoryLogSink::new();
        sink.append(b"one ").await.unwrap();
        sink.append(b"two").await.unwrap();
        assert_eq!(sink.contents_utf8(), "one two");
        assert_eq!(sink.append_count(), 2);
    }

    #[tokio::test]
    async fn queue_collects_messages() {
        let queue = MemoryQueue::new();
        queue.enqueue("{\"build_result\":\"success\"}").await.unwrap();
        assert_eq!(queue.messages().len(), 1);
    }
}
