//! Transport that keeps messages in process memory

use crate::transport::error::TransportError;
use crate::transport::message::Message;
use crate::transport::Transport;

use std::any::Any;

/// Buffers every sent message for later inspection
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransport {
    messages: Vec<Message>,
}

impl InMemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recently sent message
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Remove and return every buffered message
    pub fn take_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    /// Drop every buffered message
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Transport for InMemoryTransport {
    fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        tracing::debug!(from = %message.from, recipients = message.to.len(), "buffering message in memory");
        self.messages.push(message.clone());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
