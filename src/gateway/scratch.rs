//! Topic and message staging buffers

use crate::error::ValidationError;

/// Maximum staged topic length (bytes)
pub const MAX_TOPIC_LEN: usize = 100;

/// Maximum staged message length (bytes)
pub const MAX_MESSAGE_LEN: usize = 100;

/// Buffers overwritten by every publish/subscribe/unsubscribe request
///
/// Each write is bounds-checked first; a rejected write keeps the previous
/// contents.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Scratch {
    topic: String,
    message: String,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_topic(&mut self, topic: &str) -> Result<&str, ValidationError> {
        ValidationError::check_len("topic", topic, MAX_TOPIC_LEN)?;
        self.topic.clear();
        self.topic.push_str(topic);
        Ok(&self.topic)
    }

    pub fn stage_message(&mut self, message: &str) -> Result<&str, ValidationError> {
        ValidationError::check_len("message", message, MAX_MESSAGE_LEN)?;
        self.message.clear();
        self.message.push_str(message);
        Ok(&self.message)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
