//! Queue message contract.
//!
//! One task descriptor names one artifact to process next. Decoding is a
//! strict structured decode; any failure marks the message as poison at the
//! worker layer (discarded, never retried), since retry cannot fix a
//! structurally invalid message.

use serde::{Deserialize, Serialize};

/// The unit of work carried by the queues: a (container, object) reference
/// into the blob store. Immutable once sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageError {
    message: String,
}

impl MessageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for MessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for MessageError {}

pub fn decode_task(body: &str) -> Result<TaskDescriptor, MessageError> {
    let descriptor: TaskDescriptor = serde_json::from_str(body)
        .map_err(|error| MessageError::new(format!("malformed task descriptor: {error}")))?;

    if descriptor.bucket.trim().is_empty() {
        return Err(MessageError::new("task descriptor bucket cannot be empty"));
    }
    if descriptor.key.trim().is_empty() {
        return Err(MessageError::new("task descriptor key cannot be empty"));
    }

    Ok(descriptor)
}

pub fn encode_task(descriptor: &TaskDescriptor) -> String {
    serde_json::to_string(descriptor).expect("serialization of a task descriptor should not fail")
}
