/// One claimed queue message. The receipt handle is what acknowledges it;
/// an unacknowledged message becomes claimable again after the queue's
/// visibility timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub body: String,
    pub receipt_handle: String,
}

/// Durable-queue port, bound to one queue at construction.
pub trait TaskQueue {
    /// Long-polls for at most one message. An empty result is not an error.
    fn receive(&self) -> Result<Option<QueueMessage>, String>;

    fn send(&self, body: &str) -> Result<(), String>;

    /// Acknowledges (deletes) a previously received message.
    fn delete(&self, receipt_handle: &str) -> Result<(), String>;
}
