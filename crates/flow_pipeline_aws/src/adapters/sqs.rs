use crate::adapters::task_queue::{QueueMessage, TaskQueue};

const LONG_POLL_WAIT_SECONDS: i32 = 20;

/// SQS-backed task queue, bound to one queue URL.
#[derive(Clone)]
pub struct SqsTaskQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsTaskQueue {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

impl TaskQueue for SqsTaskQueue {
    fn receive(&self) -> Result<Option<QueueMessage>, String> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let response = client
                    .receive_message()
                    .queue_url(queue_url)
                    .max_number_of_messages(1)
                    .wait_time_seconds(LONG_POLL_WAIT_SECONDS)
                    .send()
                    .await
                    .map_err(|error| format!("failed to receive from sqs: {error}"))?;

                let Some(message) = response.messages().first() else {
                    return Ok(None);
                };
                let body = message
                    .body()
                    .ok_or_else(|| "received sqs message without a body".to_string())?
                    .to_string();
                let receipt_handle = message
                    .receipt_handle()
                    .ok_or_else(|| "received sqs message without a receipt handle".to_string())?
                    .to_string();

                Ok(Some(QueueMessage {
                    body,
                    receipt_handle,
                }))
            })
        })
    }

    fn send(&self, body: &str) -> Result<(), String> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();
        let body = body.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .send_message()
                    .queue_url(queue_url)
                    .message_body(body)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to send to sqs: {error}"))
            })
        })
    }

    fn delete(&self, receipt_handle: &str) -> Result<(), String> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();
        let receipt_handle = receipt_handle.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .delete_message()
                    .queue_url(queue_url)
                    .receipt_handle(receipt_handle)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to delete sqs message: {error}"))
            })
        })
    }
}
