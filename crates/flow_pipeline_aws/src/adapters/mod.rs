pub mod artifact_store;
pub mod notifier;
pub mod s3;
pub mod sns;
pub mod sqs;
pub mod task_queue;
