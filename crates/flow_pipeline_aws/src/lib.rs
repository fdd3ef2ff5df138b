//! AWS-oriented adapters and the queue-driven pipeline worker.
//!
//! This crate owns runtime integration details (S3/SQS/SNS adapters, local
//! scratch staging, and the standing poll/process/acknowledge loop) on top
//! of the pure aggregation engine in `flow_pipeline_core`. The worker talks
//! to the outside world only through the port traits in `adapters`, so
//! tests drive it with in-memory fakes.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod staging;
pub mod worker;
