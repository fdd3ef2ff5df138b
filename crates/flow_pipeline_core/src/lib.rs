//! Pure domain primitives for the flow summarization pipeline.
//!
//! This crate owns the streaming group-by aggregation engine, the stage
//! runners that turn one artifact into the next, the queue message contract,
//! and artifact key derivation. It intentionally excludes AWS SDK and
//! runtime concerns; a stage only ever touches the two file paths it is
//! handed.

pub mod aggregate;
pub mod contract;
pub mod export;
pub mod record;
pub mod stage;
pub mod storage_keys;
