//! Queue-driven pipeline worker.
//!
//! One worker instance runs one pipeline stage as a standing service: long
//! poll the inbound queue, stage the referenced artifact locally, run the
//! stage, publish follow-on artifacts, then acknowledge. One task in flight
//! at a time, no internal parallelism.
//!
//! Running several instances against the same queue distributes work safely
//! (the visibility window claims each message for one receiver), but the
//! final stage writes a single shared consolidated destination with no
//! compare-and-swap, so concurrent final-stage consumers race
//! last-writer-wins. Run at most one consumer of the final stage's queue.

use std::path::Path;
use std::time::Duration;

use flow_pipeline_core::contract::{decode_task, encode_task, TaskDescriptor};
use flow_pipeline_core::stage::{run_consolidate, run_summarize, StageError, StageReport};
use flow_pipeline_core::storage_keys::{consolidated_object_key, summary_object_key};
use serde_json::json;

use crate::adapters::artifact_store::ArtifactStore;
use crate::adapters::notifier::Notifier;
use crate::adapters::task_queue::TaskQueue;
use crate::logging::{log_error, log_info};
use crate::staging::stage_task;

/// Disposition of a failed task.
#[derive(Debug)]
pub enum TaskError {
    /// The artifact or message can never be processed; acknowledge and move
    /// on, retrying cannot fix it.
    Discard(String),
    /// Infrastructure fault; leave the message unacknowledged so the
    /// visibility timeout redelivers it.
    Transient(String),
}

impl From<StageError> for TaskError {
    fn from(error: StageError) -> Self {
        match error {
            StageError::Io(error) => Self::Transient(format!("stage i/o failure: {error}")),
            StageError::Csv(error) => match error.kind() {
                csv::ErrorKind::Io(_) => Self::Transient(format!("stage i/o failure: {error}")),
                _ => Self::Discard(format!("csv failure: {error}")),
            },
            StageError::Structural(message) => Self::Discard(message),
        }
    }
}

/// One pipeline stage as seen by the worker loop.
pub trait PipelineStage {
    fn name(&self) -> &'static str;

    /// Derives the output artifact key from the input artifact key.
    /// Failure here means the descriptor references something this stage
    /// cannot ever process, so the worker treats it as poison.
    fn output_key(&self, input_key: &str) -> Result<String, String>;

    /// Whether the existing output artifact is staged locally before the
    /// run. The stage runner still recomputes purely from the input.
    fn stages_prior_output(&self) -> bool {
        false
    }

    /// Subject and body of the completion notification published after a
    /// successful run, when the worker carries a notifier.
    fn completion_notice(&self, descriptor: &TaskDescriptor) -> (String, String) {
        (
            format!("Flow {} done", self.name()),
            format!(
                "Output refreshed for bucket {} from {}",
                descriptor.bucket, descriptor.key
            ),
        )
    }

    fn run(&self, input: &Path, output: &Path) -> Result<StageReport, StageError>;
}

/// Stage 1: raw capture -> per-day summary, one output per input artifact.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummarizeStage;

impl PipelineStage for SummarizeStage {
    fn name(&self) -> &'static str {
        "summarize"
    }

    fn output_key(&self, input_key: &str) -> Result<String, String> {
        summary_object_key(input_key).map_err(|error| error.message().to_string())
    }

    fn run(&self, input: &Path, output: &Path) -> Result<StageReport, StageError> {
        run_summarize(input, output)
    }
}

/// Stage 2 (terminal): summary -> shared consolidated destination.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolidateStage;

impl PipelineStage for ConsolidateStage {
    fn name(&self) -> &'static str {
        "consolidate"
    }

    fn output_key(&self, _input_key: &str) -> Result<String, String> {
        Ok(consolidated_object_key().to_string())
    }

    // The previous consolidated artifact is fetched so its absence can be
    // distinguished from store failures, but the runner recomputes purely
    // from the current summary input and overwrites it.
    fn stages_prior_output(&self) -> bool {
        true
    }

    fn completion_notice(&self, descriptor: &TaskDescriptor) -> (String, String) {
        (
            "Flow consolidation done".to_string(),
            format!(
                "Consolidated artifact refreshed for bucket {} from {}",
                descriptor.bucket, descriptor.key
            ),
        )
    }

    fn run(&self, input: &Path, output: &Path) -> Result<StageReport, StageError> {
        run_consolidate(input, output)
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Component tag used in every log line this worker emits.
    pub component: &'static str,
    /// Fixed pause after a failed poll before polling again.
    pub retry_delay: Duration,
}

impl WorkerConfig {
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// What one poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Long poll returned no message.
    Idle,
    /// Structurally invalid descriptor: acknowledged without processing.
    Poison,
    /// Valid descriptor over an unusable artifact: acknowledged, no output.
    Discarded,
    Processed {
        descriptor: TaskDescriptor,
        output_key: String,
        report: StageReport,
    },
}

pub struct PipelineWorker<St, S, Q> {
    config: WorkerConfig,
    stage: St,
    store: S,
    inbound: Q,
    downstream: Option<Q>,
    notifier: Option<Box<dyn Notifier>>,
}

impl<St, S, Q> PipelineWorker<St, S, Q>
where
    St: PipelineStage,
    S: ArtifactStore,
    Q: TaskQueue,
{
    pub fn new(config: WorkerConfig, stage: St, store: S, inbound: Q) -> Self {
        Self {
            config,
            stage,
            store,
            inbound,
            downstream: None,
            notifier: None,
        }
    }

    /// Adds the queue that receives the follow-on task descriptor for the
    /// produced artifact.
    pub fn with_downstream(mut self, queue: Q) -> Self {
        self.downstream = Some(queue);
        self
    }

    /// Adds the best-effort completion notifier for a terminal stage.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    /// One pass of the poll/process/acknowledge protocol.
    ///
    /// An `Err` means a transient fault left the current task
    /// unacknowledged; the visibility timeout will redeliver it. Because a
    /// stage recomputes its output purely from the current input artifact,
    /// reprocessing a redelivered task is idempotent.
    pub fn poll_once(&self) -> Result<PollOutcome, String> {
        let Some(message) = self.inbound.receive()? else {
            return Ok(PollOutcome::Idle);
        };

        let descriptor = match decode_task(&message.body) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                log_error(
                    self.config.component,
                    "poison_message",
                    json!({ "body": message.body, "error": error.message() }),
                );
                self.inbound.delete(&message.receipt_handle)?;
                return Ok(PollOutcome::Poison);
            }
        };

        let output_key = match self.stage.output_key(&descriptor.key) {
            Ok(output_key) => output_key,
            Err(error) => {
                log_error(
                    self.config.component,
                    "poison_message",
                    json!({ "key": descriptor.key, "error": error }),
                );
                self.inbound.delete(&message.receipt_handle)?;
                return Ok(PollOutcome::Poison);
            }
        };

        log_info(
            self.config.component,
            "task_started",
            json!({
                "stage": self.stage.name(),
                "bucket": descriptor.bucket,
                "key": descriptor.key,
                "output_key": output_key,
            }),
        );

        let staged = stage_task(
            &self.store,
            &descriptor.bucket,
            &descriptor.key,
            &output_key,
            self.stage.stages_prior_output(),
            |input, output| self.stage.run(input, output).map_err(TaskError::from),
        );

        let report = match staged {
            Ok(report) => report,
            Err(TaskError::Discard(reason)) => {
                log_error(
                    self.config.component,
                    "task_discarded",
                    json!({
                        "bucket": descriptor.bucket,
                        "key": descriptor.key,
                        "error": reason,
                    }),
                );
                self.inbound.delete(&message.receipt_handle)?;
                return Ok(PollOutcome::Discarded);
            }
            Err(TaskError::Transient(reason)) => {
                return Err(reason);
            }
        };

        // Downstream send precedes the ack: a crash in between yields a
        // duplicate downstream send, never a lost one.
        if let Some(downstream) = &self.downstream {
            let next = TaskDescriptor {
                bucket: descriptor.bucket.clone(),
                key: output_key.clone(),
            };
            downstream.send(&encode_task(&next))?;
        }

        if let Some(notifier) = &self.notifier {
            let (subject, body) = self.stage.completion_notice(&descriptor);
            if let Err(error) = notifier.publish(&subject, &body) {
                log_error(
                    self.config.component,
                    "notification_failed",
                    json!({ "error": error }),
                );
            }
        }

        self.inbound.delete(&message.receipt_handle)?;

        log_info(
            self.config.component,
            "task_completed",
            json!({
                "bucket": descriptor.bucket,
                "key": descriptor.key,
                "output_key": output_key,
                "rows_read": report.rows_read,
                "groups_written": report.groups_written,
            }),
        );

        Ok(PollOutcome::Processed {
            descriptor,
            output_key,
            report,
        })
    }

    /// Standing service loop: polls until the host process is terminated.
    /// Transient faults are logged and retried after a fixed delay,
    /// indefinitely.
    pub fn run(&self) -> ! {
        log_info(
            self.config.component,
            "worker_started",
            json!({ "stage": self.stage.name() }),
        );
        loop {
            if let Err(error) = self.poll_once() {
                log_error(
                    self.config.component,
                    "poll_failed",
                    json!({ "error": error }),
                );
                std::thread::sleep(self.config.retry_delay);
            }
        }
    }
}
