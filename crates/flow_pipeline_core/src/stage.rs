//! Single-pass batch stage runners.
//!
//! Each runner reads the whole input artifact through one aggregator and
//! writes one output artifact with a fixed header. The output file is only
//! created after the input has been fully consumed, so a structural failure
//! (empty artifact, missing required column) leaves no output behind.
//! Runners are stateless between invocations; re-running one on the same
//! input yields the same output rows.

use std::path::Path;

use crate::aggregate::{ConsolidateAggregator, SummarizeAggregator};
use crate::record::{extract_date, parse_f64_lenient, parse_i64_lenient, FlowKey, PairKey};

/// Summary artifact schema produced by Stage 1 and consumed by Stage 2.
pub const SUMMARY_HEADER: [&str; 5] = [
    "Date",
    "SrcIP",
    "DstIP",
    "TotalFlowDuration",
    "TotalFwdPkt",
];

/// Consolidated artifact schema produced by Stage 2.
pub const CONSOLIDATED_HEADER: [&str; 7] = [
    "SrcIP",
    "DstIP",
    "Count",
    "MeanFlowDuration",
    "StdFlowDuration",
    "MeanFwdPkt",
    "StdFwdPkt",
];

/// Row and group counts surfaced to the operator after a stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub rows_read: u64,
    pub groups_written: u64,
}

#[derive(Debug)]
pub enum StageError {
    /// The artifact itself is unusable (empty, required column absent).
    /// Distinct from per-row tolerance: this aborts before any row is read.
    Structural(String),
    Io(std::io::Error),
    Csv(csv::Error),
}

impl StageError {
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural(message) => f.write_str(message),
            Self::Io(error) => write!(f, "i/o failure: {error}"),
            Self::Csv(error) => write!(f, "csv failure: {error}"),
        }
    }
}

impl std::error::Error for StageError {}

impl From<std::io::Error> for StageError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<csv::Error> for StageError {
    fn from(error: csv::Error) -> Self {
        Self::Csv(error)
    }
}

/// Stage 1: Raw flow rows -> per-day Summary totals keyed by
/// (date, source, destination).
pub fn run_summarize(input: &Path, output: &Path) -> Result<StageReport, StageError> {
    let mut reader = artifact_reader(input)?;
    let headers = read_header(&mut reader, input)?;

    let idx_timestamp = resolve_column(&headers, "Timestamp")?;
    let idx_src_ip = resolve_column(&headers, "Src IP")?;
    let idx_dst_ip = resolve_column(&headers, "Dst IP")?;
    let idx_flow_duration = resolve_column(&headers, "Flow Duration")?;
    let idx_fwd_packets = resolve_column(&headers, "Tot Fwd Pkts")?;

    let mut aggregator = SummarizeAggregator::new();
    let mut rows_read = 0u64;
    for record in reader.records() {
        let record = record?;
        rows_read += 1;

        let key = FlowKey {
            date: extract_date(field(&record, idx_timestamp)).to_string(),
            src_ip: field(&record, idx_src_ip).to_string(),
            dst_ip: field(&record, idx_dst_ip).to_string(),
        };
        let flow_duration = parse_i64_lenient(field(&record, idx_flow_duration));
        let fwd_packets = parse_i64_lenient(field(&record, idx_fwd_packets));
        aggregator.ingest(key, flow_duration, fwd_packets);
    }

    // Input fully consumed; only now does the output artifact come into being.
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(SUMMARY_HEADER)?;
    let mut groups_written = 0u64;
    for (key, accumulator) in aggregator.finalize() {
        let total_flow = accumulator.total_flow_duration.to_string();
        let total_fwd = accumulator.total_fwd_packets.to_string();
        writer.write_record([
            key.date.as_str(),
            key.src_ip.as_str(),
            key.dst_ip.as_str(),
            total_flow.as_str(),
            total_fwd.as_str(),
        ])?;
        groups_written += 1;
    }
    writer.flush()?;

    Ok(StageReport {
        rows_read,
        groups_written,
    })
}

/// Stage 2: Summary totals -> per-pair Consolidated distribution stats.
///
/// The recompute is full: only the summary rows of the current input feed
/// the aggregator; any previously produced Consolidated artifact is never
/// merged in. Redelivering the same input therefore reproduces the same
/// output, which is what makes at-least-once delivery safe upstream.
pub fn run_consolidate(input: &Path, output: &Path) -> Result<StageReport, StageError> {
    let mut reader = artifact_reader(input)?;
    let headers = read_header(&mut reader, input)?;

    let idx_src_ip = resolve_column(&headers, "SrcIP")?;
    let idx_dst_ip = resolve_column(&headers, "DstIP")?;
    let idx_flow = resolve_column(&headers, "TotalFlowDuration")?;
    let idx_fwd = resolve_column(&headers, "TotalFwdPkt")?;

    let mut aggregator = ConsolidateAggregator::new();
    let mut rows_read = 0u64;
    for record in reader.records() {
        let record = record?;
        rows_read += 1;

        let key = PairKey {
            src_ip: field(&record, idx_src_ip).to_string(),
            dst_ip: field(&record, idx_dst_ip).to_string(),
        };
        let flow = parse_f64_lenient(field(&record, idx_flow));
        let fwd = parse_f64_lenient(field(&record, idx_fwd));
        aggregator.ingest(key, flow, fwd);
    }

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(CONSOLIDATED_HEADER)?;
    let mut groups_written = 0u64;
    for (key, stats) in aggregator.finalize() {
        let count = stats.count.to_string();
        let mean_flow = stats.mean_flow().to_string();
        let std_flow = stats.std_flow().to_string();
        let mean_fwd = stats.mean_fwd().to_string();
        let std_fwd = stats.std_fwd().to_string();
        writer.write_record([
            key.src_ip.as_str(),
            key.dst_ip.as_str(),
            count.as_str(),
            mean_flow.as_str(),
            std_flow.as_str(),
            mean_fwd.as_str(),
            std_fwd.as_str(),
        ])?;
        groups_written += 1;
    }
    writer.flush()?;

    Ok(StageReport {
        rows_read,
        groups_written,
    })
}

pub(crate) fn artifact_reader(input: &Path) -> Result<csv::Reader<std::fs::File>, StageError> {
    // Flexible: raw captures routinely carry ragged rows, and a short row
    // must degrade like a malformed field, not abort the batch.
    Ok(csv::ReaderBuilder::new().flexible(true).from_path(input)?)
}

pub(crate) fn read_header(
    reader: &mut csv::Reader<std::fs::File>,
    input: &Path,
) -> Result<csv::StringRecord, StageError> {
    let headers = reader.headers()?.clone();
    if headers.len() == 0 || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(StageError::structural(format!(
            "empty artifact: {}",
            input.display()
        )));
    }
    Ok(headers)
}

fn resolve_column(headers: &csv::StringRecord, name: &str) -> Result<usize, StageError> {
    headers
        .iter()
        .position(|column| column.trim() == name)
        .ok_or_else(|| StageError::structural(format!("required column '{name}' is missing")))
}

pub(crate) fn field<'a>(record: &'a csv::StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("")
}
