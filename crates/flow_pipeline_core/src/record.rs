use serde::{Deserialize, Serialize};

/// Stage 1 group key: one aggregation bucket per (date, source, destination).
///
/// Fields compare by exact string match; no normalization is applied beyond
/// what the header-name trimming in the stage runners does.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlowKey {
    pub date: String,
    pub src_ip: String,
    pub dst_ip: String,
}

/// Stage 2 group key: one bucket per (source, destination) pair across dates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub src_ip: String,
    pub dst_ip: String,
}

/// Extracts the date segment of a raw timestamp: everything before the first
/// space. An empty timestamp yields an empty segment, which is still a valid
/// group key component.
pub fn extract_date(timestamp: &str) -> &str {
    match timestamp.find(' ') {
        Some(index) => &timestamp[..index],
        None => timestamp,
    }
}

/// Lenient integer parse: malformed rows degrade to zero instead of aborting
/// the batch. This is a data-tolerance contract, not a convenience.
pub fn parse_i64_lenient(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

/// Lenient float parse with the same zero-coercion contract.
pub fn parse_f64_lenient(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}
