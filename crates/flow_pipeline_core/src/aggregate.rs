//! In-memory streaming group-by engines.
//!
//! Both aggregators accumulate online: `ingest` folds one row into the
//! running state for its key and `finalize` yields one entry per distinct
//! key. Accumulation is associative and commutative over rows, so the result
//! for a fixed input is independent of row order. Keys are kept in a
//! `BTreeMap`, so finalization iterates in key order.

use std::collections::BTreeMap;

use crate::record::{FlowKey, PairKey};

/// Stage 1 running totals for one (date, source, destination) bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SummaryAccumulator {
    pub total_flow_duration: i64,
    pub total_fwd_packets: i64,
}

/// Stage 1 engine: raw flow rows grouped into per-day totals.
#[derive(Debug, Default)]
pub struct SummarizeAggregator {
    groups: BTreeMap<FlowKey, SummaryAccumulator>,
}

impl SummarizeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one raw row into the bucket for `key`, creating a zero-valued
    /// accumulator on first sight.
    pub fn ingest(&mut self, key: FlowKey, flow_duration: i64, fwd_packets: i64) {
        let accumulator = self.groups.entry(key).or_default();
        accumulator.total_flow_duration += flow_duration;
        accumulator.total_fwd_packets += fwd_packets;
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Consumes the engine, yielding one entry per distinct key in key order.
    pub fn finalize(self) -> impl Iterator<Item = (FlowKey, SummaryAccumulator)> {
        self.groups.into_iter()
    }
}

/// Stage 2 moment accumulator for one (source, destination) pair: count, sum
/// and sum-of-squares for each tracked metric.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PairStats {
    pub count: u64,
    pub sum_flow: f64,
    pub sum_flow_sq: f64,
    pub sum_fwd: f64,
    pub sum_fwd_sq: f64,
}

impl PairStats {
    pub fn add(&mut self, flow: f64, fwd: f64) {
        self.count += 1;
        self.sum_flow += flow;
        self.sum_flow_sq += flow * flow;
        self.sum_fwd += fwd;
        self.sum_fwd_sq += fwd * fwd;
    }

    pub fn mean_flow(&self) -> f64 {
        mean(self.sum_flow, self.count)
    }

    pub fn std_flow(&self) -> f64 {
        population_std(self.sum_flow, self.sum_flow_sq, self.count)
    }

    pub fn mean_fwd(&self) -> f64 {
        mean(self.sum_fwd, self.count)
    }

    pub fn std_fwd(&self) -> f64 {
        population_std(self.sum_fwd, self.sum_fwd_sq, self.count)
    }
}

fn mean(sum: f64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

/// Population standard deviation via the sum-of-squares identity
/// `E[x^2] - (E[x])^2`. The identity can dip fractionally below zero from
/// floating-point rounding; the variance is clamped before the square root.
fn population_std(sum: f64, sum_sq: f64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    variance.sqrt()
}

/// Stage 2 engine: summary rows grouped into per-pair distribution stats.
#[derive(Debug, Default)]
pub struct ConsolidateAggregator {
    groups: BTreeMap<PairKey, PairStats>,
}

impl ConsolidateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, key: PairKey, flow: f64, fwd: f64) {
        self.groups.entry(key).or_default().add(flow, fwd);
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn finalize(self) -> impl Iterator<Item = (PairKey, PairStats)> {
        self.groups.into_iter()
    }
}
