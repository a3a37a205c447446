//! Scenario-level reduction of per-flow counters.

use std::fmt;

use serde::Serialize;

use crate::net::FlowStatsRecord;

/// Aggregate result of one experiment run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioMetrics {
    /// Sum of per-flow average rates (Mbps).
    pub throughput_mbps: f64,
    /// Mean one-way delay across all received packets (ms).
    pub avg_delay_ms: f64,
    /// Lost packets as a share of lost + received (percent, 0–100).
    pub loss_pct: f64,
}

/// Reduce the complete set of per-flow records into scenario metrics.
///
/// Pure function of its input: one pass, no hidden state, reproducible
/// bit-for-bit across repeated calls. Flows whose last receive does not
/// strictly follow their first send contribute nothing to throughput; flows
/// with no received packets contribute nothing to the delay average.
/// Throughput is the sum of per-flow average rates, not a weighted aggregate
/// rate over the whole run.
pub fn aggregate(records: &[FlowStatsRecord]) -> ScenarioMetrics {
    let mut throughput_mbps = 0.0;
    let mut delay_sum_secs = 0.0;
    let mut delay_rx_packets: u64 = 0;
    let mut rx_total: u64 = 0;
    let mut lost_total: u64 = 0;

    for rec in records {
        if let (Some(first_tx), Some(last_rx)) = (rec.first_tx, rec.last_rx) {
            if last_rx > first_tx {
                let elapsed_secs = last_rx.saturating_sub(first_tx).as_secs_f64();
                throughput_mbps += rec.rx_bytes as f64 * 8.0 / elapsed_secs / 1e6;
            }
        }
        if rec.rx_packets > 0 {
            delay_sum_secs += rec.delay_sum.as_secs_f64();
            delay_rx_packets += rec.rx_packets;
        }
        rx_total += rec.rx_packets;
        lost_total += rec.lost_packets;
    }

    let avg_delay_ms = if delay_rx_packets > 0 {
        1000.0 * delay_sum_secs / delay_rx_packets as f64
    } else {
        0.0
    };
    let total_pkts = rx_total + lost_total;
    let loss_pct = if total_pkts > 0 {
        100.0 * lost_total as f64 / total_pkts as f64
    } else {
        0.0
    };

    ScenarioMetrics {
        throughput_mbps,
        avg_delay_ms,
        loss_pct,
    }
}

/// Printable summary of one run, also serializable for `--metrics-json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: u32,
    pub variant: String,
    pub queue: String,
    pub cbr_rate_mbps: f64,
    pub run_time_secs: u64,
    pub metrics: ScenarioMetrics,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== RESULTS ===")?;
        writeln!(
            f,
            "Scenario: {} | Variant(Flow1): {} | Queue: {} | CBR: {} Mbps | RunTime: {}s",
            self.scenario, self.variant, self.queue, self.cbr_rate_mbps, self.run_time_secs
        )?;
        writeln!(f, "Throughput (sum, Mbps): {:.6}", self.metrics.throughput_mbps)?;
        writeln!(f, "Avg Delay (ms): {:.6}", self.metrics.avg_delay_ms)?;
        write!(f, "Loss (%): {:.6}", self.metrics.loss_pct)
    }
}
