use crate::exp::aggregate;
use crate::net::FlowStatsRecord;
use crate::sim::SimTime;

fn record(flow_id: u64) -> FlowStatsRecord {
    FlowStatsRecord {
        flow_id,
        rx_bytes: 0,
        first_tx: None,
        last_rx: None,
        delay_sum: SimTime::ZERO,
        rx_packets: 0,
        lost_packets: 0,
    }
}

#[test]
fn aggregate_matches_hand_computed_values() {
    // Flow 1: 1 MB over 8 s -> 1 Mbps; 100 packets, 4 s of summed delay.
    let f1 = FlowStatsRecord {
        rx_bytes: 1_000_000,
        first_tx: Some(SimTime::from_secs(1)),
        last_rx: Some(SimTime::from_secs(9)),
        delay_sum: SimTime::from_secs(4),
        rx_packets: 100,
        lost_packets: 10,
        ..record(1)
    };
    // Flow 2: 500 kB over 4 s -> 1 Mbps; 50 packets, 2 s of summed delay.
    let f2 = FlowStatsRecord {
        rx_bytes: 500_000,
        first_tx: Some(SimTime::from_secs(0)),
        last_rx: Some(SimTime::from_secs(4)),
        delay_sum: SimTime::from_secs(2),
        rx_packets: 50,
        lost_packets: 0,
        ..record(2)
    };

    let m = aggregate(&[f1, f2]);
    assert_eq!(m.throughput_mbps, 2.0);
    // 1000 * 6 s / 150 packets = 40 ms.
    assert_eq!(m.avg_delay_ms, 40.0);
    // 100 * 10 / (150 + 10) = 6.25 %.
    assert_eq!(m.loss_pct, 6.25);
}

#[test]
fn aggregate_is_deterministic_over_repeated_computation() {
    let records = vec![
        FlowStatsRecord {
            rx_bytes: 123_457,
            first_tx: Some(SimTime(7)),
            last_rx: Some(SimTime(999_999_937)),
            delay_sum: SimTime(1_234_567_891),
            rx_packets: 131,
            lost_packets: 17,
            ..record(1)
        },
        FlowStatsRecord {
            rx_bytes: 42,
            first_tx: Some(SimTime(3)),
            last_rx: Some(SimTime(5)),
            delay_sum: SimTime(1),
            rx_packets: 1,
            lost_packets: 0,
            ..record(2)
        },
    ];
    let a = aggregate(&records);
    let b = aggregate(&records);
    assert_eq!(a, b, "same input must reduce to bit-identical metrics");
}

#[test]
fn all_flows_with_zero_received_packets_yield_zero_delay_and_loss() {
    let records = vec![record(1), record(2), record(3)];
    let m = aggregate(&records);
    assert_eq!(m.throughput_mbps, 0.0);
    assert_eq!(m.avg_delay_ms, 0.0);
    assert_eq!(m.loss_pct, 0.0);
}

#[test]
fn flow_without_elapsed_interval_is_excluded_from_throughput_only() {
    // Received everything in the same instant it was first sent: no rate can
    // be formed, but the packets still count toward delay and loss.
    let f = FlowStatsRecord {
        rx_bytes: 10_000,
        first_tx: Some(SimTime::from_secs(2)),
        last_rx: Some(SimTime::from_secs(2)),
        delay_sum: SimTime::from_millis(100),
        rx_packets: 10,
        lost_packets: 30,
        ..record(1)
    };
    let m = aggregate(&[f]);
    assert_eq!(m.throughput_mbps, 0.0);
    assert_eq!(m.avg_delay_ms, 10.0);
    assert_eq!(m.loss_pct, 75.0);
}

#[test]
fn empty_record_set_reduces_to_zeroes() {
    let m = aggregate(&[]);
    assert_eq!(m.throughput_mbps, 0.0);
    assert_eq!(m.avg_delay_ms, 0.0);
    assert_eq!(m.loss_pct, 0.0);
}
