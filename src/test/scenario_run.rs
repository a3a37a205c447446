use crate::cc::CcVariant;
use crate::exp::{
    self, CcChoice, ConfigError, ExperimentConfig, FlowSpec, Scenario, TrafficParams, aggregate,
    provision_flows,
};
use crate::net::NetWorld;
use crate::sim::{SimTime, Simulator};
use crate::topo::linear::{LinearOpts, build_linear};

fn config(scenario: u32, variant: &str, run_time_secs: u64) -> ExperimentConfig {
    ExperimentConfig {
        scenario_selector: scenario,
        requested_variant: variant.to_string(),
        run_time_secs,
        ..ExperimentConfig::default()
    }
}

#[test]
fn scenario_selector_accepts_only_the_two_shapes() {
    assert_eq!(Scenario::from_selector(1).unwrap(), Scenario::Linear5);
    assert_eq!(Scenario::from_selector(2).unwrap(), Scenario::Linear9);
    assert!(matches!(
        Scenario::from_selector(3),
        Err(ConfigError::UnknownScenario(3))
    ));
    assert!(matches!(
        Scenario::from_selector(0),
        Err(ConfigError::UnknownScenario(0))
    ));
}

#[test]
fn linear9_raises_short_run_times_to_the_floor() {
    assert_eq!(Scenario::Linear9.effective_run_time_secs(20), 100);
    assert_eq!(Scenario::Linear9.effective_run_time_secs(100), 100);
    assert_eq!(Scenario::Linear9.effective_run_time_secs(250), 250);

    let experiment = exp::setup(config(2, "Vegas", 20)).expect("setup succeeds");
    assert_eq!(experiment.run_time_secs(), 100);
}

#[test]
fn linear5_honors_the_requested_run_time_exactly() {
    assert_eq!(Scenario::Linear5.effective_run_time_secs(20), 20);

    let experiment = exp::setup(config(1, "Vegas", 20)).expect("setup succeeds");
    assert_eq!(experiment.run_time_secs(), 20);
}

#[test]
fn unsupported_variant_aborts_setup_before_any_topology() {
    let Err(err) = exp::setup(config(1, "Cubic", 10)) else {
        panic!("unsupported variant must abort setup");
    };
    assert!(matches!(err, ConfigError::UnsupportedVariant(_)));
}

#[test]
fn unknown_scenario_aborts_setup() {
    let Err(err) = exp::setup(config(7, "Vegas", 10)) else {
        panic!("unknown scenario must abort setup");
    };
    assert!(matches!(err, ConfigError::UnknownScenario(7)));
}

#[test]
fn legacy_variant_is_substituted_and_recorded() {
    let experiment = exp::setup(config(1, "Reno", 5)).expect("legacy name resolves");
    let res = experiment.resolution();
    assert_eq!(res.variant, CcVariant::NewReno);
    assert_eq!(res.resolved_name(), "NewReno");
    assert_eq!(res.requested, "Reno");
    assert!(res.substituted);
}

#[test]
fn linear5_vegas_run_produces_sane_metrics() {
    let experiment = exp::setup(config(1, "Vegas", 5)).expect("setup succeeds");
    assert_eq!(experiment.scenario(), Scenario::Linear5);
    assert_eq!(experiment.resolution().resolved_name(), "Vegas");
    assert!(!experiment.resolution().substituted);
    assert_eq!(experiment.provisioned_flows(), &[1, 2]);
    assert_eq!(
        experiment.world().net.cc_default(crate::net::NodeId(0)),
        CcVariant::Vegas,
        "the requested variant is installed on the primary source node"
    );

    let report = experiment.run();
    assert!(report.network_stats().delivered_pkts > 0);
    let records = report.flow_stats();
    assert_eq!(records.len(), 2, "one bulk flow and one cbr flow");

    let metrics = aggregate(&records);
    assert!(
        metrics.throughput_mbps > 0.0,
        "bulk + cbr traffic must move bytes: {metrics:?}"
    );
    assert!(
        (0.0..=100.0).contains(&metrics.loss_pct),
        "loss must be a percentage: {metrics:?}"
    );
    assert!(metrics.avg_delay_ms >= 0.0);
    // Each packet crosses four 10 ms links, so any received packet has at
    // least 40 ms of one-way delay.
    assert!(metrics.avg_delay_ms >= 40.0, "delay too low: {metrics:?}");
}

#[test]
fn linear5_newreno_run_produces_sane_metrics() {
    let experiment = exp::setup(config(1, "NewReno", 5)).expect("setup succeeds");
    let report = experiment.run();
    let metrics = aggregate(&report.flow_stats());
    assert!(metrics.throughput_mbps > 0.0);
    assert!((0.0..=100.0).contains(&metrics.loss_pct));
}

#[test]
fn linear9_provisions_scenario_traffic_with_unique_ports() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let scenario = Scenario::Linear9;

    let topo = build_linear(
        &mut world,
        &LinearOpts {
            nodes: scenario.node_count(),
            subnet_base: scenario.subnet_base(),
            ..LinearOpts::default()
        },
    );

    let params = TrafficParams {
        cbr_rate_bps: 1_000_000,
        cbr_pkt_bytes: 950,
        seg_bytes: 1000,
        stop_at: SimTime::from_secs(1),
    };
    let flow_ids = provision_flows(
        scenario,
        &topo,
        CcVariant::Vegas,
        &params,
        &mut sim,
        &mut world,
    );
    assert_eq!(flow_ids, vec![1, 2, 3]);

    // The requested variant lands on node 0; node 2 keeps the baseline.
    assert_eq!(world.net.cc_default(topo.hosts[0]), CcVariant::Vegas);
    assert_eq!(world.net.cc_default(topo.hosts[2]), CcVariant::NewReno);

    // Execute the start events so the connections materialize.
    sim.run_until(SimTime::from_millis(1), &mut world);

    let bulk1 = world.net.bulk.get(1).expect("primary bulk flow exists");
    let bulk2 = world.net.bulk.get(2).expect("baseline bulk flow exists");
    assert_eq!(bulk1.src, topo.hosts[0]);
    assert_eq!(bulk1.dst, topo.hosts[7]);
    assert_eq!(bulk1.variant, CcVariant::Vegas);
    assert_eq!(bulk2.src, topo.hosts[2]);
    assert_eq!(bulk2.dst, topo.hosts[8]);
    assert_eq!(bulk2.variant, CcVariant::NewReno);

    let cbr = world.net.cbr.get(3).expect("cbr flow exists");
    assert_eq!(cbr.src, topo.hosts[1]);
    assert_eq!(cbr.dst, topo.hosts[7]);

    // Ports are unique among flows terminating at the same node.
    assert_ne!(
        (bulk1.dst, bulk1.port),
        (cbr.dst, cbr.port),
        "two sinks on node 7 must not share a port"
    );
}

#[test]
fn scenario_traffic_tables_match_the_shapes() {
    assert_eq!(
        Scenario::Linear5.traffic(),
        vec![
            FlowSpec::Bulk {
                src: 0,
                dst: 4,
                cc: CcChoice::Requested
            },
            FlowSpec::Cbr { src: 1, dst: 4 },
        ]
    );
    assert_eq!(Scenario::Linear9.traffic().len(), 3);
    assert_eq!(Scenario::Linear5.subnet_base(), (10, 0));
    assert_eq!(Scenario::Linear9.subnet_base(), (10, 1));
}

#[test]
fn cbr_flow_stops_sending_at_the_stop_time() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let topo = build_linear(&mut world, &LinearOpts::default());

    let params = TrafficParams {
        cbr_rate_bps: 1_000_000,
        cbr_pkt_bytes: 950,
        seg_bytes: 1000,
        stop_at: SimTime::from_secs(1),
    };
    // Only the CBR flow matters here; use the Linear5 table and run past the
    // stop time to show the sender went quiet.
    provision_flows(
        Scenario::Linear5,
        &topo,
        CcVariant::NewReno,
        &params,
        &mut sim,
        &mut world,
    );
    sim.run_until(SimTime::from_secs(3), &mut world);

    let records = world.net.flow_stats_snapshot();
    let cbr = records.iter().find(|r| r.flow_id == 2).expect("cbr record");
    // 1 Mbps / 950 B per packet ~ 131 packets per second of on-time.
    assert!(cbr.rx_packets > 100, "cbr barely sent: {cbr:?}");
    assert!(cbr.rx_packets < 160, "cbr kept sending past stop: {cbr:?}");
    // Nothing can arrive later than stop + the path's store-and-forward time.
    let last_rx = cbr.last_rx.expect("cbr delivered packets");
    assert!(last_rx < SimTime::from_secs(2));
}
