//! Experiment setup and the run-to-halt driver.
//!
//! Lifecycle: configured → running → halted. `setup` validates the
//! configuration and builds the full topology and traffic; `Experiment::run`
//! consumes the configured experiment, advances simulated time exactly once
//! to the stop time, and returns a report from which statistics can only be
//! read. There is no early termination and no retry.

use tracing::info;

use super::error::ConfigError;
use super::provision::{TrafficParams, provision_flows};
use super::scenario::Scenario;
use crate::cc::{self, CcResolution};
use crate::net::{FlowStatsRecord, NetWorld, Stats};
use crate::queue::QueueKind;
use crate::sim::{SimTime, Simulator};
use crate::topo::linear::{LinearOpts, build_linear};

/// Link characteristics shared by every link in both scenarios.
pub const LINK_BANDWIDTH_BPS: u64 = 10_000_000; // 10 Mbps
pub const LINK_DELAY_MS: u64 = 10;

/// Everything the CLI feeds into an experiment.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub scenario_selector: u32,
    pub requested_variant: String,
    pub queue: QueueKind,
    pub cbr_rate_mbps: f64,
    pub run_time_secs: u64,
    pub cbr_pkt_bytes: u32,
    pub seg_bytes: u32,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            scenario_selector: 1,
            requested_variant: "Vegas".to_string(),
            queue: QueueKind::DropTail,
            cbr_rate_mbps: 1.0,
            run_time_secs: 50,
            cbr_pkt_bytes: 950,
            seg_bytes: 1000,
        }
    }
}

/// Validate the configuration and build topology + flows.
///
/// Fatal configuration errors surface here, before anything runs: an
/// unsupported variant aborts before any topology is built, an unknown
/// scenario before any traffic is provisioned. On error no partial
/// experiment is left behind.
pub fn setup(cfg: ExperimentConfig) -> Result<Experiment, ConfigError> {
    let resolution = cc::resolve(&cfg.requested_variant)?;
    let scenario = Scenario::from_selector(cfg.scenario_selector)?;

    let run_time_secs = scenario.effective_run_time_secs(cfg.run_time_secs);
    let stop_at = SimTime::from_secs(run_time_secs);

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();

    let topo = build_linear(
        &mut world,
        &LinearOpts {
            nodes: scenario.node_count(),
            link_bandwidth_bps: LINK_BANDWIDTH_BPS,
            link_latency: SimTime::from_millis(LINK_DELAY_MS),
            queue: cfg.queue,
            subnet_base: scenario.subnet_base(),
        },
    );

    let params = TrafficParams {
        cbr_rate_bps: (cfg.cbr_rate_mbps * 1e6) as u64,
        cbr_pkt_bytes: cfg.cbr_pkt_bytes,
        seg_bytes: cfg.seg_bytes,
        stop_at,
    };
    let flow_ids = provision_flows(
        scenario,
        &topo,
        resolution.variant,
        &params,
        &mut sim,
        &mut world,
    );

    info!(
        scenario = scenario.selector(),
        variant = resolution.resolved_name(),
        queue = cfg.queue.name(),
        run_time_secs,
        "experiment configured"
    );

    Ok(Experiment {
        sim,
        world,
        scenario,
        resolution,
        queue: cfg.queue,
        cbr_rate_mbps: cfg.cbr_rate_mbps,
        run_time_secs,
        flow_ids,
    })
}

/// A fully configured experiment, ready to run exactly once.
pub struct Experiment {
    sim: Simulator,
    world: NetWorld,
    scenario: Scenario,
    resolution: CcResolution,
    queue: QueueKind,
    cbr_rate_mbps: f64,
    /// Effective run time, after the scenario's floor is applied.
    run_time_secs: u64,
    flow_ids: Vec<u64>,
}

impl Experiment {
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn resolution(&self) -> &CcResolution {
        &self.resolution
    }

    pub fn run_time_secs(&self) -> u64 {
        self.run_time_secs
    }

    pub fn world(&self) -> &NetWorld {
        &self.world
    }

    pub fn provisioned_flows(&self) -> &[u64] {
        &self.flow_ids
    }

    /// Advance simulated time to the stop time and halt.
    ///
    /// Consumes the experiment: after the halt only read-only statistics
    /// extraction is possible.
    pub fn run(mut self) -> ExperimentReport {
        let stop_at = SimTime::from_secs(self.run_time_secs);
        self.sim.run_until(stop_at, &mut self.world);
        info!(halted_at = ?self.sim.now(), "experiment halted");

        ExperimentReport {
            world: self.world,
            scenario: self.scenario,
            resolution: self.resolution,
            queue: self.queue,
            cbr_rate_mbps: self.cbr_rate_mbps,
            run_time_secs: self.run_time_secs,
            flow_ids: self.flow_ids,
        }
    }
}

/// Read-only view of a halted experiment.
pub struct ExperimentReport {
    world: NetWorld,
    scenario: Scenario,
    resolution: CcResolution,
    queue: QueueKind,
    cbr_rate_mbps: f64,
    run_time_secs: u64,
    flow_ids: Vec<u64>,
}

impl ExperimentReport {
    /// Snapshot of every provisioned flow's raw counters.
    pub fn flow_stats(&self) -> Vec<FlowStatsRecord> {
        self.world.net.flow_stats_snapshot()
    }

    pub fn network_stats(&self) -> &Stats {
        &self.world.net.stats
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn resolution(&self) -> &CcResolution {
        &self.resolution
    }

    pub fn queue(&self) -> QueueKind {
        self.queue
    }

    pub fn cbr_rate_mbps(&self) -> f64 {
        self.cbr_rate_mbps
    }

    pub fn run_time_secs(&self) -> u64 {
        self.run_time_secs
    }

    pub fn provisioned_flows(&self) -> &[u64] {
        &self.flow_ids
    }
}
