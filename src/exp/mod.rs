//! Experiment orchestration.
//!
//! Scenario catalog, flow provisioning, the run-to-halt driver, and the
//! reduction of per-flow counters into scenario-level metrics.

mod driver;
mod error;
mod metrics;
mod provision;
mod scenario;

pub use driver::{
    Experiment, ExperimentConfig, ExperimentReport, LINK_BANDWIDTH_BPS, LINK_DELAY_MS, setup,
};
pub use error::ConfigError;
pub use metrics::{RunSummary, ScenarioMetrics, aggregate};
pub use provision::{TrafficParams, provision_flows};
pub use scenario::{CcChoice, FlowSpec, Scenario};
