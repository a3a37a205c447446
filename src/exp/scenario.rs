//! Scenario catalog: the two supported topology shapes and their traffic.
//!
//! Shapes are data-driven descriptions (node count, traffic table) selected
//! by a closed enum, so a third shape would not touch the driver or the
//! metrics aggregation.

use serde::Serialize;

use super::error::ConfigError;

/// Which congestion-control variant a bulk flow uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcChoice {
    /// The variant requested on the command line (after resolution).
    Requested,
    /// Always the loss-based baseline, regardless of the request.
    Baseline,
}

/// One flow to provision, in terms of node indices within the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSpec {
    Bulk { src: usize, dst: usize, cc: CcChoice },
    Cbr { src: usize, dst: usize },
}

/// Supported topology shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scenario {
    /// 5 nodes chained by 4 point-to-point links.
    Linear5,
    /// 9 nodes chained by 8 point-to-point links.
    Linear9,
}

impl Scenario {
    /// Map the CLI selector to a scenario; anything but 1/2 is fatal.
    pub fn from_selector(selector: u32) -> Result<Self, ConfigError> {
        match selector {
            1 => Ok(Scenario::Linear5),
            2 => Ok(Scenario::Linear9),
            other => Err(ConfigError::UnknownScenario(other)),
        }
    }

    pub fn selector(self) -> u32 {
        match self {
            Scenario::Linear5 => 1,
            Scenario::Linear9 => 2,
        }
    }

    pub fn node_count(self) -> usize {
        match self {
            Scenario::Linear5 => 5,
            Scenario::Linear9 => 9,
        }
    }

    /// First two octets of the /24 blocks assigned to this scenario's links.
    pub fn subnet_base(self) -> (u8, u8) {
        match self {
            Scenario::Linear5 => (10, 0),
            Scenario::Linear9 => (10, 1),
        }
    }

    /// Minimum run time: the longer chain needs more time for its flows to
    /// reach steady state.
    pub fn min_run_time_secs(self) -> u64 {
        match self {
            Scenario::Linear5 => 0,
            Scenario::Linear9 => 100,
        }
    }

    /// The run time actually used: the request, raised to the floor.
    pub fn effective_run_time_secs(self, requested_secs: u64) -> u64 {
        requested_secs.max(self.min_run_time_secs())
    }

    /// Flows this scenario provisions.
    pub fn traffic(self) -> Vec<FlowSpec> {
        match self {
            Scenario::Linear5 => vec![
                FlowSpec::Bulk {
                    src: 0,
                    dst: 4,
                    cc: CcChoice::Requested,
                },
                FlowSpec::Cbr { src: 1, dst: 4 },
            ],
            Scenario::Linear9 => vec![
                FlowSpec::Bulk {
                    src: 0,
                    dst: 7,
                    cc: CcChoice::Requested,
                },
                FlowSpec::Bulk {
                    src: 2,
                    dst: 8,
                    cc: CcChoice::Baseline,
                },
                FlowSpec::Cbr { src: 1, dst: 7 },
            ],
        }
    }
}
