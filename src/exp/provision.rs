//! Flow provisioning: sinks first, then senders, ports unique per node.

use std::collections::HashMap;

use tracing::info;

use super::scenario::{CcChoice, FlowSpec, Scenario};
use crate::cc::CcVariant;
use crate::net::{NetWorld, NodeId};
use crate::proto::bulk::{BulkConfig, BulkConn, BulkStart, UNBOUNDED_BYTES};
use crate::proto::cbr::{CbrFlow, CbrSend};
use crate::sim::{SimTime, Simulator};
use crate::topo::linear::LinearTopo;

/// Per-run traffic parameters shared by all flows.
#[derive(Debug, Clone)]
pub struct TrafficParams {
    pub cbr_rate_bps: u64,
    pub cbr_pkt_bytes: u32,
    pub seg_bytes: u32,
    /// Experiment stop time.
    pub stop_at: SimTime,
}

const FIRST_PORT: u16 = 5000;

/// Hands out listening ports, unique within each destination node.
#[derive(Debug, Default)]
struct PortAllocator {
    next: HashMap<NodeId, u16>,
}

impl PortAllocator {
    fn alloc(&mut self, node: NodeId) -> u16 {
        let next = self.next.entry(node).or_insert(FIRST_PORT);
        let port = *next;
        *next += 1;
        port
    }
}

/// Instantiate every flow the scenario calls for.
///
/// For each flow the sink is opened before the sender is armed, so no sender
/// targets a non-listening destination at t = 0. Bulk flows are unbounded and
/// run for the whole experiment; CBR flows send continuously (100 % on duty
/// cycle) until the stop time. Returns the provisioned flow ids.
pub fn provision_flows(
    scenario: Scenario,
    topo: &LinearTopo,
    requested_variant: CcVariant,
    params: &TrafficParams,
    sim: &mut Simulator,
    world: &mut NetWorld,
) -> Vec<u64> {
    let mut ports = PortAllocator::default();
    let mut flow_ids = Vec::new();
    let mut next_flow_id: u64 = 1;

    for spec in scenario.traffic() {
        let flow_id = next_flow_id;
        next_flow_id += 1;
        flow_ids.push(flow_id);
        world.net.register_flow(flow_id);

        match spec {
            FlowSpec::Bulk { src, dst, cc } => {
                let (src, dst) = (topo.hosts[src], topo.hosts[dst]);
                let wanted = match cc {
                    CcChoice::Requested => requested_variant,
                    CcChoice::Baseline => CcVariant::NewReno,
                };
                // Install the variant as the source node's transport default;
                // the flow then picks it up from the node, like any socket
                // created on it would.
                world.net.set_cc_default(src, wanted);
                let variant = world.net.cc_default(src);

                let port = ports.alloc(dst);
                world.net.bulk.open_sink(dst, port);

                let cfg = BulkConfig {
                    seg_bytes: params.seg_bytes,
                    init_cwnd_bytes: (params.seg_bytes as u64).saturating_mul(10),
                    init_ssthresh_bytes: (params.seg_bytes as u64).saturating_mul(1_000),
                    ..BulkConfig::default()
                };
                let conn =
                    BulkConn::new(flow_id, src, dst, port, variant, UNBOUNDED_BYTES, cfg);

                info!(
                    flow_id,
                    src = ?src,
                    dst = ?dst,
                    port,
                    variant = variant.name(),
                    "provisioned bulk flow"
                );
                sim.schedule(SimTime::ZERO, BulkStart { conn });
            }
            FlowSpec::Cbr { src, dst } => {
                let (src, dst) = (topo.hosts[src], topo.hosts[dst]);
                let port = ports.alloc(dst);
                world.net.cbr.open_sink(dst, port);
                world.net.cbr.insert_flow(CbrFlow {
                    id: flow_id,
                    src,
                    dst,
                    port,
                    rate_bps: params.cbr_rate_bps,
                    pkt_bytes: params.cbr_pkt_bytes,
                    stop_at: params.stop_at,
                });

                info!(flow_id, src = ?src, dst = ?dst, port, "provisioned cbr flow");
                sim.schedule(SimTime::ZERO, CbrSend { flow_id });
            }
        }
    }

    flow_ids
}
