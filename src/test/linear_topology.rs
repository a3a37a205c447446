use crate::net::{NetWorld, NodeId};
use crate::queue::{PacketQueue, QueueKind};
use crate::topo::linear::{LinearOpts, LinearTopo, build_linear};
use std::collections::HashSet;

fn build(nodes: usize, queue: QueueKind) -> (NetWorld, LinearTopo) {
    let mut world = NetWorld::default();
    let topo = build_linear(
        &mut world,
        &LinearOpts {
            nodes,
            queue,
            ..LinearOpts::default()
        },
    );
    (world, topo)
}

#[test]
fn linear5_has_five_nodes_and_four_segments_with_distinct_blocks() {
    let (world, topo) = build(5, QueueKind::DropTail);
    assert_eq!(world.net.node_count(), 5);
    assert_eq!(topo.hosts.len(), 5);
    // One directed link per direction per segment.
    assert_eq!(world.net.links().len(), 8);

    let blocks: HashSet<_> = world.net.links().iter().map(|l| l.block).collect();
    assert_eq!(blocks.len(), 4, "each segment must own its own /24 block");
}

#[test]
fn linear9_has_nine_nodes_and_eight_segments_with_distinct_blocks() {
    let (world, topo) = build(9, QueueKind::DropTail);
    assert_eq!(world.net.node_count(), 9);
    assert_eq!(topo.hosts.len(), 9);
    assert_eq!(world.net.links().len(), 16);

    let blocks: HashSet<_> = world.net.links().iter().map(|l| l.block).collect();
    assert_eq!(blocks.len(), 8, "each segment must own its own /24 block");
}

#[test]
fn link_endpoints_draw_distinct_addresses_from_their_block() {
    let (world, _topo) = build(5, QueueKind::DropTail);
    for link in world.net.links() {
        assert_ne!(link.local_addr, link.peer_addr);
        let net = link.block.network().octets();
        assert_eq!(link.local_addr.octets()[..3], net[..3]);
        assert_eq!(link.peer_addr.octets()[..3], net[..3]);
    }
}

#[test]
fn routing_reaches_every_node_pair_along_the_chain() {
    let (world, topo) = build(5, QueueKind::DropTail);
    for (i, &from) in topo.hosts.iter().enumerate() {
        for (j, &dst) in topo.hosts.iter().enumerate() {
            if i == j {
                continue;
            }
            let nh = world
                .net
                .next_hop(from, dst)
                .unwrap_or_else(|| panic!("no next hop from n{i} to n{j}"));
            // The chain has exactly one shortest path: one step toward dst.
            let expected = if j > i { topo.hosts[i + 1] } else { topo.hosts[i - 1] };
            assert_eq!(nh, expected);
        }
    }
    assert_eq!(world.net.next_hop(NodeId(0), NodeId(4)), Some(NodeId(1)));
    assert_eq!(world.net.next_hop(NodeId(4), NodeId(0)), Some(NodeId(3)));
}

#[test]
fn red_is_attached_to_every_link_when_selected() {
    let (red_world, _) = build(5, QueueKind::Red);
    let (dt_world, _) = build(5, QueueKind::DropTail);

    let red_caps: HashSet<u64> = red_world
        .net
        .links()
        .iter()
        .map(|l| l.queue.capacity_bytes())
        .collect();
    let dt_caps: HashSet<u64> = dt_world
        .net
        .links()
        .iter()
        .map(|l| l.queue.capacity_bytes())
        .collect();

    // Uniform policy per run: a single capacity across all links, and the
    // two disciplines are distinguishable by their defaults.
    assert_eq!(red_caps.len(), 1);
    assert_eq!(dt_caps.len(), 1);
    assert_ne!(red_caps, dt_caps);
}
