//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件，如节点、链路、数据包、转发表和按流统计。

// 子模块声明
mod addr;
mod deliver_packet;
mod id;
mod link;
mod link_ready;
mod net_world;
mod network;
mod node;
mod packet;
mod routing;
mod stats;

// 重新导出公共接口
pub use addr::{SubnetAllocator, SubnetBlock};
pub use deliver_packet::DeliverPacket;
pub use id::{LinkId, NodeId};
pub use link::Link;
pub use link_ready::LinkReady;
pub use net_world::NetWorld;
pub use network::Network;
pub use node::Host;
pub use packet::{Packet, PacketKind};
pub use routing::RoutingTable;
pub use stats::{FlowStatsRecord, Stats};
