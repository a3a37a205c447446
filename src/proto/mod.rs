//! 传输层模块
//!
//! 包含可靠大流量传输（NewReno / Vegas 拥塞控制）与恒定速率流的
//! 简化实现（用于仿真实验）。

pub mod bulk;
pub mod cbr;
