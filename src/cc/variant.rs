//! Supported congestion-control variants.

use serde::Serialize;

/// Congestion-control variant governing a reliable bulk flow's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CcVariant {
    /// Loss-based baseline: slow start + AIMD with fast retransmit/recovery.
    NewReno,
    /// Delay-based: per-RTT expected-vs-actual rate comparison against the
    /// minimum observed RTT.
    Vegas,
}

/// Vegas lower backlog threshold (segments): grow below this.
pub const VEGAS_ALPHA_SEGS: f64 = 2.0;
/// Vegas upper backlog threshold (segments): shrink above this.
pub const VEGAS_BETA_SEGS: f64 = 4.0;
/// Vegas slow-start exit threshold (segments).
pub const VEGAS_GAMMA_SEGS: f64 = 1.0;

impl CcVariant {
    pub fn name(self) -> &'static str {
        match self {
            CcVariant::NewReno => "NewReno",
            CcVariant::Vegas => "Vegas",
        }
    }
}
