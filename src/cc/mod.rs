//! Congestion-control variants and name resolution.
//!
//! The set of supported variants is a closed enum; requested names are mapped
//! to it once, before any topology exists. Legacy-only names fall back to the
//! loss-based baseline with a warning, unknown names abort the experiment.

mod resolve;
mod variant;

pub use resolve::{CcResolution, UnsupportedVariant, resolve};
pub use variant::{CcVariant, VEGAS_ALPHA_SEGS, VEGAS_BETA_SEGS, VEGAS_GAMMA_SEGS};
