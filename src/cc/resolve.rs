//! Variant name resolution with legacy fallback.

use thiserror::Error;
use tracing::warn;

use super::variant::CcVariant;

/// Fatal: the requested name matches neither a supported variant nor a
/// legacy name with a designated fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported congestion-control variant {requested:?} (supported: NewReno, Vegas)")]
pub struct UnsupportedVariant {
    pub requested: String,
}

/// Outcome of resolving a requested variant name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcResolution {
    pub variant: CcVariant,
    pub requested: String,
    /// True when a legacy-only name was substituted by the fallback variant.
    pub substituted: bool,
}

impl CcResolution {
    /// Name of the variant actually installed.
    pub fn resolved_name(&self) -> &'static str {
        self.variant.name()
    }
}

/// Map a requested variant name to a concrete supported variant.
///
/// Supported names pass through unchanged. Legacy names (`Reno`, `Tahoe`)
/// fall back to `NewReno` and log exactly one warning naming both sides.
/// Anything else is a fatal configuration error; the caller must abort
/// before building any topology.
pub fn resolve(requested: &str) -> Result<CcResolution, UnsupportedVariant> {
    let (variant, substituted) = match requested {
        "NewReno" => (CcVariant::NewReno, false),
        "Vegas" => (CcVariant::Vegas, false),
        "Reno" | "Tahoe" => {
            let fallback = CcVariant::NewReno;
            warn!(
                requested,
                substituted = fallback.name(),
                "congestion-control variant not available, using fallback"
            );
            (fallback, true)
        }
        _ => {
            return Err(UnsupportedVariant {
                requested: requested.to_string(),
            });
        }
    };
    Ok(CcResolution {
        variant,
        requested: requested.to_string(),
        substituted,
    })
}
