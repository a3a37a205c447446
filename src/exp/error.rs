//! Configuration errors that abort an experiment before it runs.

use thiserror::Error;

use crate::cc::UnsupportedVariant;

/// Fatal setup errors. Detected synchronously while configuring; the process
/// must abort without running any traffic or printing a summary.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    UnsupportedVariant(#[from] UnsupportedVariant),
    #[error("unknown scenario selector {0} (expected 1 or 2)")]
    UnknownScenario(u32),
}
