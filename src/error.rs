use thiserror::Error;

/// Fatal configuration errors. Anything else the engine encounters
/// (empty eligible sets, zero demand, degenerate score vectors) is absorbed
/// as an empty allocation for the timestep and the run continues.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// A supplier's distance table has no entry for the buyer it is being
    /// matched against. This is a construction mistake, not a runtime
    /// condition, so the run aborts.
    #[error("supplier '{supplier}' has no distance entry for buyer '{buyer}'")]
    MissingDistance { supplier: String, buyer: String },

    /// A run must cover at least one timestep
    #[error("scenario '{scenario}' has non-positive timestep count {t}")]
    InvalidTimesteps { scenario: String, t: i64 },

    /// Allocation mode string did not parse to a known mode
    #[error("unknown allocation mode '{0}' (expected 'sequential' or 'proportional')")]
    UnknownAllocationMode(String),
}
