use std::str::FromStr;

use serde::Serialize;

use crate::error::SimError;

/// How per-timestep demand is split across the ranked/eligible supplier pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    /// Walk suppliers in score order, each takes min(demand, capacity)
    Sequential,
    /// Split remaining demand by inverse-score weights in one pass
    Proportional,
}

impl FromStr for AllocationMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(AllocationMode::Sequential),
            "proportional" => Ok(AllocationMode::Proportional),
            other => Err(SimError::UnknownAllocationMode(other.to_string())),
        }
    }
}

/// Immutable parameters of one simulation run.
///
/// The allocation weights `alpha`/`beta`/`gamma` are carried through from the
/// scenario tables but no allocation algorithm consumes them; proportional
/// allocation derives its weights from scores instead.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioConfig {
    /// Short key used on the command line and in log/chart paths ("S1", "S3", ...)
    pub key: &'static str,
    pub name: &'static str,
    /// Number of timesteps
    pub t: u32,
    /// Carbon price
    pub tau: f64,
    /// Ranking weights (scenario-level weights override buyer hints)
    pub w_c: f64,
    pub w_e: f64,
    pub w_f: f64,
    /// Allocation weights, declared but unused
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Blend between rotation and disparity fairness (1.0 = pure rotation)
    pub delta: f64,
    pub use_individualized_lca: bool,
    pub use_fairness: bool,
    pub allocation_mode: AllocationMode,
}

impl ScenarioConfig {
    /// Check structural validity before a run. Degenerate but legal values
    /// (delta outside [0,1], zero weights) pass; they only change behavior.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.t == 0 {
            return Err(SimError::InvalidTimesteps {
                scenario: self.name.to_string(),
                t: self.t as i64,
            });
        }
        Ok(())
    }
}
