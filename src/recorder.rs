use std::collections::BTreeMap;

use serde::Serialize;

use crate::marketplace::{AllocationMap, Emissions};
use crate::suppliers::Suppliers;

/// Fairness state of one supplier as of the end of a timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FairnessSnapshot {
    pub q_cum: f64,
    pub f_rot: f64,
    pub f_disp: f64,
    pub f_unified: f64,
}

/// Per-run time series recorded once per timestep by the simulation loop.
/// All entries are copies of the engine state, so later in-place mutation of
/// the suppliers cannot alias into the record.
pub struct RunRecorder {
    pub allocations_per_t: Vec<AllocationMap>,
    pub emissions_per_t: Vec<Emissions>,
    pub cost_total_per_t: Vec<f64>,
    pub allocated_total_per_t: Vec<f64>,
    pub fairness_snapshots: Vec<BTreeMap<String, FairnessSnapshot>>,
}

impl RunRecorder {
    pub fn new() -> Self {
        Self {
            allocations_per_t: Vec::new(),
            emissions_per_t: Vec::new(),
            cost_total_per_t: Vec::new(),
            allocated_total_per_t: Vec::new(),
            fairness_snapshots: Vec::new(),
        }
    }

    /// Append the complete record for one timestep
    pub fn record(
        &mut self,
        allocations: &AllocationMap,
        suppliers: &Suppliers,
        emissions: Emissions,
        cost_total: f64,
    ) {
        self.allocations_per_t.push(allocations.clone());
        self.emissions_per_t.push(emissions);
        self.cost_total_per_t.push(cost_total);
        self.allocated_total_per_t
            .push(allocations.values().sum());

        let snapshot = suppliers
            .suppliers
            .iter()
            .map(|s| {
                (
                    s.id.clone(),
                    FairnessSnapshot {
                        q_cum: s.q_cum,
                        f_rot: s.f_rot,
                        f_disp: s.f_disp,
                        f_unified: s.f_unified,
                    },
                )
            })
            .collect();
        self.fairness_snapshots.push(snapshot);
    }

    /// Number of recorded timesteps
    pub fn len(&self) -> usize {
        self.cost_total_per_t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cost_total_per_t.is_empty()
    }
}

impl Default for RunRecorder {
    fn default() -> Self {
        Self::new()
    }
}
