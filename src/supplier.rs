use std::collections::HashMap;

use serde::Serialize;

/// Supplier cohort tag, fixed at construction. Metrics aggregate by this tag
/// rather than parsing it back out of the supplier id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SupplierGroup {
    /// High cost, low CO2
    A,
    /// Medium cost, medium CO2
    B,
    /// Low cost, high CO2
    C,
}

impl SupplierGroup {
    pub fn label(self) -> &'static str {
        match self {
            SupplierGroup::A => "A",
            SupplierGroup::B => "B",
            SupplierGroup::C => "C",
        }
    }
}

/// One supplier in the pool.
///
/// Identity, base cost, nominal capacity, and distances are fixed for the
/// run. `co2` is refreshed from the environmental data every timestep;
/// `cap_available` is reset to `cap_nominal` at the start of every timestep
/// and drained by allocation. The fairness fields are advanced once per
/// timestep by the fairness engine.
#[derive(Debug, Clone)]
pub struct Supplier {
    pub id: String,
    pub group: SupplierGroup,
    /// Base unit cost
    pub c: f64,
    /// CO2 intensity for the current timestep
    pub co2: f64,
    /// Per-timestep capacity ceiling
    pub cap_nominal: f64,
    /// Distance to each buyer, keyed by buyer id
    pub distances: HashMap<String, f64>,

    /// Cumulative allocated quantity across all timesteps so far
    pub q_cum: f64,
    /// Consecutive timesteps since the last nonzero allocation
    pub rot_wait: u32,
    /// Rotation fairness signal, 1/(1 + rot_wait)
    pub f_rot: f64,
    /// Disparity fairness signal, clamped historical-vs-entitlement ratio
    pub f_disp: f64,
    /// Blended fairness signal
    pub f_unified: f64,

    /// Remaining capacity within the current timestep
    pub cap_available: f64,
}

impl Supplier {
    /// Create a supplier with fresh fairness state. Initial signal values
    /// match the pre-first-update state: rotation 0, disparity neutral.
    pub fn new(
        id: String,
        group: SupplierGroup,
        c: f64,
        co2: f64,
        cap_nominal: f64,
        distances: HashMap<String, f64>,
    ) -> Self {
        Self {
            id,
            group,
            c,
            co2,
            cap_nominal,
            distances,
            q_cum: 0.0,
            rot_wait: 0,
            f_rot: 0.0,
            f_disp: 1.0,
            f_unified: 1.0,
            cap_available: 0.0,
        }
    }

    /// Reset the within-timestep capacity to the nominal ceiling
    pub fn reset_capacity(&mut self) {
        self.cap_available = self.cap_nominal;
    }
}
