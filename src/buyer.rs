/// One buyer. The engine drives a single representative buyer per run, but
/// the data model supports several: distances and allocation records are
/// keyed per buyer.
#[derive(Debug, Clone)]
pub struct Buyer {
    pub id: String,
    /// Fixed per-timestep demand
    pub demand_nominal: f64,
    /// Ranking weight hints. The scoring policy uses scenario-level weights;
    /// these are carried for completeness of the record.
    pub w_c: f64,
    pub w_e: f64,
    pub w_f: f64,

    /// Remaining demand within the current timestep
    pub demand_remaining: f64,
}

impl Buyer {
    pub fn new(id: String, demand_nominal: f64, w_c: f64, w_e: f64, w_f: f64) -> Self {
        Self {
            id,
            demand_nominal,
            w_c,
            w_e,
            w_f,
            demand_remaining: 0.0,
        }
    }

    /// Reset the within-timestep demand to the nominal level
    pub fn reset_demand(&mut self) {
        self.demand_remaining = self.demand_nominal;
    }
}
