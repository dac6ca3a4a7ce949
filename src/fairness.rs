use std::collections::HashMap;

use crate::marketplace::AllocationMap;
use crate::suppliers::Suppliers;

/// Maintains cumulative allocation history per supplier and derives the
/// rotation, disparity, and blended fairness signals. Advanced once per
/// timestep; state lives on the suppliers themselves.
pub struct FairnessEngine {
    /// Blend between rotation and disparity (1.0 = pure rotation)
    pub delta: f64,
    /// Numerical stability term
    pub eps: f64,
    /// Upper clamp on the disparity ratio, so a single early allocation
    /// cannot produce an unbounded signal
    pub disp_cap: f64,
}

impl FairnessEngine {
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            eps: 1e-9,
            disp_cap: 5.0,
        }
    }

    /// Advance the fairness state by one timestep.
    ///
    /// 1. Accumulate this timestep's quantities into each supplier's total.
    /// 2. Rotation: a positive allocation resets the wait counter, a miss
    ///    increments it; the signal is 1/(1 + wait).
    /// 3. Disparity: historical share over entitlement share, clamped to
    ///    [eps, disp_cap]; neutral 1.0 for everyone until there is history.
    /// 4. Unified: linear delta blend of the two.
    pub fn update(&self, suppliers: &mut Suppliers, allocations: &AllocationMap) {
        let mut allocated_by_supplier: HashMap<&str, f64> = HashMap::new();
        for ((sid, _), q) in allocations {
            *allocated_by_supplier.entry(sid.as_str()).or_insert(0.0) += q;
        }

        for s in &mut suppliers.suppliers {
            let allocated = allocated_by_supplier
                .get(s.id.as_str())
                .copied()
                .unwrap_or(0.0);
            s.q_cum += allocated;

            if allocated > 0.0 {
                s.rot_wait = 0;
            } else {
                s.rot_wait += 1;
            }
            s.f_rot = 1.0 / (1.0 + s.rot_wait as f64);
        }

        let total_q: f64 = suppliers.suppliers.iter().map(|s| s.q_cum).sum();
        let total_cap: f64 = suppliers.suppliers.iter().map(|s| s.cap_nominal).sum();

        if total_q <= self.eps || total_cap <= self.eps {
            for s in &mut suppliers.suppliers {
                s.f_disp = 1.0;
            }
        } else {
            for s in &mut suppliers.suppliers {
                let h_s = s.q_cum / (total_q + self.eps);
                let e_s = s.cap_nominal / (total_cap + self.eps);
                let ratio = h_s / (e_s + self.eps);
                s.f_disp = ratio.clamp(self.eps, self.disp_cap);
            }
        }

        for s in &mut suppliers.suppliers {
            s.f_unified = self.delta * s.f_rot + (1.0 - self.delta) * s.f_disp;
        }
    }

    /// Force every signal to neutral. Used when fairness is disabled for the
    /// scenario, so the scoring policy's fairness term normalizes to a
    /// constant. Cumulative totals are NOT advanced in that case.
    pub fn neutralize(&self, suppliers: &mut Suppliers) {
        for s in &mut suppliers.suppliers {
            s.f_rot = 1.0;
            s.f_disp = 1.0;
            s.f_unified = 1.0;
        }
    }
}
