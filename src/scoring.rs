use std::collections::HashMap;

use crate::buyer::Buyer;
use crate::config::ScenarioConfig;
use crate::supplier::Supplier;

/// Converts supplier attributes and the fairness signal into a single scalar
/// score per supplier. Lower is better.
pub struct ScoringPolicy {
    pub scenario: ScenarioConfig,
    /// Numerical stability term for min-max normalization
    pub eps: f64,
}

impl ScoringPolicy {
    pub fn new(scenario: ScenarioConfig) -> Self {
        Self {
            scenario,
            eps: 1e-9,
        }
    }

    /// Carbon-adjusted cost: base cost plus carbon price times CO2 intensity
    pub fn carbon_adjusted_cost(&self, base_cost: f64, co2: f64) -> f64 {
        base_cost + self.scenario.tau * co2
    }

    /// Min-max normalize a vector into [0,1]. The eps in the denominator
    /// maps a degenerate (all-equal) vector to all zeros instead of dividing
    /// by zero.
    fn minmax(&self, vals: &[f64]) -> Vec<f64> {
        if vals.is_empty() {
            return Vec::new();
        }
        let vmin = vals.iter().cloned().fold(f64::INFINITY, f64::min);
        let vmax = vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let denom = (vmax - vmin) + self.eps;
        vals.iter().map(|v| (v - vmin) / denom).collect()
    }

    /// Score every supplier in the pool for the given buyer.
    ///
    /// Normalization runs over exactly the pool passed in, so scores are
    /// relative to the currently-eligible set, not the full universe.
    /// Ranking weights come from the scenario; the buyer's weight hints are
    /// not consulted. Pure with respect to current supplier state.
    pub fn compute_scores(&self, pool: &[&Supplier], _buyer: &Buyer) -> HashMap<String, f64> {
        let c_primes: Vec<f64> = pool
            .iter()
            .map(|s| self.carbon_adjusted_cost(s.c, s.co2))
            .collect();
        let co2s: Vec<f64> = pool.iter().map(|s| s.co2).collect();

        let f_n = if self.scenario.use_fairness {
            let fs: Vec<f64> = pool.iter().map(|s| s.f_unified).collect();
            self.minmax(&fs)
        } else {
            vec![0.0; pool.len()]
        };

        let c_n = self.minmax(&c_primes);
        let e_n = self.minmax(&co2s);

        let mut scores = HashMap::with_capacity(pool.len());
        for (i, s) in pool.iter().enumerate() {
            let score =
                self.scenario.w_c * c_n[i] + self.scenario.w_e * e_n[i] + self.scenario.w_f * f_n[i];
            scores.insert(s.id.clone(), score);
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocationMode;
    use crate::supplier::SupplierGroup;
    use std::collections::HashMap as StdHashMap;

    fn scenario(tau: f64, w_c: f64, w_e: f64, w_f: f64, use_fairness: bool) -> ScenarioConfig {
        ScenarioConfig {
            key: "TEST",
            name: "test",
            t: 1,
            tau,
            w_c,
            w_e,
            w_f,
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
            delta: 0.5,
            use_individualized_lca: false,
            use_fairness,
            allocation_mode: AllocationMode::Sequential,
        }
    }

    fn supplier(id: &str, c: f64, co2: f64) -> Supplier {
        Supplier::new(
            id.to_string(),
            SupplierGroup::A,
            c,
            co2,
            100.0,
            StdHashMap::new(),
        )
    }

    fn buyer() -> Buyer {
        Buyer::new("B1".to_string(), 120.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn test_cost_only_ranking_order() {
        let policy = ScoringPolicy::new(scenario(0.0, 1.0, 0.0, 0.0, false));
        let cheap = supplier("S1", 8.0, 10.0);
        let mid = supplier("S2", 10.0, 7.0);
        let dear = supplier("S3", 12.0, 4.0);
        let pool = vec![&cheap, &mid, &dear];

        let scores = policy.compute_scores(&pool, &buyer());
        assert!(scores["S1"] < scores["S2"]);
        assert!(scores["S2"] < scores["S3"]);
        // Cheapest normalizes to exactly zero
        assert_eq!(scores["S1"], 0.0);
    }

    #[test]
    fn test_carbon_price_flips_ranking() {
        // tau = 1: cheap-but-dirty 8+10=18 vs dear-but-clean 12+4=16
        let policy = ScoringPolicy::new(scenario(1.0, 1.0, 0.0, 0.0, false));
        let dirty = supplier("S1", 8.0, 10.0);
        let clean = supplier("S2", 12.0, 4.0);
        let pool = vec![&dirty, &clean];

        let scores = policy.compute_scores(&pool, &buyer());
        assert!(scores["S2"] < scores["S1"]);
    }

    #[test]
    fn test_degenerate_vector_normalizes_to_zero() {
        let policy = ScoringPolicy::new(scenario(0.0, 1.0, 1.0, 0.0, false));
        let a = supplier("S1", 10.0, 5.0);
        let b = supplier("S2", 10.0, 5.0);
        let pool = vec![&a, &b];

        let scores = policy.compute_scores(&pool, &buyer());
        assert_eq!(scores["S1"], 0.0);
        assert_eq!(scores["S2"], 0.0);
    }

    #[test]
    fn test_scores_are_idempotent() {
        let policy = ScoringPolicy::new(scenario(1.0, 0.3, 0.4, 0.3, true));
        let mut a = supplier("S1", 8.0, 10.0);
        let mut b = supplier("S2", 12.0, 4.0);
        a.f_unified = 0.7;
        b.f_unified = 1.3;
        let pool = vec![&a, &b];

        let first = policy.compute_scores(&pool, &buyer());
        let second = policy.compute_scores(&pool, &buyer());
        assert_eq!(first, second);
    }

    #[test]
    fn test_fairness_disabled_zeroes_fairness_term() {
        // With w_f alone the score must be 0 for everyone when fairness is off
        let policy = ScoringPolicy::new(scenario(0.0, 0.0, 0.0, 1.0, false));
        let mut a = supplier("S1", 8.0, 10.0);
        let mut b = supplier("S2", 12.0, 4.0);
        a.f_unified = 0.2;
        b.f_unified = 1.9;
        let pool = vec![&a, &b];

        let scores = policy.compute_scores(&pool, &buyer());
        assert_eq!(scores["S1"], 0.0);
        assert_eq!(scores["S2"], 0.0);
    }

    #[test]
    fn test_empty_pool_yields_empty_scores() {
        let policy = ScoringPolicy::new(scenario(0.0, 1.0, 0.0, 0.0, false));
        let scores = policy.compute_scores(&[], &buyer());
        assert!(scores.is_empty());
    }
}
