use std::collections::BTreeMap;

use serde::Serialize;

use crate::buyer::Buyer;
use crate::environment::EnvironmentalData;
use crate::error::SimError;
use crate::scoring::ScoringPolicy;
use crate::suppliers::Suppliers;

/// Allocation record for one timestep: (supplier id, buyer id) -> quantity.
/// Produced fresh each timestep, never carried across timesteps.
pub type AllocationMap = BTreeMap<(String, String), f64>;

/// Per-timestep emissions, derived from the allocation record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Emissions {
    pub co2_prod: f64,
    pub co2_trans: f64,
    pub co2_total: f64,
}

/// Per-timestep orchestration: capacity/demand refresh, feasibility
/// filtering, ranking, allocation, emissions and cost computation.
pub struct Marketplace {
    pub env: EnvironmentalData,
    pub policy: ScoringPolicy,
}

impl Marketplace {
    pub fn new(env: EnvironmentalData, policy: ScoringPolicy) -> Self {
        Self { env, policy }
    }

    /// Reset capacities and demands at the start of a timestep
    pub fn refresh_state(&self, suppliers: &mut Suppliers, buyers: &mut [Buyer]) {
        for s in &mut suppliers.suppliers {
            s.reset_capacity();
        }
        for b in buyers {
            b.reset_demand();
        }
    }

    /// Feasibility filter: indices of suppliers with remaining capacity,
    /// in pool order
    pub fn filter_suppliers(&self, suppliers: &Suppliers) -> Vec<usize> {
        suppliers
            .suppliers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.cap_available > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Rank eligible suppliers ascending by score. The sort is stable, so
    /// equal scores keep the order the suppliers were presented in.
    pub fn rank_suppliers(
        &self,
        suppliers: &Suppliers,
        eligible: &[usize],
        buyer: &Buyer,
    ) -> Vec<usize> {
        let pool: Vec<&_> = eligible.iter().map(|&i| &suppliers.suppliers[i]).collect();
        let scores = self.policy.compute_scores(&pool, buyer);

        let mut ranked = eligible.to_vec();
        ranked.sort_by(|&a, &b| {
            let score_a = scores[&suppliers.suppliers[a].id];
            let score_b = scores[&suppliers.suppliers[b].id];
            score_a
                .partial_cmp(&score_b)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Sequential allocation: walk the ranked list, each supplier takes
    /// min(remaining demand, remaining capacity). Suppliers reached after
    /// demand is exhausted are absent from the record.
    pub fn allocate_sequential(
        &self,
        suppliers: &mut Suppliers,
        ranked: &[usize],
        buyer: &mut Buyer,
    ) -> AllocationMap {
        let mut allocations = AllocationMap::new();
        for &i in ranked {
            if buyer.demand_remaining <= 0.0 {
                break;
            }
            let s = &mut suppliers.suppliers[i];
            if s.cap_available <= 0.0 {
                continue;
            }

            let q = buyer.demand_remaining.min(s.cap_available);
            allocations.insert((s.id.clone(), buyer.id.clone()), q);
            s.cap_available -= q;
            buyer.demand_remaining -= q;
        }
        allocations
    }

    /// Proportional allocation based on inverse-score weights.
    ///
    /// A score of exactly 0 gets weight 0 and is excluded rather than
    /// dominant. If every weight is 0 the record is empty and no demand is
    /// satisfied this timestep. Each quantity is capped by the supplier's
    /// own remaining capacity with no redistribution of the shortfall, and
    /// demand is zeroed afterwards regardless of whether the caps let it be
    /// met. Every eligible supplier gets a record entry, possibly 0.
    pub fn allocate_proportional(
        &self,
        suppliers: &mut Suppliers,
        eligible: &[usize],
        buyer: &mut Buyer,
    ) -> AllocationMap {
        let mut allocations = AllocationMap::new();

        let pool: Vec<&_> = eligible.iter().map(|&i| &suppliers.suppliers[i]).collect();
        let scores = self.policy.compute_scores(&pool, buyer);

        let weights: Vec<f64> = eligible
            .iter()
            .map(|&i| {
                let score = scores[&suppliers.suppliers[i].id];
                if score > 0.0 {
                    1.0 / score
                } else {
                    0.0
                }
            })
            .collect();

        let total_w: f64 = weights.iter().sum();
        if total_w == 0.0 {
            return allocations;
        }

        for (&i, &w) in eligible.iter().zip(weights.iter()) {
            let s = &mut suppliers.suppliers[i];
            let share = w / total_w;
            let q = (share * buyer.demand_remaining).min(s.cap_available);
            allocations.insert((s.id.clone(), buyer.id.clone()), q);
            s.cap_available -= q;
        }

        buyer.demand_remaining = 0.0;
        allocations
    }

    /// Production and transport emissions for one timestep's allocations.
    /// Fails if a supplier-buyer distance is missing (misconfiguration).
    pub fn compute_emissions(
        &self,
        suppliers: &Suppliers,
        buyer: &Buyer,
        allocations: &AllocationMap,
    ) -> Result<Emissions, SimError> {
        let mut co2_prod = 0.0;
        let mut co2_trans = 0.0;

        for ((sid, _), q) in allocations {
            let s = suppliers
                .get(sid)
                .expect("allocation references a supplier in the pool");
            co2_prod += q * s.co2;

            let d_sb = self.env.distance(s, buyer)?;
            co2_trans += d_sb * self.env.co2_per_km * q;
        }

        Ok(Emissions {
            co2_prod,
            co2_trans,
            co2_total: co2_prod + co2_trans,
        })
    }

    /// Total procurement cost for one timestep's allocations. Recomputes the
    /// carbon-adjusted cost from the supplier's CO2 value as of this
    /// timestep.
    pub fn compute_cost_total(&self, suppliers: &Suppliers, allocations: &AllocationMap) -> f64 {
        let mut total = 0.0;
        for ((sid, _), q) in allocations {
            let s = suppliers
                .get(sid)
                .expect("allocation references a supplier in the pool");
            total += q * self.policy.carbon_adjusted_cost(s.c, s.co2);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AllocationMode, ScenarioConfig};
    use crate::supplier::SupplierGroup;
    use std::collections::HashMap;

    fn scenario(w_c: f64, w_e: f64, w_f: f64, use_fairness: bool) -> ScenarioConfig {
        ScenarioConfig {
            key: "TEST",
            name: "test",
            t: 1,
            tau: 0.0,
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

    fn marketplace(config: ScenarioConfig) -> Marketplace {
        Marketplace::new(
            EnvironmentalData::new(5.0, HashMap::new(), 0.01),
            ScoringPolicy::new(config),
        )
    }

    fn buyer(demand: f64) -> Buyer {
        Buyer::new("B1".to_string(), demand, 1.0, 1.0, 1.0)
    }

    fn pool(entries: &[(&str, f64, f64, f64)]) -> Suppliers {
        let mut suppliers = Suppliers::new();
        for &(id, c, co2, cap) in entries {
            suppliers.add(
                id.to_string(),
                SupplierGroup::A,
                c,
                co2,
                cap,
                HashMap::from([("B1".to_string(), 100.0)]),
            );
        }
        for s in &mut suppliers.suppliers {
            s.reset_capacity();
        }
        suppliers
    }

    #[test]
    fn test_sequential_fills_cheapest_first() {
        let market = marketplace(scenario(1.0, 0.0, 0.0, false));
        let mut suppliers = pool(&[("S1", 12.0, 5.0, 100.0), ("S2", 8.0, 5.0, 100.0)]);
        let mut b = buyer(120.0);
        b.reset_demand();

        let eligible = market.filter_suppliers(&suppliers);
        let ranked = market.rank_suppliers(&suppliers, &eligible, &b);
        let allocations = market.allocate_sequential(&mut suppliers, &ranked, &mut b);

        assert_eq!(allocations[&("S2".to_string(), "B1".to_string())], 100.0);
        assert_eq!(allocations[&("S1".to_string(), "B1".to_string())], 20.0);
        assert_eq!(b.demand_remaining, 0.0);
    }

    #[test]
    fn test_sequential_ties_keep_presentation_order() {
        // Equal costs score identically; the stable sort leaves pool order
        let market = marketplace(scenario(1.0, 0.0, 0.0, false));
        let mut suppliers = pool(&[
            ("S1", 10.0, 5.0, 100.0),
            ("S2", 10.0, 5.0, 100.0),
            ("S3", 10.0, 5.0, 100.0),
        ]);
        let mut b = buyer(150.0);
        b.reset_demand();

        let eligible = market.filter_suppliers(&suppliers);
        let ranked = market.rank_suppliers(&suppliers, &eligible, &b);
        assert_eq!(ranked, vec![0, 1, 2]);

        let allocations = market.allocate_sequential(&mut suppliers, &ranked, &mut b);
        assert_eq!(allocations[&("S1".to_string(), "B1".to_string())], 100.0);
        assert_eq!(allocations[&("S2".to_string(), "B1".to_string())], 50.0);
        assert!(!allocations.contains_key(&("S3".to_string(), "B1".to_string())));
    }

    #[test]
    fn test_sequential_respects_capacity_invariant() {
        let market = marketplace(scenario(1.0, 0.0, 0.0, false));
        let mut suppliers = pool(&[("S1", 8.0, 5.0, 30.0), ("S2", 10.0, 5.0, 30.0)]);
        let mut b = buyer(1000.0);
        b.reset_demand();

        let eligible = market.filter_suppliers(&suppliers);
        let ranked = market.rank_suppliers(&suppliers, &eligible, &b);
        let allocations = market.allocate_sequential(&mut suppliers, &ranked, &mut b);

        for ((sid, _), q) in &allocations {
            let cap = suppliers.get(sid).unwrap().cap_nominal;
            assert!(*q <= cap);
        }
        // Demand exceeds total capacity: everything allocated, demand remains
        let total: f64 = allocations.values().sum();
        assert_eq!(total, 60.0);
        assert_eq!(b.demand_remaining, 940.0);
    }

    #[test]
    fn test_sequential_empty_eligible_set_allocates_nothing() {
        let market = marketplace(scenario(1.0, 0.0, 0.0, false));
        let mut suppliers = pool(&[("S1", 8.0, 5.0, 100.0)]);
        suppliers.suppliers[0].cap_available = 0.0;
        let mut b = buyer(120.0);
        b.reset_demand();

        let eligible = market.filter_suppliers(&suppliers);
        assert!(eligible.is_empty());
        let ranked = market.rank_suppliers(&suppliers, &eligible, &b);
        let allocations = market.allocate_sequential(&mut suppliers, &ranked, &mut b);
        assert!(allocations.is_empty());
    }

    #[test]
    fn test_proportional_equal_scores_split_demand_evenly() {
        // Mirrored cost/CO2 attributes give equal nonzero scores
        let market = marketplace(scenario(1.0, 1.0, 0.0, false));
        let mut suppliers = pool(&[("S1", 8.0, 10.0, 100.0), ("S2", 10.0, 8.0, 100.0)]);
        let mut b = buyer(120.0);
        b.reset_demand();

        let eligible = market.filter_suppliers(&suppliers);
        let allocations = market.allocate_proportional(&mut suppliers, &eligible, &mut b);

        let q1 = allocations[&("S1".to_string(), "B1".to_string())];
        let q2 = allocations[&("S2".to_string(), "B1".to_string())];
        assert!((q1 - 60.0).abs() < 1e-9);
        assert!((q2 - 60.0).abs() < 1e-9);
        assert_eq!(b.demand_remaining, 0.0);
    }

    #[test]
    fn test_proportional_zero_score_is_excluded() {
        // S1 is cheapest and cleanest, so both normalized vectors put it at
        // exactly 0: weight 0, excluded from the split despite being "best"
        let market = marketplace(scenario(1.0, 1.0, 0.0, false));
        let mut suppliers = pool(&[("S1", 8.0, 4.0, 100.0), ("S2", 10.0, 8.0, 100.0)]);
        let mut b = buyer(120.0);
        b.reset_demand();

        let eligible = market.filter_suppliers(&suppliers);
        let allocations = market.allocate_proportional(&mut suppliers, &eligible, &mut b);

        assert_eq!(allocations[&("S1".to_string(), "B1".to_string())], 0.0);
        assert!((allocations[&("S2".to_string(), "B1".to_string())] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_proportional_all_zero_weights_yields_empty_record() {
        // Identical suppliers: every vector is degenerate, every score 0
        let market = marketplace(scenario(1.0, 1.0, 0.0, false));
        let mut suppliers = pool(&[("S1", 10.0, 5.0, 100.0), ("S2", 10.0, 5.0, 100.0)]);
        let mut b = buyer(120.0);
        b.reset_demand();

        let eligible = market.filter_suppliers(&suppliers);
        let allocations = market.allocate_proportional(&mut suppliers, &eligible, &mut b);

        assert!(allocations.is_empty());
        // No meaningful split: demand is left untouched
        assert_eq!(b.demand_remaining, 120.0);
    }

    #[test]
    fn test_proportional_capping_does_not_redistribute() {
        // S1's weight-share of demand exceeds its capacity; the excess is
        // lost for this timestep, not shifted to S2, and demand is still
        // zeroed afterwards.
        let market = marketplace(scenario(1.0, 1.0, 0.0, false));
        let mut suppliers = pool(&[("S1", 8.0, 10.0, 40.0), ("S2", 10.0, 8.0, 100.0)]);
        let mut b = buyer(200.0);
        b.reset_demand();

        let eligible = market.filter_suppliers(&suppliers);
        let allocations = market.allocate_proportional(&mut suppliers, &eligible, &mut b);

        let q1 = allocations[&("S1".to_string(), "B1".to_string())];
        let q2 = allocations[&("S2".to_string(), "B1".to_string())];
        assert_eq!(q1, 40.0);
        assert!((q2 - 100.0).abs() < 1e-9);
        let total: f64 = allocations.values().sum();
        assert!(total < 200.0);
        assert_eq!(b.demand_remaining, 0.0);
    }

    #[test]
    fn test_emissions_and_cost_from_allocations() {
        let config = ScenarioConfig {
            tau: 1.0,
            ..scenario(1.0, 0.0, 0.0, false)
        };
        let market = marketplace(config);
        let suppliers = pool(&[("S1", 8.0, 10.0, 100.0)]);
        let b = buyer(50.0);

        let mut allocations = AllocationMap::new();
        allocations.insert(("S1".to_string(), "B1".to_string()), 50.0);

        let emissions = market.compute_emissions(&suppliers, &b, &allocations).unwrap();
        assert!((emissions.co2_prod - 500.0).abs() < 1e-9);
        // distance 100 km at 0.01 per km per unit
        assert!((emissions.co2_trans - 50.0).abs() < 1e-9);
        assert!((emissions.co2_total - 550.0).abs() < 1e-9);

        // cost = q * (c + tau*co2) = 50 * 18
        let cost = market.compute_cost_total(&suppliers, &allocations);
        assert!((cost - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_emissions_missing_distance_is_fatal() {
        let market = marketplace(scenario(1.0, 0.0, 0.0, false));
        let suppliers = pool(&[("S1", 8.0, 10.0, 100.0)]);
        let other_buyer = Buyer::new("B9".to_string(), 50.0, 1.0, 1.0, 1.0);

        let mut allocations = AllocationMap::new();
        allocations.insert(("S1".to_string(), "B9".to_string()), 50.0);

        assert!(matches!(
            market.compute_emissions(&suppliers, &other_buyer, &allocations),
            Err(SimError::MissingDistance { .. })
        ));
    }

    #[test]
    fn test_cost_uses_current_timestep_co2() {
        let config = ScenarioConfig {
            tau: 1.0,
            ..scenario(1.0, 0.0, 0.0, false)
        };
        let market = marketplace(config);
        let mut suppliers = pool(&[("S1", 8.0, 10.0, 100.0)]);

        let mut allocations = AllocationMap::new();
        allocations.insert(("S1".to_string(), "B1".to_string()), 10.0);

        let before = market.compute_cost_total(&suppliers, &allocations);
        suppliers.suppliers[0].co2 = 2.0;
        let after = market.compute_cost_total(&suppliers, &allocations);
        assert!((before - 180.0).abs() < 1e-9);
        assert!((after - 100.0).abs() < 1e-9);
    }
}
