use std::collections::HashMap;

use crate::buyer::Buyer;
use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::supplier::Supplier;

/// Resolves supplier CO2 intensities and supplier-buyer distances.
/// Pure lookup, no state mutation.
pub struct EnvironmentalData {
    /// Industry-average CO2 intensity used when individualized data is off
    /// or missing
    pub static_co2: f64,
    /// Supplier-specific CO2 intensities, keyed by supplier id
    pub individualized_co2: HashMap<String, f64>,
    /// Transport emission factor per unit quantity per km
    pub co2_per_km: f64,
}

impl EnvironmentalData {
    pub fn new(
        static_co2: f64,
        individualized_co2: HashMap<String, f64>,
        co2_per_km: f64,
    ) -> Self {
        Self {
            static_co2,
            individualized_co2,
            co2_per_km,
        }
    }

    /// CO2 intensity for a supplier under the given scenario. Individualized
    /// mode falls back silently to the static average for unknown ids.
    pub fn co2_for(&self, supplier: &Supplier, scenario: &ScenarioConfig) -> f64 {
        if scenario.use_individualized_lca {
            self.individualized_co2
                .get(&supplier.id)
                .copied()
                .unwrap_or(self.static_co2)
        } else {
            self.static_co2
        }
    }

    /// Distance between a supplier and a buyer. A missing entry is a
    /// construction mistake and aborts the run.
    pub fn distance(&self, supplier: &Supplier, buyer: &Buyer) -> Result<f64, SimError> {
        supplier
            .distances
            .get(&buyer.id)
            .copied()
            .ok_or_else(|| SimError::MissingDistance {
                supplier: supplier.id.clone(),
                buyer: buyer.id.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocationMode;
    use crate::supplier::SupplierGroup;

    fn scenario(use_individualized_lca: bool) -> ScenarioConfig {
        ScenarioConfig {
            key: "TEST",
            name: "test",
            t: 1,
            tau: 0.0,
            w_c: 1.0,
            w_e: 0.0,
            w_f: 0.0,
            alpha: 1.0,
            beta: 0.0,
            gamma: 0.0,
            delta: 0.5,
            use_individualized_lca,
            use_fairness: false,
            allocation_mode: AllocationMode::Sequential,
        }
    }

    fn supplier(id: &str, distances: HashMap<String, f64>) -> Supplier {
        Supplier::new(id.to_string(), SupplierGroup::A, 10.0, 5.0, 100.0, distances)
    }

    #[test]
    fn test_static_co2_ignores_individualized_table() {
        let env = EnvironmentalData::new(
            5.0,
            HashMap::from([("A1".to_string(), 4.0)]),
            0.01,
        );
        let s = supplier("A1", HashMap::new());
        assert_eq!(env.co2_for(&s, &scenario(false)), 5.0);
    }

    #[test]
    fn test_individualized_co2_with_fallback() {
        let env = EnvironmentalData::new(
            5.0,
            HashMap::from([("A1".to_string(), 4.0)]),
            0.01,
        );
        let known = supplier("A1", HashMap::new());
        let unknown = supplier("Z9", HashMap::new());
        assert_eq!(env.co2_for(&known, &scenario(true)), 4.0);
        // Unknown id falls back to the static average, not an error
        assert_eq!(env.co2_for(&unknown, &scenario(true)), 5.0);
    }

    #[test]
    fn test_missing_distance_is_fatal() {
        let env = EnvironmentalData::new(5.0, HashMap::new(), 0.01);
        let s = supplier("A1", HashMap::from([("B1".to_string(), 120.0)]));
        let known_buyer = Buyer::new("B1".to_string(), 100.0, 1.0, 1.0, 1.0);
        let unknown_buyer = Buyer::new("B2".to_string(), 100.0, 1.0, 1.0, 1.0);

        assert_eq!(env.distance(&s, &known_buyer).unwrap(), 120.0);
        assert_eq!(
            env.distance(&s, &unknown_buyer),
            Err(SimError::MissingDistance {
                supplier: "A1".to_string(),
                buyer: "B2".to_string(),
            })
        );
    }
}
