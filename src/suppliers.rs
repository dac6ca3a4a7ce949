use std::collections::HashMap;

pub use crate::supplier::{Supplier, SupplierGroup};

/// Container for the supplier pool.
///
/// Insertion order is load-bearing: ranking uses a stable sort, so ties are
/// resolved by the order suppliers were added here.
pub struct Suppliers {
    pub suppliers: Vec<Supplier>,
}

impl Suppliers {
    pub fn new() -> Self {
        Self {
            suppliers: Vec::new(),
        }
    }

    /// Add a supplier to the pool
    ///
    /// # Arguments
    /// * `id` - Supplier id, unique within the pool
    /// * `group` - Cohort tag used by metrics aggregation
    /// * `c` - Base unit cost
    /// * `co2` - Initial CO2 intensity (refreshed from environmental data each timestep)
    /// * `cap_nominal` - Per-timestep capacity ceiling
    /// * `distances` - Distance to each buyer, keyed by buyer id
    pub fn add(
        &mut self,
        id: String,
        group: SupplierGroup,
        c: f64,
        co2: f64,
        cap_nominal: f64,
        distances: HashMap<String, f64>,
    ) {
        self.suppliers
            .push(Supplier::new(id, group, c, co2, cap_nominal, distances));
    }

    /// Look up a supplier by id
    pub fn get(&self, id: &str) -> Option<&Supplier> {
        self.suppliers.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }
}

impl Default for Suppliers {
    fn default() -> Self {
        Self::new()
    }
}
