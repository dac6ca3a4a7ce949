use std::sync::atomic::Ordering;

use crate::buyer::Buyer;
use crate::config::{AllocationMode, ScenarioConfig};
use crate::error::SimError;
use crate::fairness::FairnessEngine;
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::marketplace::Marketplace;
use crate::recorder::RunRecorder;
use crate::suppliers::Suppliers;
use crate::utils::{TOTAL_SIMULATION_RUNS, VERBOSE_ALLOCATION};
use crate::warnln;

/// Progress of a run through its timestep loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    NotStarted,
    Running(u32),
    Completed,
}

/// Drives T timesteps over the marketplace and fairness engine, recording
/// one complete entry per timestep. Owns all mutable entity state for the
/// duration of the run.
pub struct Simulation {
    pub scenario: ScenarioConfig,
    pub suppliers: Suppliers,
    pub buyers: Vec<Buyer>,
    pub marketplace: Marketplace,
    pub fairness: FairnessEngine,
    pub state: SimState,
}

impl Simulation {
    pub fn new(
        scenario: ScenarioConfig,
        suppliers: Suppliers,
        buyers: Vec<Buyer>,
        marketplace: Marketplace,
        fairness: FairnessEngine,
    ) -> Self {
        Self {
            scenario,
            suppliers,
            buyers,
            marketplace,
            fairness,
            state: SimState::NotStarted,
        }
    }

    /// Run the full timestep loop. Strictly sequential, no early
    /// termination; the only failure is a fatal configuration error.
    /// The first buyer acts as the representative buyer.
    pub fn run(&mut self, recorder: &mut RunRecorder, logger: &mut Logger) -> Result<(), SimError> {
        self.scenario.validate()?;

        for t in 1..=self.scenario.t {
            self.state = SimState::Running(t);

            // 1) Refresh capacities and demand
            self.marketplace
                .refresh_state(&mut self.suppliers, &mut self.buyers);

            // 2) Refresh supplier CO2 values (static or individualized)
            for i in 0..self.suppliers.len() {
                let co2 = self
                    .marketplace
                    .env
                    .co2_for(&self.suppliers.suppliers[i], &self.scenario);
                self.suppliers.suppliers[i].co2 = co2;
            }

            // 3) Feasibility filtering
            let eligible = self.marketplace.filter_suppliers(&self.suppliers);

            // 4) Allocation
            let buyer = &mut self.buyers[0];
            let allocations = match self.scenario.allocation_mode {
                AllocationMode::Sequential => {
                    let ranked = self
                        .marketplace
                        .rank_suppliers(&self.suppliers, &eligible, buyer);
                    self.marketplace
                        .allocate_sequential(&mut self.suppliers, &ranked, buyer)
                }
                AllocationMode::Proportional => self.marketplace.allocate_proportional(
                    &mut self.suppliers,
                    &eligible,
                    buyer,
                ),
            };

            // 5) Fairness update, or neutral signals when disabled
            if self.scenario.use_fairness {
                self.fairness.update(&mut self.suppliers, &allocations);
            } else {
                self.fairness.neutralize(&mut self.suppliers);
            }

            // 6) Emissions and cost
            let buyer = &self.buyers[0];
            let emissions = self
                .marketplace
                .compute_emissions(&self.suppliers, buyer, &allocations)?;
            let cost_total = self
                .marketplace
                .compute_cost_total(&self.suppliers, &allocations);

            if VERBOSE_ALLOCATION.load(Ordering::Relaxed) {
                for ((sid, bid), q) in &allocations {
                    logln!(logger, LogEvent::Allocation, "{},{},{},{:.4}", t, sid, bid, q);
                }
            }
            let allocated_total: f64 = allocations.values().sum();
            logln!(
                logger,
                LogEvent::Timestep,
                "t={} allocated={:.2} cost={:.2} co2_total={:.2}",
                t,
                allocated_total,
                cost_total,
                emissions.co2_total
            );
            // Capacity caps in proportional mode can leave demand unmet;
            // the shortfall is not redistributed
            if self.scenario.allocation_mode == AllocationMode::Proportional
                && !allocations.is_empty()
                && allocated_total < buyer.demand_nominal - 1e-9
            {
                warnln!(
                    logger,
                    LogEvent::Timestep,
                    "t={} under-fulfilled: allocated {:.2} of {:.2}",
                    t,
                    allocated_total,
                    buyer.demand_nominal
                );
            }

            // 7) Record the complete per-timestep entry
            recorder.record(&allocations, &self.suppliers, emissions, cost_total);
        }

        self.state = SimState::Completed;
        TOTAL_SIMULATION_RUNS.fetch_add(1, Ordering::Relaxed);

        let total_allocated: f64 = recorder.allocated_total_per_t.iter().sum();
        let total_cost: f64 = recorder.cost_total_per_t.iter().sum();
        let total_co2: f64 = recorder.emissions_per_t.iter().map(|e| e.co2_total).sum();
        logln!(
            logger,
            LogEvent::Simulation,
            "{}: {} timesteps, allocated {:.1}, cost {:.1}, CO2 {:.1}",
            self.scenario.name,
            self.scenario.t,
            total_allocated,
            total_cost,
            total_co2
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvironmentalData;
    use crate::scoring::ScoringPolicy;
    use crate::supplier::SupplierGroup;
    use std::collections::HashMap;

    fn scenario(t: u32, mode: AllocationMode, use_fairness: bool) -> ScenarioConfig {
        ScenarioConfig {
            key: "TEST",
            name: "test",
            t,
            tau: 0.0,
            w_c: 1.0,
            w_e: 0.0,
            w_f: 0.0,
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
            delta: 0.5,
            use_individualized_lca: false,
            use_fairness,
            allocation_mode: mode,
        }
    }

    fn simulation(config: ScenarioConfig) -> Simulation {
        let mut suppliers = Suppliers::new();
        for (id, c) in [("S1", 8.0), ("S2", 10.0), ("S3", 12.0)] {
            suppliers.add(
                id.to_string(),
                SupplierGroup::A,
                c,
                5.0,
                100.0,
                HashMap::from([("B1".to_string(), 100.0)]),
            );
        }
        let buyers = vec![Buyer::new("B1".to_string(), 120.0, 1.0, 1.0, 1.0)];
        let env = EnvironmentalData::new(5.0, HashMap::new(), 0.01);
        let policy = ScoringPolicy::new(config.clone());
        Simulation::new(
            config,
            suppliers,
            buyers,
            Marketplace::new(env, policy),
            FairnessEngine::new(0.5),
        )
    }

    #[test]
    fn test_run_records_every_timestep() {
        let mut sim = simulation(scenario(5, AllocationMode::Sequential, false));
        let mut recorder = RunRecorder::new();
        let mut logger = Logger::new();

        assert_eq!(sim.state, SimState::NotStarted);
        sim.run(&mut recorder, &mut logger).unwrap();
        assert_eq!(sim.state, SimState::Completed);
        assert_eq!(recorder.len(), 5);
        for total in &recorder.allocated_total_per_t {
            assert!((total - 120.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_timesteps_is_fatal() {
        let mut sim = simulation(scenario(0, AllocationMode::Sequential, false));
        let mut recorder = RunRecorder::new();
        let mut logger = Logger::new();
        assert!(matches!(
            sim.run(&mut recorder, &mut logger),
            Err(SimError::InvalidTimesteps { .. })
        ));
        assert_eq!(sim.state, SimState::NotStarted);
    }

    #[test]
    fn test_fairness_disabled_keeps_signals_neutral_and_totals_zero() {
        let mut sim = simulation(scenario(4, AllocationMode::Sequential, false));
        let mut recorder = RunRecorder::new();
        let mut logger = Logger::new();
        sim.run(&mut recorder, &mut logger).unwrap();

        for snapshot in &recorder.fairness_snapshots {
            for record in snapshot.values() {
                assert_eq!(record.f_rot, 1.0);
                assert_eq!(record.f_disp, 1.0);
                assert_eq!(record.f_unified, 1.0);
                // The fairness engine is bypassed entirely, so cumulative
                // quantities are never accumulated
                assert_eq!(record.q_cum, 0.0);
            }
        }
    }

    #[test]
    fn test_fairness_enabled_accumulates_history() {
        let mut sim = simulation(scenario(3, AllocationMode::Sequential, true));
        let mut recorder = RunRecorder::new();
        let mut logger = Logger::new();
        sim.run(&mut recorder, &mut logger).unwrap();

        // Cheapest supplier takes 100 per timestep
        let last = recorder.fairness_snapshots.last().unwrap();
        assert_eq!(last["S1"].q_cum, 300.0);
        assert_eq!(last["S2"].q_cum, 60.0);
        assert_eq!(last["S3"].q_cum, 0.0);
        assert_eq!(last["S3"].f_rot, 0.25);
        assert_eq!(sim.suppliers.get("S1").unwrap().q_cum, 300.0);
    }

    #[test]
    fn test_capacity_invariant_holds_every_timestep() {
        let mut sim = simulation(scenario(10, AllocationMode::Proportional, true));
        let mut recorder = RunRecorder::new();
        let mut logger = Logger::new();
        sim.run(&mut recorder, &mut logger).unwrap();

        for allocations in &recorder.allocations_per_t {
            let mut per_supplier: HashMap<&str, f64> = HashMap::new();
            for ((sid, _), q) in allocations {
                *per_supplier.entry(sid.as_str()).or_insert(0.0) += q;
            }
            for (sid, q) in per_supplier {
                assert!(q <= sim.suppliers.get(sid).unwrap().cap_nominal + 1e-9);
            }
        }
    }
}
