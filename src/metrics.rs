use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ScenarioConfig;
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::recorder::RunRecorder;
use crate::suppliers::Suppliers;

/// Gini coefficient for nonnegative values. 0 for a uniform distribution,
/// approaching 1 as everything concentrates on one entry.
pub fn gini(values: &[f64]) -> f64 {
    let mut vals: Vec<f64> = values.iter().map(|v| v.max(0.0)).collect();
    let s: f64 = vals.iter().sum();
    let n = vals.len();
    if n == 0 || s == 0.0 {
        return 0.0;
    }
    vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut cum = 0.0;
    for (i, v) in vals.iter().enumerate() {
        cum += (i + 1) as f64 * v;
    }
    (2.0 * cum) / (n as f64 * s) - (n as f64 + 1.0) / n as f64
}

/// Run identification attached to an exported result
#[derive(Debug, Clone, Serialize)]
pub struct MetaRecord {
    pub scenario: ScenarioConfig,
    pub seed: u64,
}

/// Recorded per-timestep series, flattened for export
#[derive(Debug, Clone, Serialize)]
pub struct TimeseriesRecord {
    pub co2_prod: Vec<f64>,
    pub co2_trans: Vec<f64>,
    pub co2_total: Vec<f64>,
    pub cost_total: Vec<f64>,
    pub allocated_total: Vec<f64>,
}

/// Whole-run aggregates
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord {
    pub co2_prod_sum: f64,
    pub co2_trans_sum: f64,
    pub co2_total_sum: f64,
    pub co2_total_mean: f64,
    pub cost_total_sum: f64,
    pub cost_total_mean: f64,
    pub total_allocated: f64,
    pub share_gini: f64,
    pub share_max: f64,
    pub share_std: f64,
}

/// Final state of one supplier after the run
#[derive(Debug, Clone, Serialize)]
pub struct SupplierRecord {
    /// Cumulative allocated quantity
    pub q: f64,
    /// Historical share of total cumulative allocation
    pub h: f64,
    /// Entitlement share of total capacity
    pub e: f64,
    pub f_rot: f64,
    pub f_disp: f64,
    pub f_uni: f64,
}

/// Cumulative quantity and share aggregated over a supplier group
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupRecord {
    pub q: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierBreakdown {
    pub by_id: BTreeMap<String, SupplierRecord>,
    pub by_group: BTreeMap<String, GroupRecord>,
}

/// Everything the external consumers need from one run
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub meta: MetaRecord,
    pub timeseries: TimeseriesRecord,
    pub summary: SummaryRecord,
    pub suppliers: SupplierBreakdown,
}

impl RunMetrics {
    /// Aggregate a finished run into the exportable metrics structure
    pub fn extract(
        scenario: &ScenarioConfig,
        suppliers: &Suppliers,
        recorder: &RunRecorder,
        seed: u64,
    ) -> Self {
        let t = scenario.t as usize;
        let co2_prod: Vec<f64> = recorder
            .emissions_per_t
            .iter()
            .take(t)
            .map(|e| e.co2_prod)
            .collect();
        let co2_trans: Vec<f64> = recorder
            .emissions_per_t
            .iter()
            .take(t)
            .map(|e| e.co2_trans)
            .collect();
        let co2_total: Vec<f64> = recorder
            .emissions_per_t
            .iter()
            .take(t)
            .map(|e| e.co2_total)
            .collect();
        let cost_total: Vec<f64> = recorder.cost_total_per_t.iter().take(t).copied().collect();
        let allocated_total: Vec<f64> = recorder
            .allocated_total_per_t
            .iter()
            .take(t)
            .copied()
            .collect();

        let co2_prod_sum: f64 = co2_prod.iter().sum();
        let co2_trans_sum: f64 = co2_trans.iter().sum();
        let co2_total_sum: f64 = co2_total.iter().sum();
        let cost_total_sum: f64 = cost_total.iter().sum();
        let co2_total_mean = mean(&co2_total);
        let cost_total_mean = mean(&cost_total);
        let total_allocated: f64 = allocated_total.iter().sum();

        let total_q: f64 = suppliers.suppliers.iter().map(|s| s.q_cum).sum();
        let total_cap: f64 = suppliers.suppliers.iter().map(|s| s.cap_nominal).sum();

        let mut by_id = BTreeMap::new();
        let mut by_group: BTreeMap<String, GroupRecord> = BTreeMap::new();
        let mut shares = Vec::with_capacity(suppliers.len());

        for s in &suppliers.suppliers {
            let h = if total_q > 0.0 { s.q_cum / total_q } else { 0.0 };
            let e = if total_cap > 0.0 {
                s.cap_nominal / total_cap
            } else {
                0.0
            };
            shares.push(h);
            by_id.insert(
                s.id.clone(),
                SupplierRecord {
                    q: s.q_cum,
                    h,
                    e,
                    f_rot: s.f_rot,
                    f_disp: s.f_disp,
                    f_uni: s.f_unified,
                },
            );

            let group = by_group.entry(s.group.label().to_string()).or_default();
            group.q += s.q_cum;
            group.h += h;
        }

        let share_gini = gini(&shares);
        let share_max = shares.iter().cloned().fold(0.0, f64::max);
        let share_std = pstdev(&shares);

        Self {
            meta: MetaRecord {
                scenario: scenario.clone(),
                seed,
            },
            timeseries: TimeseriesRecord {
                co2_prod,
                co2_trans,
                co2_total,
                cost_total,
                allocated_total,
            },
            summary: SummaryRecord {
                co2_prod_sum,
                co2_trans_sum,
                co2_total_sum,
                co2_total_mean,
                cost_total_sum,
                cost_total_mean,
                total_allocated,
                share_gini,
                share_max,
                share_std,
            },
            suppliers: SupplierBreakdown { by_id, by_group },
        }
    }

    /// Output the run summary through the logger
    pub fn printout(&self, logger: &mut Logger, event: LogEvent) {
        logln!(
            logger,
            event,
            "\nScenario {} ({})",
            self.meta.scenario.key,
            self.meta.scenario.name
        );
        logln!(logger, event, "Total CO2: {:.2}", self.summary.co2_total_sum);
        logln!(logger, event, "Mean Cost/t: {:.2}", self.summary.cost_total_mean);
        logln!(
            logger,
            event,
            "Gini(H): {:.3} | Max(H): {:.3}",
            self.summary.share_gini,
            self.summary.share_max
        );
        logln!(
            logger,
            event,
            "Total allocated: {:.1}",
            self.summary.total_allocated
        );
        for (group, record) in &self.suppliers.by_group {
            logln!(
                logger,
                event,
                "  Group {}: Q={:.1} H={:.3}",
                group,
                record.q,
                record.h
            );
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation, 0 for fewer than two values
fn pstdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::{AllocationMap, Emissions};
    use crate::supplier::SupplierGroup;
    use std::collections::HashMap;

    #[test]
    fn test_gini_uniform_is_zero() {
        assert_eq!(gini(&[1.0, 1.0, 1.0, 1.0]), 0.0);
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_gini_two_point_split() {
        // [0, 1]: cum = 1*0 + 2*1 = 2 -> 2*2/(2*1) - 3/2 = 0.5
        assert!((gini(&[0.0, 1.0]) - 0.5).abs() < 1e-12);
        assert!(gini(&[0.0, 0.0, 1.0]) > gini(&[0.0, 1.0, 1.0]));
    }

    #[test]
    fn test_extract_shares_and_groups() {
        let config = ScenarioConfig {
            key: "TEST",
            name: "test",
            t: 2,
            tau: 0.0,
            w_c: 1.0,
            w_e: 0.0,
            w_f: 0.0,
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
            delta: 0.5,
            use_individualized_lca: false,
            use_fairness: true,
            allocation_mode: crate::config::AllocationMode::Sequential,
        };

        let mut suppliers = Suppliers::new();
        suppliers.add(
            "A1".to_string(),
            SupplierGroup::A,
            12.0,
            4.0,
            100.0,
            HashMap::new(),
        );
        suppliers.add(
            "C1".to_string(),
            SupplierGroup::C,
            8.0,
            10.0,
            100.0,
            HashMap::new(),
        );
        suppliers.suppliers[0].q_cum = 30.0;
        suppliers.suppliers[1].q_cum = 90.0;

        let mut recorder = RunRecorder::new();
        let emissions = Emissions {
            co2_prod: 10.0,
            co2_trans: 2.0,
            co2_total: 12.0,
        };
        let mut allocations = AllocationMap::new();
        allocations.insert(("C1".to_string(), "B1".to_string()), 60.0);
        recorder.record(&allocations, &suppliers, emissions, 480.0);
        recorder.record(&allocations, &suppliers, emissions, 520.0);

        let metrics = RunMetrics::extract(&config, &suppliers, &recorder, 42);

        assert!((metrics.suppliers.by_id["A1"].h - 0.25).abs() < 1e-12);
        assert!((metrics.suppliers.by_id["C1"].h - 0.75).abs() < 1e-12);
        assert_eq!(metrics.suppliers.by_id["A1"].e, 0.5);
        assert_eq!(metrics.suppliers.by_group["C"].q, 90.0);
        assert!((metrics.summary.cost_total_mean - 500.0).abs() < 1e-12);
        assert_eq!(metrics.summary.co2_total_sum, 24.0);
        assert_eq!(metrics.summary.total_allocated, 120.0);
        assert!((metrics.summary.share_max - 0.75).abs() < 1e-12);
    }
}
