use plotters::prelude::*;
use std::fs;

use crate::logger::Logger;
use crate::metrics::RunMetrics;
use crate::scenarios::{config_catalog, find_config, run_scenario};

/// Seed used for chart runs, so regenerated figures are comparable
const CHART_SEED: u64 = 42;

/// Generate the per-scenario time-series charts for one scenario key
pub fn generate_scenario_charts(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = find_config(key).ok_or_else(|| format!("Unknown scenario key '{}'", key))?;

    // Chart runs are quiet; the figures are the output
    let mut logger = Logger::new();
    let (simulation, recorder) = run_scenario(&config, CHART_SEED, &mut logger)?;

    let dir = format!("charts/{}", key);
    fs::create_dir_all(&dir)?;

    create_line_chart(
        &[("Cost".to_string(), recorder.cost_total_per_t.clone())],
        &format!("{} - Procurement Cost per Timestep", key),
        &format!("{}/cost_per_timestep.png", dir),
        "Cost",
    )?;

    let emissions_series = vec![
        (
            "Production".to_string(),
            recorder.emissions_per_t.iter().map(|e| e.co2_prod).collect(),
        ),
        (
            "Transport".to_string(),
            recorder.emissions_per_t.iter().map(|e| e.co2_trans).collect(),
        ),
        (
            "Total".to_string(),
            recorder.emissions_per_t.iter().map(|e| e.co2_total).collect(),
        ),
    ];
    create_line_chart(
        &emissions_series,
        &format!("{} - Emissions per Timestep", key),
        &format!("{}/emissions_per_timestep.png", dir),
        "CO2",
    )?;

    let fairness_series: Vec<(String, Vec<f64>)> = simulation
        .suppliers
        .suppliers
        .iter()
        .map(|s| {
            let values = recorder
                .fairness_snapshots
                .iter()
                .map(|snapshot| snapshot[&s.id].f_unified)
                .collect();
            (s.id.clone(), values)
        })
        .collect();
    create_line_chart(
        &fairness_series,
        &format!("{} - Unified Fairness Signal", key),
        &format!("{}/fairness_unified.png", dir),
        "F_unified",
    )?;

    Ok(())
}

/// Generate time-series charts for every scenario in the catalog plus the
/// cross-scenario comparison bars
pub fn generate_all_charts() -> Result<(), Box<dyn std::error::Error>> {
    for config in config_catalog() {
        generate_scenario_charts(config.key)?;
    }
    generate_comparison_charts()
}

/// Cross-scenario bar charts: total emissions and mean cost per timestep
pub fn generate_comparison_charts() -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all("charts")?;

    let mut logger = Logger::new();
    let mut keys = Vec::new();
    let mut co2_totals = Vec::new();
    let mut cost_means = Vec::new();
    for config in config_catalog() {
        let (simulation, recorder) = run_scenario(&config, CHART_SEED, &mut logger)?;
        let metrics = RunMetrics::extract(&config, &simulation.suppliers, &recorder, CHART_SEED);
        keys.push(config.key.to_string());
        co2_totals.push(metrics.summary.co2_total_sum);
        cost_means.push(metrics.summary.cost_total_mean);
    }

    create_bar_chart(
        &keys,
        &co2_totals,
        "Total CO2 by Scenario",
        "charts/total_co2_by_scenario.png",
        "Total CO2 (sum over T)",
    )?;
    create_bar_chart(
        &keys,
        &cost_means,
        "Mean Cost per Timestep by Scenario",
        "charts/mean_cost_by_scenario.png",
        "Mean Cost/t",
    )?;

    Ok(())
}

/// Helper to draw one or more series over the timestep axis
fn create_line_chart(
    series: &[(String, Vec<f64>)],
    title: &str,
    filename: &str,
    y_label: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let t_max = series.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    if t_max == 0 {
        return Err("Cannot create line chart: no data points".into());
    }

    let mut y_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    for (_, values) in series {
        for &v in values {
            y_max = y_max.max(v);
            y_min = y_min.min(v);
        }
    }
    let headroom = (y_max - y_min).max(1.0) * 0.1;
    let y_range = (y_min - headroom)..(y_max + headroom);

    let root = BitMapBackend::new(filename, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 25))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1f64..t_max as f64, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Timestep")
        .y_desc(y_label)
        .draw()?;

    for (index, (name, values)) in series.iter().enumerate() {
        let color = Palette99::pick(index);
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(t, &v)| ((t + 1) as f64, v))
            .collect();
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], Palette99::pick(index))
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    println!("Chart saved to {}", filename);

    Ok(())
}

/// Helper to draw one bar per scenario key
fn create_bar_chart(
    keys: &[String],
    values: &[f64],
    title: &str,
    filename: &str,
    y_label: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if keys.is_empty() || keys.len() != values.len() {
        return Err("Cannot create bar chart: mismatched or empty data".into());
    }

    let y_max = values.iter().cloned().fold(0.0, f64::max);

    let root = BitMapBackend::new(filename, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 25))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..keys.len() as f64, 0f64..y_max * 1.1)?;

    let labels = keys.to_vec();
    chart
        .configure_mesh()
        .x_labels(keys.len())
        .x_label_formatter(&move |x| {
            labels
                .get(x.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .x_desc("Scenario")
        .y_desc(y_label)
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
        Rectangle::new([(i as f64 + 0.15, 0.0), (i as f64 + 0.85, v)], BLUE.filled())
    }))?;

    root.present()?;
    println!("Chart saved to {}", filename);

    Ok(())
}
