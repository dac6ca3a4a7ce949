
#[allow(unused_imports)]
mod buyer;
mod charts;
mod config;
mod environment;
mod error;
mod fairness;
mod logger;
mod marketplace;
mod metrics;
mod recorder;
mod scenarios;
mod scoring;
mod simulation;
mod supplier;
mod suppliers;
mod utils;

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use logger::{ConsoleReceiver, FileReceiver, LogEvent, Logger, sanitize_filename};
use metrics::RunMetrics;
use scenarios::{config_catalog, get_scenario_catalog, run_scenario};
use utils::{TOTAL_SIMULATION_RUNS, VERBOSE_ALLOCATION};

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // Parse and filter out --verbose and --fastbreak arguments
    let mut args = Vec::new();
    let mut skip_next = false;
    let mut fastbreak = false;
    for (i, arg) in raw_args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--verbose" {
            if i + 1 < raw_args.len() && raw_args[i + 1] == "allocation" {
                VERBOSE_ALLOCATION.store(true, Ordering::Relaxed);
                skip_next = true;
            }
            continue;
        }
        if arg == "--fastbreak" {
            fastbreak = true;
            continue;
        }
        args.push(arg.clone());
    }

    // Check if "charts" argument is provided
    if args.len() > 1 && args[1] == "charts" {
        let result = if args.len() > 2 && args[2] != "all" {
            charts::generate_scenario_charts(&args[2])
        } else {
            charts::generate_all_charts()
        };
        match result {
            Ok(()) => {
                println!("All chart generation completed successfully.");
            }
            Err(e) => {
                eprintln!("Error generating charts: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Check if "results" argument is provided
    if args.len() > 1 && args[1] == "results" {
        let seed = if args.len() > 2 {
            match args[2].parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: Invalid seed parameter '{}'. Expected a number.", args[2]);
                    std::process::exit(1);
                }
            }
        } else {
            42
        };
        match write_results(seed) {
            Ok(()) => {
                println!("Saved results.json");
            }
            Err(e) => {
                eprintln!("Error writing results: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if args.len() > 1 {
        let scenario_arg = &args[1];

        // Parse iterations parameter if present
        let iterations = if args.len() > 2 {
            match args[2].parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: Invalid iterations parameter '{}'. Expected a number.", args[2]);
                    std::process::exit(1);
                }
            }
        } else {
            1
        };

        // Parse optional starting iteration index if present
        let start_iteration = if args.len() > 3 {
            match args[3].parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: Invalid start iteration parameter '{}'. Expected a number.", args[3]);
                    std::process::exit(1);
                }
            }
        } else {
            0
        };

        // Get all scenarios from the catalog
        let all_scenarios = get_scenario_catalog();

        // Filter scenarios: if "all", use all scenarios; otherwise filter to the named scenario
        let scenarios: Vec<_> = if scenario_arg == "all" {
            all_scenarios.clone()
        } else {
            let found = all_scenarios.iter().find(|s| s.short_name == scenario_arg);
            match found {
                Some(scenario) => vec![scenario.clone()],
                None => {
                    eprintln!("Error: Scenario '{}' not found.", scenario_arg);
                    eprintln!("Available scenarios:");
                    for s in &all_scenarios {
                        eprintln!("  - {}", s.short_name);
                    }
                    std::process::exit(1);
                }
            }
        };

        // Set up logger with console and validation file receivers.
        // Single-scenario single-iteration runs also show Scenario events so
        // individual validations are visible; multi-iteration runs keep the
        // console to pass/fail marks.
        let mut logger = Logger::new();
        if scenario_arg == "all" || iterations > 1 {
            logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation]));
        } else {
            logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation, LogEvent::Scenario]));
        }

        // Add validation receiver (for validation events)
        let summary_receiver_id = logger.add_receiver(FileReceiver::new(
            &PathBuf::from("log/summary.log"),
            vec![LogEvent::Validation],
        ));

        // Reset and log initial simulation run count
        TOTAL_SIMULATION_RUNS.store(0, Ordering::Relaxed);

        if scenario_arg == "all" {
            if iterations > 1 {
                logln!(&mut logger, LogEvent::Validation, "Running all scenarios {} times...\n", iterations);
            } else {
                logln!(&mut logger, LogEvent::Validation, "Running all scenarios...\n");
            }
        } else if iterations > 1 {
            logln!(&mut logger, LogEvent::Validation, "Running scenario '{}' {} times...\n", scenario_arg, iterations);
        } else {
            logln!(&mut logger, LogEvent::Validation, "Running scenario '{}'...\n", scenario_arg);
        }

        // Outer loop for scenarios
        'scenarios: for scenario in &scenarios {
            log!(&mut logger, LogEvent::Validation, "{}: ", scenario.short_name);

            // Add scenario-level receiver
            let scenario_receiver_id = logger.add_receiver(FileReceiver::new(
                &PathBuf::from(format!("log/{}/scenario.log", sanitize_filename(scenario.short_name))),
                vec![LogEvent::Scenario],
            ));

            // Inner loop for iterations; the iteration index doubles as the
            // run seed so reruns are reproducible
            for i in start_iteration..(start_iteration + iterations) {
                if iterations > 1 {
                    let iteration_num = i - start_iteration + 1;
                    log!(&mut logger, LogEvent::Validation, "[{}/{}] ", iteration_num, iterations);
                }

                // Create allocation CSV receiver for this iteration
                let allocations_receiver_id = if VERBOSE_ALLOCATION.load(Ordering::Relaxed) {
                    let receiver_id = logger.add_receiver(FileReceiver::new(
                        &PathBuf::from(format!(
                            "log/{}/allocations-iter{}.csv",
                            sanitize_filename(scenario.short_name),
                            i + 1
                        )),
                        vec![LogEvent::Allocation],
                    ));
                    logln!(&mut logger, LogEvent::Allocation, "t,supplier_id,buyer_id,quantity");
                    Some(receiver_id)
                } else {
                    None
                };

                let outcome = (scenario.run)(scenario.short_name, i, &mut logger);

                if let Some(id) = allocations_receiver_id {
                    logger.remove_receiver(id);
                }

                match outcome {
                    Ok(()) => {
                        if iterations > 1 {
                            logln!(&mut logger, LogEvent::Validation, "✓");
                        } else {
                            logln!(&mut logger, LogEvent::Validation, "✓ PASSED");
                        }
                    }
                    Err(e) => {
                        if iterations > 1 {
                            logln!(&mut logger, LogEvent::Validation, "✗");
                        } else {
                            logln!(&mut logger, LogEvent::Validation, "✗ FAILED: {}", e);
                        }

                        // If fastbreak is enabled, stop immediately on first failure
                        if fastbreak {
                            logger.remove_receiver(scenario_receiver_id);
                            logln!(&mut logger, LogEvent::Validation, "\nStopping scenario execution due to failure (--fastbreak enabled)");
                            if iterations > 1 {
                                let iteration_num = i - start_iteration + 1;
                                logln!(&mut logger, LogEvent::Validation, "Error at iteration {}/{} (seed {}): {}", iteration_num, iterations, i, e);
                            } else {
                                logln!(&mut logger, LogEvent::Validation, "Error: {}", e);
                            }
                            break 'scenarios;
                        }
                    }
                }

                // Flush to ensure validation is written to summary.log
                let _ = logger.flush();
            }

            // Remove scenario-level receiver
            logger.remove_receiver(scenario_receiver_id);
        }

        // Log final simulation run count
        let final_count = TOTAL_SIMULATION_RUNS.load(Ordering::Relaxed);
        logln!(&mut logger, LogEvent::Validation, "\nTotal simulation runs completed: {}", final_count);

        // Remove validation receiver
        logger.remove_receiver(summary_receiver_id);
    } else {
        // Default behavior: run the baseline scenario with run-level verbosity
        let mut logger = Logger::new();
        logger.add_receiver(ConsoleReceiver::new(vec![
            LogEvent::Simulation,
            LogEvent::Scenario,
            LogEvent::Validation,
        ]));
        if let Err(e) = scenarios::baseline::run("baseline", 42, &mut logger) {
            eprintln!("Error running scenario: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run every scenario in the config catalog at one seed and export the
/// extracted metrics as results.json
fn write_results(seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut logger = Logger::new();
    let mut results: BTreeMap<String, RunMetrics> = BTreeMap::new();

    for config in config_catalog() {
        let (simulation, recorder) = run_scenario(&config, seed, &mut logger)?;
        let metrics = RunMetrics::extract(&config, &simulation.suppliers, &recorder, seed);
        results.insert(config.key.to_string(), metrics);
    }

    let file = File::create("results.json")?;
    serde_json::to_writer_pretty(file, &results)?;
    Ok(())
}
