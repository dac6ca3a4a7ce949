use std::sync::atomic::{AtomicBool, AtomicU64};

/// When set, per-allocation CSV rows are emitted on the Allocation log event
/// (enabled via `--verbose allocation` on the command line)
pub static VERBOSE_ALLOCATION: AtomicBool = AtomicBool::new(false);

/// Process-wide counter of completed simulation runs
pub static TOTAL_SIMULATION_RUNS: AtomicU64 = AtomicU64::new(0);
