//! cellring CLI - Headless driver standing in for a presentation layer.
//!
//! Runs the simulation on the worker pool, hosts a consumer loop on a
//! `ThreadExecutor` that periodically snapshots the baseline generation, and
//! injects one scripted erase gesture halfway through the run.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use std::{fs, thread};

use cellring::{
    compute::{GridStats, SimulationScheduler, ThreadExecutor, ToroidalGrid},
    schema::EngineConfig,
};

/// Consumer cadence, matching a ~60 Hz render loop.
const FRAME_INTERVAL: Duration = Duration::from_millis(15);

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [seconds]", args[0]);
        eprintln!();
        eprintln!("Run the automaton engine headless from a JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to engine configuration file");
        eprintln!("  seconds      Run duration (default: 5)");
        eprintln!();
        eprintln!("Use --example to print a default configuration.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let seconds: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });
    let config: EngineConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let grid = ToroidalGrid::new(&config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    println!("cellring");
    println!("========");
    println!(
        "Grid: {}x{} (edge {}, ring depth {})",
        config.height, config.width, config.edge, config.frames_per_cycle
    );
    println!("Rule: {:?}", config.rule);
    println!("Duration: {}s", seconds);
    println!();

    let mut scheduler = SimulationScheduler::new(&config.workers);
    scheduler.set_model(grid);
    let scheduler = Arc::new(scheduler);

    // Consumer actor: snapshot the baseline generation at render cadence.
    let reader = Arc::clone(&scheduler);
    let latest = Arc::new(Mutex::new(GridStats::from_cells(&[])));
    let stats_slot = Arc::clone(&latest);
    let painter = ThreadExecutor::new(
        move || {
            thread::sleep(FRAME_INTERVAL);
            let mut frame = Vec::new();
            reader.snapshot_into(&mut frame);
            if let Ok(mut slot) = stats_slot.lock() {
                *slot = GridStats::from_cells(&frame);
            }
        },
        1,
    );

    scheduler.start();
    painter.start();

    let started = Instant::now();
    let budget = Duration::from_secs(seconds);
    let mut erased = false;

    while started.elapsed() < budget {
        thread::sleep(Duration::from_secs(1).min(budget));

        // One scripted drag through the center, halfway through the run.
        if !erased && started.elapsed() * 2 >= budget {
            if let Some(grid) = scheduler.model() {
                let cy = (grid.height / 2) as i32;
                let cx = (grid.width / 2) as i32;
                grid.erase(cy - 8, cx - 8, cy + 8, cx + 8, 4);
                println!("[{:>4.1}s] erase gesture injected", started.elapsed().as_secs_f32());
            }
            erased = true;
        }

        let stats = latest.lock().map(|s| s.clone()).unwrap_or_else(|e| e.into_inner().clone());
        println!(
            "[{:>4.1}s] claims: {:>10}  active: {:>7}  states: [{}, {}]",
            started.elapsed().as_secs_f32(),
            scheduler.claims(),
            stats.active_cells,
            stats.min_state,
            stats.max_state,
        );
    }

    painter.terminate();
    scheduler.terminate();

    let generations = scheduler.claims() / scheduler.model().map_or(1, |g| g.height);
    println!();
    println!("Done: {} rows claimed (~{} generations)", scheduler.claims(), generations);
}

fn print_example_config() {
    let config = EngineConfig::default();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example config: {}", e),
    }
}
