mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::path::Path;
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use declutter_core::{HashStore, ScanEngine};
use tracing::error;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match declutter_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Scan {
            root,
            execute,
            threshold,
        }) => {
            if execute
                && !prompt_confirm(
                    "Execute mode will PERMANENTLY DELETE eligible duplicates. Continue?",
                    false,
                )?
            {
                process::exit(0);
            }
            let engine = open_engine(config, &args.store)?;
            if let Err(err) = run_scan(&engine, &root, execute, threshold) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::Reconcile {
            reference_roots,
            local_roots,
            execute,
        }) => {
            if execute
                && !prompt_confirm(
                    "Execute mode will PERMANENTLY DELETE redundant local copies. Continue?",
                    false,
                )?
            {
                process::exit(0);
            }
            let engine = open_engine(config, &args.store)?;
            if let Err(err) = run_reconcile(&engine, &reference_roots, &local_roots, execute) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        Some(Commands::StoreStats) => {
            let store = HashStore::open(&args.store)?;
            let count = store.count_entries()?;
            println!(
                "Hash store {}: {} entries",
                args.store.display(),
                format!("{}", count).cyan()
            );
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn open_engine(
    config: declutter_core::EngineConfig,
    store_path: &Path,
) -> Result<ScanEngine, Box<dyn std::error::Error>> {
    let store = HashStore::open(store_path)?;
    Ok(ScanEngine::new(config, store))
}

fn run_scan(
    engine: &ScanEngine,
    root: &Path,
    execute: bool,
    threshold: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let reporter = CliReporter::new();
    let result = engine.scan_directory(root, execute, threshold, &reporter)?;

    println!();
    println!(
        "Scanned {} files in {:.2}s, hashed in {:.2}s",
        format!("{}", result.scanned).green(),
        result.scan_duration.as_secs_f64(),
        result.hash_duration.as_secs_f64(),
    );
    println!(
        "{} duplicate groups, {} redundant copies, {} bytes recoverable",
        format!("{}", result.duplicate_groups).red(),
        format!("{}", result.duplicates_found).red(),
        format!("{}", result.space_recoverable).red(),
    );
    if execute {
        println!("{} files deleted", format!("{}", result.deleted_files).yellow());
    } else {
        println!(
            "{} files eligible for deletion (dry run, nothing removed)",
            format!("{}", result.safe_to_delete).yellow()
        );
    }
    for group in &result.groups {
        println!(
            "  group {} ({} files, {} bytes)",
            &group.secure_hash[..12],
            group.members.len(),
            group.total_size
        );
        for member in &group.members {
            println!(
                "    {:>5.2}  {:?}  {}",
                member.safety_score,
                member.outcome,
                member.path.display()
            );
        }
    }
    if !result.errors.is_empty() {
        println!("{}", "Errors:".red().bold());
        for err in &result.errors {
            println!("  {}", err);
        }
    }

    Ok(())
}

fn run_reconcile(
    engine: &ScanEngine,
    reference_roots: &[std::path::PathBuf],
    local_roots: &[std::path::PathBuf],
    execute: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let reporter = CliReporter::new();
    let result = engine.reconcile(reference_roots, local_roots, execute, &reporter)?;

    println!();
    println!(
        "Indexed {} reference files, scanned {} local files",
        format!("{}", result.reference_files_indexed).green(),
        format!("{}", result.local_files_scanned).green(),
    );
    println!(
        "{} redundant local copies, {} bytes recoverable, {} deleted",
        format!("{}", result.redundant.len()).red(),
        format!("{}", result.space_recoverable).red(),
        format!("{}", result.deleted_files).yellow(),
    );
    for file in &result.redundant {
        let marker = if file.deleted { "deleted" } else { "redundant" };
        println!(
            "  {}: {} (reference copy at {})",
            marker,
            file.local_path.display(),
            file.reference_path.display()
        );
    }
    if !result.errors.is_empty() {
        println!("{}", "Errors:".red().bold());
        for err in &result.errors {
            println!("  {}", err);
        }
    }

    Ok(())
}

/// Asks a yes/no question on stdin. An empty answer takes `default`;
/// anything unrecognized re-prompts.
fn prompt_confirm(prompt: &str, default: bool) -> io::Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let mut input = String::new();

    loop {
        input.clear();
        print!("{} {} ", prompt, hint);
        io::stdout().flush()?;
        io::stdin().read_line(&mut input)?;

        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            "" => return Ok(default),
            _ => continue,
        }
    }
}
