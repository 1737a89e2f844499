use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "declutter")]
#[command(about = "Duplicate detection with safety-scored deletion", long_about = None)]
pub struct Cli {
    /// Path of the hash store database.
    #[arg(long, global = true, default_value = "declutter.db")]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicates under a root and report (or delete) redundant copies
    Scan {
        /// Directory to scan
        root: PathBuf,
        /// Actually delete eligible files instead of only reporting them
        #[arg(long)]
        execute: bool,
        /// A duplicate is deletable only when its safety score exceeds this
        #[arg(long, default_value_t = declutter_core::DEFAULT_SAFETY_THRESHOLD)]
        threshold: f64,
    },
    /// Remove local copies of files already present in a trusted reference tree
    Reconcile {
        /// Trusted reference root(s); never mutated
        #[arg(long = "reference", required = true)]
        reference_roots: Vec<PathBuf>,
        /// Local root(s) to clean
        #[arg(long = "local", required = true)]
        local_roots: Vec<PathBuf>,
        /// Actually delete redundant local copies
        #[arg(long)]
        execute: bool,
    },
    /// Print the effective configuration
    PrintConfig,
    /// Display hash store statistics
    StoreStats,
}
