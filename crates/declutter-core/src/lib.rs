pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod progress;
pub mod protect;
pub mod reconcile;
pub mod resolver;
pub mod scanner;
pub mod score;
pub mod storage;

pub use config::EngineConfig;
pub use engine::{DuplicateGroup, FileOutcome, FileRecord, ScanEngine, ScanResult};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use reconcile::{ReconcileResult, RedundantFile};
pub use storage::HashStore;

/// Default safety threshold: a duplicate is deletion-eligible only when its
/// own safety score strictly exceeds this value.
pub const DEFAULT_SAFETY_THRESHOLD: f64 = 0.7;
