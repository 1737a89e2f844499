/// Trait for reporting scan progress.
///
/// The CLI implements this with indicatif bars; embedders can bridge it to
/// whatever event stream they use. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _files_found: usize, _current_path: &str) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_hash_start(&self, _candidates: usize) {}
    fn on_hash_progress(&self, _files_hashed: usize, _total_files: usize) {}
    fn on_hash_complete(&self, _duplicate_groups: usize, _duration_secs: f64) {}
    fn on_resolve_complete(&self, _safe_to_delete: usize, _deleted: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
