use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::Error;
use crate::hasher;
use crate::progress::ProgressReporter;
use crate::protect::ProtectionGate;
use crate::resolver;
use crate::scanner::{self, ScannedEntry};
use crate::score::SafetyScorer;
use crate::storage::{HashEntry, HashStore};

/// What happened to one file during resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Highest-scoring member of its group; kept.
    Retained,
    /// Eligible for deletion; dry-run only reported it.
    Reported,
    /// Unlinked in execute mode.
    Deleted,
    /// Protection rule hit; never deletable.
    Protected,
    /// Own score did not clear the caller's threshold.
    BelowThreshold,
    /// Unlink attempted and failed; the batch continued.
    DeleteFailed(String),
}

/// One file's journey through the pipeline.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    pub quick_hash: Option<String>,
    pub secure_hash: Option<String>,
    pub safety_score: f64,
    pub outcome: FileOutcome,
}

/// Files sharing one full-content SHA-256 digest. Transient: groups are
/// never persisted, only their member hashes are.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub secure_hash: String,
    pub total_size: u64,
    pub members: Vec<FileRecord>,
}

/// Aggregate result of one scan invocation. Immutable after return.
#[derive(Debug)]
pub struct ScanResult {
    pub scanned: usize,
    pub duplicate_groups: usize,
    /// Redundant copies: group members beyond the one retained per group.
    pub duplicates_found: usize,
    /// Members whose own score cleared the threshold, counted pre-execution.
    pub safe_to_delete: usize,
    pub space_recoverable: u64,
    pub deleted_files: usize,
    pub groups: Vec<DuplicateGroup>,
    pub errors: Vec<String>,
    pub scan_duration: Duration,
    pub hash_duration: Duration,
}

/// Public entry point composing scanner, tiered hashing, scoring and
/// resolution into one synchronous pass. Holds no process-wide state: the
/// hash store is injected at construction.
pub struct ScanEngine {
    config: EngineConfig,
    gate: ProtectionGate,
    store: HashStore,
}

impl ScanEngine {
    pub fn new(config: EngineConfig, store: HashStore) -> Self {
        ScanEngine {
            config,
            gate: ProtectionGate::new(),
            store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &HashStore {
        &self.store
    }

    pub(crate) fn gate(&self) -> &ProtectionGate {
        &self.gate
    }

    /// Run the full duplicate detection pipeline over one root:
    /// 1. Recursive scan (cached stat data, size index, singletons dropped)
    /// 2. Tier-1 partial MD5 screen, tier-2 full SHA-256 confirmation
    /// 3. Safety scoring and per-group keep/delete resolution
    /// 4. Execute mode only: unlink eligible files, upsert hash entries
    ///
    /// Dry-run and execute compute identical groups, scores and candidate
    /// lists; only execute mutates the filesystem or the store.
    pub fn scan_directory(
        &self,
        root: &Path,
        execute: bool,
        safety_threshold: f64,
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanResult, Error> {
        if !(0.0..=1.0).contains(&safety_threshold) {
            return Err(Error::Config(format!(
                "safety threshold must be in [0,1], got {}",
                safety_threshold
            )));
        }

        let ignore = scanner::compile_ignore_patterns(&self.config.ignore_patterns);

        // Phase 1: scan.
        info!("Scanning {}...", root.display());
        reporter.on_scan_start();
        let scan_start = Instant::now();
        let entries = scanner::walk_root(root, &ignore, reporter)?;
        let scan_duration = scan_start.elapsed();
        let scanned = entries.len();
        reporter.on_scan_complete(scanned, scan_duration.as_secs_f64());
        debug!(
            "Scan completed in {:.2}s — {} files",
            scan_duration.as_secs_f64(),
            scanned
        );

        // Phase 2: tiered hashing.
        let size_index = scanner::index_by_size(entries);
        let candidates: usize = size_index.values().map(|v| v.len()).sum();
        info!("Hashing {} size-matched candidates...", candidates);
        reporter.on_hash_start(candidates);
        let hash_start = Instant::now();
        let (confirmed, hashed_records) = self.confirm_groups(size_index, reporter);
        let hash_duration = hash_start.elapsed();
        reporter.on_hash_complete(confirmed.len(), hash_duration.as_secs_f64());
        debug!(
            "Hash completed in {:.2}s — {} confirmed groups",
            hash_duration.as_secs_f64(),
            confirmed.len()
        );

        // Phase 3: score and resolve.
        let scorer = SafetyScorer::new(&self.config, &self.gate);
        let mut groups = Vec::with_capacity(confirmed.len());
        let mut errors = Vec::new();
        let mut duplicates_found = 0;
        let mut safe_to_delete = 0;
        let mut space_recoverable = 0u64;
        let mut deleted_files = 0;

        for (secure_hash, mut members) in confirmed {
            duplicates_found += members.len() - 1;
            let group_len = members.len();
            for member in &mut members {
                member.safety_score =
                    scorer.score(&member.path, member.modified, group_len);
            }
            let outcome = resolver::resolve_group(
                secure_hash,
                members,
                safety_threshold,
                execute,
                &self.gate,
                &mut errors,
            );
            safe_to_delete += outcome.safe_to_delete;
            space_recoverable += outcome.space_recoverable;
            deleted_files += outcome.deleted;
            groups.push(outcome.group);
        }
        reporter.on_resolve_complete(safe_to_delete, deleted_files);

        // Phase 4 (execute only): persist every successfully hashed file.
        if execute {
            self.persist_hashes(&hashed_records, &groups, &mut errors);
        }

        info!(
            "{} groups, {} duplicates, {} safe to delete, {} deleted",
            groups.len(),
            duplicates_found,
            safe_to_delete,
            deleted_files
        );

        Ok(ScanResult {
            scanned,
            duplicate_groups: groups.len(),
            duplicates_found,
            safe_to_delete,
            space_recoverable,
            deleted_files,
            groups,
            errors,
            scan_duration,
            hash_duration,
        })
    }

    /// Tier 1 then tier 2. Returns the confirmed groups (secure hash →
    /// members, each group > 1 member) plus every record that earned a
    /// secure hash, for persistence.
    fn confirm_groups(
        &self,
        size_index: std::collections::BTreeMap<u64, Vec<ScannedEntry>>,
        reporter: &dyn ProgressReporter,
    ) -> (Vec<(String, Vec<FileRecord>)>, Vec<FileRecord>) {
        let total: usize = size_index.values().map(|v| v.len()).sum();
        let mut processed = 0;

        let mut confirmed: Vec<(String, Vec<FileRecord>)> = Vec::new();
        let mut hashed_records: Vec<FileRecord> = Vec::new();

        for (_size, entries) in size_index {
            // Tier 1: cheap prefix screen within one size bucket.
            let mut by_quick: HashMap<String, Vec<(ScannedEntry, String)>> = HashMap::new();
            for entry in entries {
                processed += 1;
                if processed % 64 == 0 {
                    reporter.on_hash_progress(processed, total);
                }
                match hasher::quick_hash(&entry.path) {
                    Ok(digest) => {
                        by_quick.entry(digest.clone()).or_default().push((entry, digest));
                    }
                    Err(e) => {
                        // Skipped, not an error: the file simply leaves
                        // candidacy for this scan.
                        warn!("Skipping unreadable file {}: {}", entry.path.display(), e);
                    }
                }
            }

            // Tier 2: cryptographic confirmation on surviving buckets.
            let mut by_secure: HashMap<String, Vec<FileRecord>> = HashMap::new();
            for (_quick, bucket) in by_quick {
                if bucket.len() < 2 {
                    continue;
                }
                for (entry, quick) in bucket {
                    match hasher::secure_hash(&entry.path) {
                        Ok(digest) => {
                            let record = FileRecord {
                                path: entry.path,
                                size: entry.size,
                                modified: entry.modified,
                                quick_hash: Some(quick),
                                secure_hash: Some(digest.clone()),
                                safety_score: 0.0,
                                outcome: FileOutcome::BelowThreshold,
                            };
                            hashed_records.push(record.clone());
                            by_secure.entry(digest).or_default().push(record);
                        }
                        Err(e) => {
                            warn!(
                                "Skipping unreadable file {}: {}",
                                entry.path.display(),
                                e
                            );
                        }
                    }
                }
            }

            for (digest, members) in by_secure {
                if members.len() > 1 {
                    confirmed.push((digest, members));
                }
            }
        }

        (confirmed, hashed_records)
    }

    /// Upsert one store row per hashed file. Store failure costs only the
    /// persistence: the in-memory result keeps the computed hashes.
    fn persist_hashes(
        &self,
        hashed: &[FileRecord],
        groups: &[DuplicateGroup],
        errors: &mut Vec<String>,
    ) {
        let mut resolved: HashMap<&Path, &FileRecord> = HashMap::new();
        for group in groups {
            for member in &group.members {
                resolved.insert(member.path.as_path(), member);
            }
        }

        let entries: Vec<HashEntry> = hashed
            .iter()
            .filter(|record| !matches!(
                resolved
                    .get(record.path.as_path())
                    .map(|r| &r.outcome),
                Some(FileOutcome::Deleted)
            ))
            .map(|record| {
                let final_state = resolved.get(record.path.as_path()).copied();
                HashEntry {
                    file_path: record.path.to_string_lossy().into_owned(),
                    quick_hash: record.quick_hash.clone(),
                    secure_hash: record.secure_hash.clone(),
                    file_size: record.size as i64,
                    last_modified: record
                        .modified
                        .duration_since(UNIX_EPOCH)
                        .map(|d| d.as_secs() as i64)
                        .unwrap_or(0),
                    duplicate_group_id: final_state
                        .and_then(|r| r.secure_hash.clone()),
                    safety_score: final_state.map(|r| r.safety_score),
                    can_delete: matches!(
                        final_state.map(|r| &r.outcome),
                        Some(FileOutcome::Reported) | Some(FileOutcome::DeleteFailed(_))
                    ),
                }
            })
            .collect();

        if let Err(e) = self.store.upsert_entries(&entries) {
            warn!("Hash store write failed: {}", e);
            errors.push(format!("hash store write: {}", e));
        }
    }
}
