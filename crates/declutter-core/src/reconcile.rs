use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};

use crate::config;
use crate::engine::ScanEngine;
use crate::error::Error;
use crate::hasher;
use crate::progress::ProgressReporter;
use crate::scanner;
use crate::storage::HashEntry;

/// A local file whose content already exists in a reference root.
#[derive(Debug, Clone)]
pub struct RedundantFile {
    pub local_path: PathBuf,
    pub reference_path: PathBuf,
    pub size: u64,
    pub deleted: bool,
}

#[derive(Debug)]
pub struct ReconcileResult {
    pub reference_files_indexed: usize,
    pub local_files_scanned: usize,
    pub redundant: Vec<RedundantFile>,
    pub deleted_files: usize,
    pub space_recoverable: u64,
    pub errors: Vec<String>,
}

impl ScanEngine {
    /// Reconcile local roots against trusted reference roots.
    ///
    /// Every non-protected reference file is hashed into a secure-hash index
    /// (first occurrence wins); any non-protected local file whose hash
    /// appears in the index is a redundant copy. Existence in the reference
    /// is sufficient justification, so the safety scorer is bypassed. The
    /// reference trees are never mutated.
    pub fn reconcile(
        &self,
        reference_roots: &[PathBuf],
        local_roots: &[PathBuf],
        execute: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<ReconcileResult, Error> {
        let reference_roots = config::non_overlapping_roots(reference_roots.to_vec());

        for root in reference_roots.iter().chain(local_roots.iter()) {
            if !root.is_dir() {
                return Err(Error::Config(format!(
                    "root does not exist or is not a directory: {}",
                    root.display()
                )));
            }
        }
        for local in local_roots {
            if config::under_any_root(local, &reference_roots) {
                return Err(Error::Config(format!(
                    "local root {} lies inside a reference root",
                    local.display()
                )));
            }
        }
        for reference in &reference_roots {
            if config::under_any_root(reference, local_roots) {
                return Err(Error::Config(format!(
                    "reference root {} lies inside a local root",
                    reference.display()
                )));
            }
        }

        let ignore = scanner::compile_ignore_patterns(&self.config().ignore_patterns);
        let mut errors = Vec::new();

        // Index the trusted side once.
        info!("Indexing {} reference root(s)...", reference_roots.len());
        reporter.on_scan_start();
        let mut reference_index: HashMap<String, PathBuf> = HashMap::new();
        let mut reference_files_indexed = 0;
        for root in &reference_roots {
            for entry in scanner::walk_root(root, &ignore, reporter)? {
                if self.gate().is_protected(&entry.path) {
                    continue;
                }
                match hasher::secure_hash(&entry.path) {
                    Ok(digest) => {
                        reference_files_indexed += 1;
                        reference_index.entry(digest).or_insert(entry.path);
                    }
                    Err(e) => {
                        warn!(
                            "Skipping unreadable reference file {}: {}",
                            entry.path.display(),
                            e
                        );
                    }
                }
            }
        }
        debug!(
            "Reference index built: {} files, {} distinct hashes",
            reference_files_indexed,
            reference_index.len()
        );

        // Walk the local side against the index.
        let mut redundant = Vec::new();
        let mut store_entries = Vec::new();
        let mut local_files_scanned = 0;
        let mut deleted_files = 0;
        let mut space_recoverable = 0u64;

        for root in local_roots {
            for entry in scanner::walk_root(root, &ignore, reporter)? {
                local_files_scanned += 1;
                if self.gate().is_protected(&entry.path) {
                    continue;
                }
                // A file physically inside a reference tree is the trusted
                // copy, never a redundant one.
                if config::under_any_root(&entry.path, &reference_roots) {
                    continue;
                }
                let digest = match hasher::secure_hash(&entry.path) {
                    Ok(d) => d,
                    Err(e) => {
                        warn!(
                            "Skipping unreadable local file {}: {}",
                            entry.path.display(),
                            e
                        );
                        continue;
                    }
                };

                let reference_path = match reference_index.get(&digest) {
                    Some(p) => p.clone(),
                    None => {
                        if execute {
                            store_entries.push(hash_entry(&entry, &digest, None));
                        }
                        continue;
                    }
                };

                space_recoverable += entry.size;
                let mut deleted = false;
                if execute {
                    match fs::remove_file(&entry.path) {
                        Ok(()) => {
                            debug!(
                                "Deleted {} (reference copy at {})",
                                entry.path.display(),
                                reference_path.display()
                            );
                            deleted = true;
                            deleted_files += 1;
                        }
                        Err(e) => {
                            warn!("Failed to delete {}: {}", entry.path.display(), e);
                            errors.push(format!(
                                "delete {}: {}",
                                entry.path.display(),
                                e
                            ));
                        }
                    }
                    if !deleted {
                        store_entries.push(hash_entry(&entry, &digest, Some(&digest)));
                    }
                }
                redundant.push(RedundantFile {
                    local_path: entry.path,
                    reference_path,
                    size: entry.size,
                    deleted,
                });
            }
        }

        if execute && !store_entries.is_empty() {
            if let Err(e) = self.store().upsert_entries(&store_entries) {
                warn!("Hash store write failed: {}", e);
                errors.push(format!("hash store write: {}", e));
            }
        }

        info!(
            "{} redundant local copies found, {} deleted",
            redundant.len(),
            deleted_files
        );

        Ok(ReconcileResult {
            reference_files_indexed,
            local_files_scanned,
            redundant,
            deleted_files,
            space_recoverable,
            errors,
        })
    }
}

fn hash_entry(
    entry: &scanner::ScannedEntry,
    digest: &str,
    group_id: Option<&str>,
) -> HashEntry {
    HashEntry {
        file_path: entry.path.to_string_lossy().into_owned(),
        quick_hash: None,
        secure_hash: Some(digest.to_string()),
        file_size: entry.size as i64,
        last_modified: entry
            .modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0),
        duplicate_group_id: group_id.map(|g| g.to_string()),
        safety_score: None,
        can_delete: group_id.is_some(),
    }
}
