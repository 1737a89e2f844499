use glob::Pattern;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{error, warn};

use crate::error::Error;
use crate::progress::ProgressReporter;

/// A file discovered during scanning, with its stat data cached so later
/// stages never re-stat.
#[derive(Debug, Clone)]
pub struct ScannedEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Directory-name extensions treated as opaque packages. Descending into a
/// photo library to dedup its internals corrupts it.
const BUNDLE_EXTENSIONS: &[&str] = &[
    "photoslibrary",
    "photolibrary",
    "imovielibrary",
    "fcpbundle",
    "tvlibrary",
    "musiclibrary",
    "app",
    "framework",
    "bundle",
];

fn is_bundle_dir(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| BUNDLE_EXTENSIONS.iter().any(|b| e.eq_ignore_ascii_case(b)))
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

pub fn compile_ignore_patterns(ignore_globs: &[String]) -> Vec<Pattern> {
    ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

/// Recursively walk `root`, collecting every regular file with its cached
/// metadata. Dot-prefixed entries, bundle packages, symlinks and zero-byte
/// files are skipped. Per-entry OS errors are logged and the walk continues;
/// only a failure to read `root` itself is fatal.
pub fn walk_root(
    root: &Path,
    ignore_patterns: &[Pattern],
    reporter: &dyn ProgressReporter,
) -> Result<Vec<ScannedEntry>, Error> {
    if !root.is_dir() {
        return Err(Error::Config(format!(
            "scan root does not exist or is not a directory: {}",
            root.display()
        )));
    }

    // Reading the root is the one enumeration failure that aborts the scan.
    let root_entries = fs::read_dir(root).map_err(|e| {
        Error::Config(format!("cannot read scan root {}: {}", root.display(), e))
    })?;

    let mut found = Vec::new();
    visit_entries(root, root_entries, ignore_patterns, reporter, &mut found);
    Ok(found)
}

fn visit_entries(
    dir: &Path,
    entries: fs::ReadDir,
    ignore_patterns: &[Pattern],
    reporter: &dyn ProgressReporter,
    found: &mut Vec<ScannedEntry>,
) {
    for entry_result in entries {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Error reading entry in {}: {}", dir.display(), err);
                continue;
            }
        };

        let path = entry.path();

        if is_hidden(&path) {
            continue;
        }
        if ignore_patterns.iter().any(|p| p.matches_path(&path)) {
            continue;
        }

        let metadata = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(err) => {
                warn!("Error getting metadata for {}: {}", path.display(), err);
                continue;
            }
        };

        if metadata.file_type().is_symlink() {
            continue;
        }

        if metadata.is_dir() {
            if is_bundle_dir(&path) {
                continue;
            }
            match fs::read_dir(&path) {
                Ok(sub) => visit_entries(&path, sub, ignore_patterns, reporter, found),
                Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                    warn!("Access denied reading directory {}: {}", path.display(), err);
                }
                Err(err) => {
                    warn!("Error reading directory {}: {}", path.display(), err);
                }
            }
        } else if metadata.is_file() && metadata.len() > 0 {
            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(err) => {
                    warn!("No mtime for {}: {}", path.display(), err);
                    continue;
                }
            };
            found.push(ScannedEntry {
                path,
                size: metadata.len(),
                modified,
            });
            if found.len() % 256 == 0 {
                reporter.on_scan_progress(found.len(), &dir.to_string_lossy());
            }
        }
    }
}

/// Tier-0 grouping: index entries by exact byte size and drop singleton
/// sizes. A file cannot be a duplicate of nothing.
pub fn index_by_size(entries: Vec<ScannedEntry>) -> BTreeMap<u64, Vec<ScannedEntry>> {
    let mut by_size: BTreeMap<u64, Vec<ScannedEntry>> = BTreeMap::new();
    for entry in entries {
        by_size.entry(entry.size).or_default().push(entry);
    }
    by_size.retain(|_, group| group.len() > 1);
    by_size
}
