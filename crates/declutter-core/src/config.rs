use config::{Config, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Engine configuration. Every field has a usable default so the engine can
/// run without a config file; a `Declutter.toml` in the working directory
/// overrides individual fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Absolute roots treated as transient locations (downloads, temp
    /// dumps). Files under these earn a safety bonus.
    pub transient_roots: Vec<PathBuf>,
    /// Directory names treated as transient wherever they appear as a path
    /// component, case-insensitive.
    pub transient_dir_names: Vec<String>,
    /// Absolute roots whose contents are never deletion candidates.
    pub protected_roots: Vec<PathBuf>,
    /// Path fragments that exempt a file from the protected-roots rule.
    /// Cloud-sync mirrors live under system-looking paths but hold ordinary
    /// user files.
    pub cloud_sync_allowlist: Vec<String>,
    /// Extra glob patterns excluded from scanning entirely.
    pub ignore_patterns: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            transient_roots: Vec::new(),
            transient_dir_names: vec![
                "downloads".to_string(),
                "download".to_string(),
                "tmp".to_string(),
                "temp".to_string(),
                ".cache".to_string(),
            ],
            protected_roots: vec![
                PathBuf::from("/System"),
                PathBuf::from("/Library"),
                PathBuf::from("/Applications"),
                PathBuf::from("/usr"),
                PathBuf::from("/bin"),
                PathBuf::from("/sbin"),
                PathBuf::from("/etc"),
                PathBuf::from("/private"),
            ],
            cloud_sync_allowlist: vec![
                "Library/CloudStorage".to_string(),
                "Dropbox".to_string(),
                "Google Drive".to_string(),
                "OneDrive".to_string(),
                "iCloud Drive".to_string(),
            ],
            ignore_patterns: Vec::new(),
        }
    }
}

pub fn load_configuration() -> Result<EngineConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Declutter").required(false))
        .build()?;
    Ok(builder.try_deserialize::<EngineConfig>()?)
}

/// Remove roots that are subdirectories of other roots in the list.
pub fn non_overlapping_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for root in roots {
        if result.iter().any(|kept| root.starts_with(kept)) {
            continue;
        }
        // A late-arriving parent displaces every child kept so far.
        result.retain(|kept| !kept.starts_with(&root));
        result.push(root);
    }

    result
}

/// True when `path` sits under any of the given roots.
pub fn under_any_root(path: &Path, roots: &[PathBuf]) -> bool {
    roots.iter().any(|root| path.starts_with(root))
}
