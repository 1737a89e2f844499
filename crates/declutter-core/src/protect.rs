use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// Extensions that mark a file as a live data store. Deleting one copy of a
/// database file can corrupt an application even when a byte-identical copy
/// exists elsewhere.
const PROTECTED_EXTENSIONS: &[&str] = &[
    "db",
    "sqlite",
    "sqlite3",
    "sqlite-wal",
    "sqlite-shm",
    "pickle",
    "pkl",
    "mdb",
    "accdb",
];

/// Sensitive directory-name fragments, matched case-insensitively against
/// the whole path.
const PROTECTED_FRAGMENTS: &[&str] = &[
    "chroma",
    "faiss",
    "qdrant",
    "site-packages",
    "node_modules",
    "__pycache__",
    "/.git/",
    "/models/",
    "/checkpoints/",
    "/logs/",
];

/// Fallback patterns not expressible as a plain substring.
const PROTECTED_PATTERNS: &[&str] = &[
    r"(?i)\.git/(objects|refs|hooks)/",
    r"(?i)\.(npz|safetensors|ckpt|pt|pth|onnx)$",
    r"(?i)/venv[^/]*/",
];

/// Classifies paths that must never be deletion candidates, whatever their
/// duplication status. Over-protecting an ordinary file is acceptable; a
/// protected file slipping through is not.
pub struct ProtectionGate {
    extensions: HashSet<&'static str>,
    fragments: Vec<String>,
    patterns: Vec<Regex>,
}

impl ProtectionGate {
    pub fn new() -> Self {
        ProtectionGate {
            extensions: PROTECTED_EXTENSIONS.iter().copied().collect(),
            fragments: PROTECTED_FRAGMENTS
                .iter()
                .map(|f| f.to_lowercase())
                .collect(),
            // The pattern list is fixed at compile time, so compilation
            // cannot fail at runtime.
            patterns: PROTECTED_PATTERNS
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
        }
    }

    /// Three ordered checks, cheapest first, each short-circuiting on a hit.
    pub fn is_protected(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if self.extensions.contains(ext.to_lowercase().as_str()) {
                return true;
            }
        }

        let lossy = path.to_string_lossy().to_lowercase();
        if self.fragments.iter().any(|f| lossy.contains(f)) {
            return true;
        }

        let raw = path.to_string_lossy();
        self.patterns.iter().any(|p| p.is_match(&raw))
    }
}

impl Default for ProtectionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_extension() {
        let gate = ProtectionGate::new();
        assert!(gate.is_protected(Path::new("/home/u/app/data.sqlite3")));
        assert!(gate.is_protected(Path::new("/home/u/legacy/Model.PKL")));
        assert!(!gate.is_protected(Path::new("/home/u/docs/report.pdf")));
    }

    #[test]
    fn test_protected_fragments_case_insensitive() {
        let gate = ProtectionGate::new();
        assert!(gate.is_protected(Path::new("/srv/app/Node_Modules/left-pad/index.js")));
        assert!(gate.is_protected(Path::new("/data/ChromaDB/chroma/index.bin")));
        assert!(gate.is_protected(Path::new("/work/proj/.git/config")));
    }

    #[test]
    fn test_protected_regex_fallback() {
        let gate = ProtectionGate::new();
        assert!(gate.is_protected(Path::new("/ml/weights/best.safetensors")));
        assert!(gate.is_protected(Path::new("/proj/venv311/lib/python/x.py")));
        assert!(!gate.is_protected(Path::new("/home/u/Downloads/photo.jpg")));
    }
}
