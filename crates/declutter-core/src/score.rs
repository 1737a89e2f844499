use regex::Regex;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::config::{self, EngineConfig};
use crate::protect::ProtectionGate;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Filename shapes that almost always mean "this is the copy, not the
/// original". First match wins.
const DUPLICATE_NAME_PATTERNS: &[&str] = &[
    r"^.+ \(\d+\)\.[^.]+$",          // report (1).pdf
    r"(?i)^.+ copy( \d+)?\.[^.]+$",  // report copy.pdf, report copy 2.pdf
    r"(?i)^copy of .+$",             // Copy of report.pdf
    r"(?i)^screen ?shot .*\d{4}-\d{2}-\d{2}.*$", // Screenshot 2024-01-02 at ...
    r".+_\d{8}_\d{6}\.[^.]+$",       // IMG_20240102_123456.jpg
];

/// Computes a deletion-risk score per file: a pure function of the path, the
/// file's mtime and its group size. Higher means more acceptable to delete.
pub struct SafetyScorer<'a> {
    config: &'a EngineConfig,
    gate: &'a ProtectionGate,
    name_patterns: Vec<Regex>,
}

impl<'a> SafetyScorer<'a> {
    pub fn new(config: &'a EngineConfig, gate: &'a ProtectionGate) -> Self {
        SafetyScorer {
            config,
            gate,
            // Fixed pattern list, compilation cannot fail at runtime.
            name_patterns: DUPLICATE_NAME_PATTERNS
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
        }
    }

    pub fn score(&self, path: &Path, modified: SystemTime, group_len: usize) -> f64 {
        self.score_at(path, modified, group_len, SystemTime::now())
    }

    /// Scoring against an explicit clock, so the result is reproducible.
    pub fn score_at(
        &self,
        path: &Path,
        modified: SystemTime,
        group_len: usize,
        now: SystemTime,
    ) -> f64 {
        // Absolute overrides come first; nothing can raise a protected file
        // above zero.
        if self.gate.is_protected(path) {
            return 0.0;
        }
        if config::under_any_root(path, &self.config.protected_roots)
            && !self.is_cloud_sync_mirror(path)
        {
            return 0.0;
        }

        let mut score: f64 = 0.0;

        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > 30 * DAY {
            score += 0.3;
        } else if age > 7 * DAY {
            score += 0.2;
        } else if age > DAY {
            score += 0.1;
        }

        if self.is_transient_location(path) {
            score += 0.3;
        }

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if self.name_patterns.iter().any(|p| p.is_match(name)) {
                score += 0.4;
            }
        }

        if group_len > 3 {
            score += 0.2;
        } else if group_len > 1 {
            score += 0.1;
        }

        score.clamp(0.0, 1.0)
    }

    fn is_transient_location(&self, path: &Path) -> bool {
        if config::under_any_root(path, &self.config.transient_roots) {
            return true;
        }
        path.components().any(|c| {
            c.as_os_str()
                .to_str()
                .map(|name| {
                    self.config
                        .transient_dir_names
                        .iter()
                        .any(|t| t.eq_ignore_ascii_case(name))
                })
                .unwrap_or(false)
        })
    }

    fn is_cloud_sync_mirror(&self, path: &Path) -> bool {
        let lossy = path.to_string_lossy().to_lowercase();
        self.config
            .cloud_sync_allowlist
            .iter()
            .any(|fragment| lossy.contains(&fragment.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scorer_fixture() -> (EngineConfig, ProtectionGate) {
        (EngineConfig::default(), ProtectionGate::new())
    }

    fn days_ago(now: SystemTime, days: u32) -> SystemTime {
        now - days * DAY
    }

    #[test]
    fn test_fresh_copy_outscores_plain_original() {
        let (config, gate) = scorer_fixture();
        let scorer = SafetyScorer::new(&config, &gate);
        let now = SystemTime::now();

        // a.txt: 10 days old, transient location, plain name, group of 2.
        // age 0.2 + location 0.3 + group 0.1 = 0.6, below the 0.7 default
        // threshold.
        let old = scorer.score_at(
            Path::new("/home/u/Downloads/a.txt"),
            days_ago(now, 10),
            2,
            now,
        );
        // a (1).txt: 1 hour old, transient, duplicate-shaped name.
        let fresh = scorer.score_at(
            Path::new("/home/u/Downloads/a (1).txt"),
            now - Duration::from_secs(3600),
            2,
            now,
        );

        assert!(fresh > old);
        assert!((fresh - 0.8).abs() < 1e-9);
        assert!(old < 0.7);
    }

    #[test]
    fn test_age_tiers() {
        let (config, gate) = scorer_fixture();
        let scorer = SafetyScorer::new(&config, &gate);
        let now = SystemTime::now();
        let p = Path::new("/data/work/file.txt");

        assert_eq!(scorer.score_at(p, now, 1, now), 0.0);
        assert!((scorer.score_at(p, days_ago(now, 2), 1, now) - 0.1).abs() < 1e-9);
        assert!((scorer.score_at(p, days_ago(now, 8), 1, now) - 0.2).abs() < 1e-9);
        assert!((scorer.score_at(p, days_ago(now, 31), 1, now) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_protected_path_scores_zero() {
        let (config, gate) = scorer_fixture();
        let scorer = SafetyScorer::new(&config, &gate);
        let now = SystemTime::now();

        // Old, transient-looking, copy-named, big group: still zero.
        let score = scorer.score_at(
            Path::new("/home/u/Downloads/backup copy.sqlite3"),
            days_ago(now, 90),
            8,
            now,
        );
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_system_root_zero_with_cloud_carveout() {
        let (config, gate) = scorer_fixture();
        let scorer = SafetyScorer::new(&config, &gate);
        let now = SystemTime::now();

        let system = scorer.score_at(
            Path::new("/Library/Caches/blob.dat"),
            days_ago(now, 60),
            4,
            now,
        );
        assert_eq!(system, 0.0);

        let mirrored = scorer.score_at(
            Path::new("/Library/CloudStorage/GoogleDrive/notes copy.txt"),
            days_ago(now, 60),
            4,
            now,
        );
        assert!(mirrored > 0.0);
    }

    #[test]
    fn test_filename_patterns_first_match_only() {
        let config = EngineConfig::default();
        let gate = ProtectionGate::new();
        let scorer = SafetyScorer::new(&config, &gate);
        let now = SystemTime::now();

        // Matches both the "(N)" and "copy" shapes; the bonus applies once.
        let score = scorer.score_at(
            Path::new("/data/work/Copy of report (2).pdf"),
            now,
            1,
            now,
        );
        assert!((score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_configured_transient_root() {
        let mut config = EngineConfig::default();
        config.transient_roots = vec![PathBuf::from("/scratch/staging")];
        let gate = ProtectionGate::new();
        let scorer = SafetyScorer::new(&config, &gate);
        let now = SystemTime::now();

        let inside = scorer.score_at(Path::new("/scratch/staging/x.bin"), now, 1, now);
        let outside = scorer.score_at(Path::new("/scratch/other/x.bin"), now, 1, now);
        assert!((inside - 0.3).abs() < 1e-9);
        assert_eq!(outside, 0.0);
    }

    #[test]
    fn test_score_is_clamped() {
        let (config, gate) = scorer_fixture();
        let scorer = SafetyScorer::new(&config, &gate);
        let now = SystemTime::now();

        // 0.3 age + 0.3 transient + 0.4 name + 0.2 group = 1.2 before clamp.
        let score = scorer.score_at(
            Path::new("/home/u/Downloads/report (3).pdf"),
            days_ago(now, 45),
            5,
            now,
        );
        assert_eq!(score, 1.0);
    }
}
