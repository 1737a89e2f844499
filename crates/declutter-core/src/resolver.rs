use std::fs;
use tracing::{debug, warn};

use crate::engine::{DuplicateGroup, FileOutcome, FileRecord};
use crate::protect::ProtectionGate;

/// Per-group accounting produced by resolution.
pub struct GroupOutcome {
    pub group: DuplicateGroup,
    pub safe_to_delete: usize,
    pub space_recoverable: u64,
    pub deleted: usize,
}

/// Turn one confirmed duplicate group into a keep/delete decision.
///
/// Members arrive with their safety scores computed. They are sorted by
/// score descending and the member at index 0 is retained; every other
/// member is deletion-eligible only when its own score strictly exceeds
/// `threshold`.
///
/// Retention deliberately keeps the HIGHEST-scoring member. In practice
/// this preserves the most disposable-looking file and leaves the original
/// undeleted whenever the original's own score sits below the threshold.
/// That outcome is the shipped behavior of the risk policy; changing the
/// retention choice needs a product decision, not a code fix.
pub fn resolve_group(
    secure_hash: String,
    mut members: Vec<FileRecord>,
    threshold: f64,
    execute: bool,
    gate: &ProtectionGate,
    errors: &mut Vec<String>,
) -> GroupOutcome {
    members.sort_by(|a, b| {
        b.safety_score
            .partial_cmp(&a.safety_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_size: u64 = members.iter().map(|m| m.size).sum();

    let mut safe_to_delete = 0;
    let mut space_recoverable = 0u64;
    let mut deleted = 0;

    for (index, member) in members.iter_mut().enumerate() {
        if index == 0 {
            member.outcome = FileOutcome::Retained;
            continue;
        }

        // The gate is re-checked here so the no-delete guarantee does not
        // depend on the scorer having zeroed the score.
        if gate.is_protected(&member.path) {
            member.outcome = FileOutcome::Protected;
            continue;
        }

        if member.safety_score <= threshold {
            member.outcome = FileOutcome::BelowThreshold;
            continue;
        }

        safe_to_delete += 1;
        space_recoverable += member.size;

        if !execute {
            member.outcome = FileOutcome::Reported;
            continue;
        }

        match fs::remove_file(&member.path) {
            Ok(()) => {
                debug!("Deleted duplicate {}", member.path.display());
                member.outcome = FileOutcome::Deleted;
                deleted += 1;
            }
            Err(e) => {
                warn!("Failed to delete {}: {}", member.path.display(), e);
                errors.push(format!("delete {}: {}", member.path.display(), e));
                member.outcome = FileOutcome::DeleteFailed(e.to_string());
            }
        }
    }

    GroupOutcome {
        group: DuplicateGroup {
            secure_hash,
            total_size,
            members,
        },
        safe_to_delete,
        space_recoverable,
        deleted,
    }
}
