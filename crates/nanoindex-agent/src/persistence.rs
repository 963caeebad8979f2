use crate::arm::ARMS;
use crate::stats::ArmStats;
use nanoindex_core::AgentAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Bumped whenever the on-disk shape of `agent_state.json` changes
/// incompatibly. A mismatch is non-fatal (spec.md C5): the agent restarts
/// from zero-knowledge state rather than refusing to boot.
const SCHEMA_VERSION: u32 = 1;

/// Matches spec.md §6's `agent_state.json` shape, plus a `schema_version`
/// field used to detect incompatible future formats.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CheckpointFile {
    schema_version: u32,
    algorithm: AgentAlgorithm,
    epsilon: f64,
    total_pulls: u64,
    statistics: HashMap<String, ArmStats>,
}

pub(crate) fn save(
    path: &Path,
    algorithm: AgentAlgorithm,
    epsilon: f64,
    stats: &[ArmStats],
) -> Result<(), crate::error::AgentError> {
    let total_pulls = stats.iter().map(|s| s.pulls).sum();
    let statistics = ARMS
        .iter()
        .zip(stats.iter())
        .map(|(arm, s)| (arm.name.to_string(), *s))
        .collect();

    let checkpoint = CheckpointFile {
        schema_version: SCHEMA_VERSION,
        algorithm,
        epsilon,
        total_pulls,
        statistics,
    };
    let bytes = serde_json::to_vec_pretty(&checkpoint)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Loads a checkpoint, returning zero-state stats if the file is absent,
/// unparsable, or on a different schema version (spec.md: non-fatal).
pub(crate) fn load_or_default(path: &Path) -> Vec<ArmStats> {
    let default_stats = || vec![ArmStats::default(); ARMS.len()];

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return default_stats(),
        Err(e) => {
            warn!(error = %e, "failed to read agent checkpoint, starting from zero state");
            return default_stats();
        }
    };

    let checkpoint: CheckpointFile = match serde_json::from_slice(&bytes) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "failed to parse agent checkpoint, starting from zero state");
            return default_stats();
        }
    };

    if checkpoint.schema_version != SCHEMA_VERSION {
        warn!(
            found = checkpoint.schema_version,
            expected = SCHEMA_VERSION,
            "agent checkpoint schema mismatch, starting from zero state"
        );
        return default_stats();
    }

    let mut stats = default_stats();
    for (name, arm_stats) in checkpoint.statistics {
        if let Some(idx) = crate::arm::arm_index(&name) {
            stats[idx] = arm_stats;
        }
    }
    info!(path = %path.display(), "agent checkpoint loaded");
    stats
}
