use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Bandit algorithm selection for `nanoindex-agent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentAlgorithm {
    EpsilonGreedy,
    Ucb1,
}

impl Default for AgentAlgorithm {
    fn default() -> Self {
        Self::EpsilonGreedy
    }
}

/// Static configuration enumerated in spec.md §6. Most fields are fixed at
/// construction; `default_nprobe`/`default_max_codes` are retunable at
/// runtime without a restart, the same way the teacher workspace exposes
/// `ef_search`/`ef_construction` as atomics on `GlobalConfig`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NanoIndexConfig {
    pub data_dir: String,
    pub dim: usize,
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
    #[serde(default = "default_nprobe", skip_serializing)]
    default_nprobe: usize,
    #[serde(default = "default_max_codes", skip_serializing)]
    default_max_codes: usize,
    #[serde(default)]
    pub agent_algorithm: AgentAlgorithm,
    #[serde(default = "default_epsilon")]
    pub agent_epsilon: f64,
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: u64,

    #[serde(skip, default = "default_nprobe_atomic")]
    live_default_nprobe: AtomicUsize,
    #[serde(skip, default = "default_max_codes_atomic")]
    live_default_max_codes: AtomicUsize,
}

fn default_initial_capacity() -> usize {
    1024
}
fn default_nprobe() -> usize {
    10
}
fn default_max_codes() -> usize {
    50_000
}
fn default_epsilon() -> f64 {
    0.1
}
fn default_checkpoint_every() -> u64 {
    10
}
fn default_nprobe_atomic() -> AtomicUsize {
    AtomicUsize::new(default_nprobe())
}
fn default_max_codes_atomic() -> AtomicUsize {
    AtomicUsize::new(default_max_codes())
}

impl NanoIndexConfig {
    pub fn new(data_dir: impl Into<String>, dim: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            dim,
            initial_capacity: default_initial_capacity(),
            default_nprobe: default_nprobe(),
            default_max_codes: default_max_codes(),
            agent_algorithm: AgentAlgorithm::default(),
            agent_epsilon: default_epsilon(),
            checkpoint_every: default_checkpoint_every(),
            live_default_nprobe: default_nprobe_atomic(),
            live_default_max_codes: default_max_codes_atomic(),
        }
    }

    pub fn default_nprobe(&self) -> usize {
        self.live_default_nprobe.load(Ordering::Relaxed)
    }

    pub fn set_default_nprobe(&self, val: usize) {
        self.live_default_nprobe.store(val, Ordering::Relaxed);
    }

    pub fn default_max_codes(&self) -> usize {
        self.live_default_max_codes.load(Ordering::Relaxed)
    }

    pub fn set_default_max_codes(&self, val: usize) {
        self.live_default_max_codes.store(val, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = NanoIndexConfig::new("./data", 128);
        assert_eq!(cfg.initial_capacity, 1024);
        assert_eq!(cfg.default_nprobe(), 10);
        assert_eq!(cfg.default_max_codes(), 50_000);
        assert_eq!(cfg.agent_epsilon, 0.1);
        assert_eq!(cfg.checkpoint_every, 10);
    }

    #[test]
    fn live_params_are_retunable() {
        let cfg = NanoIndexConfig::new("./data", 8);
        cfg.set_default_nprobe(20);
        assert_eq!(cfg.default_nprobe(), 20);
    }
}
