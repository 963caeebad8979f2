use serde::{Deserialize, Serialize};

/// Running statistics for one arm. `avg_reward`/`avg_latency_ms` are
/// maintained incrementally rather than recomputed from scratch on every
/// update.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ArmStats {
    pub pulls: u64,
    pub total_reward: f64,
    pub avg_reward: f64,
    pub total_latency_ms: f64,
    pub avg_latency_ms: f64,
}

impl ArmStats {
    /// Reward floor avoiding division by zero for near-instant queries.
    pub const EPSILON_FLOOR: f64 = 1e-6;

    pub fn reward_for(latency_ms: f64) -> f64 {
        1000.0 / latency_ms.max(Self::EPSILON_FLOOR)
    }

    pub fn record(&mut self, latency_ms: f64) {
        let reward = Self::reward_for(latency_ms);
        self.pulls += 1;
        self.total_reward += reward;
        self.total_latency_ms += latency_ms;
        let n = self.pulls as f64;
        self.avg_reward = self.total_reward / n;
        self.avg_latency_ms = self.total_latency_ms / n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_formula_matches_spec() {
        assert!((ArmStats::reward_for(10.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn reward_floor_prevents_division_by_zero() {
        let r = ArmStats::reward_for(0.0);
        assert!(r.is_finite());
        assert!(r > 0.0);
    }

    #[test]
    fn running_average_matches_manual_computation() {
        let mut s = ArmStats::default();
        s.record(10.0);
        s.record(20.0);
        let expected_avg_latency = (10.0 + 20.0) / 2.0;
        assert!((s.avg_latency_ms - expected_avg_latency).abs() < 1e-9);
        assert_eq!(s.pulls, 2);
    }
}
