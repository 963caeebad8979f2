/// One entry in the fixed, declared-order arm table (spec.md C5). The
/// declared order is load-bearing: cold-start sweeps and tie-breaks both
/// fall back to it.
#[derive(Debug, Clone, Copy)]
pub struct ArmSpec {
    pub name: &'static str,
    pub nprobe: Option<usize>,
    pub max_codes: Option<usize>,
}

/// The fixed arm set, in declared order. `nprobe`/`max_codes` are `None`
/// for `flat`, which does not probe an index at all.
pub const ARMS: [ArmSpec; 4] = [
    ArmSpec {
        name: "flat",
        nprobe: None,
        max_codes: None,
    },
    ArmSpec {
        name: "ivf_conservative",
        nprobe: Some(5),
        max_codes: Some(10_000),
    },
    ArmSpec {
        name: "ivf_balanced",
        nprobe: Some(10),
        max_codes: Some(50_000),
    },
    ArmSpec {
        name: "ivf_aggressive",
        nprobe: Some(20),
        max_codes: Some(100_000),
    },
];

pub fn arm_index(name: &str) -> Option<usize> {
    ARMS.iter().position(|a| a.name == name)
}
