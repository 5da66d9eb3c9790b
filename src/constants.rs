use crate::models::FloatType;

/// Tolerance below which a capacity or duration excess counts as zero
pub const EPSILON: FloatType = 1e-9;

/// Stand-in for an unconstrained duration limit or an unreachable label
pub const UNBOUNDED: FloatType = 1e30;

/// Bounds enforced on both penalty coefficients throughout a run
pub const PENALTY_MIN: FloatType = 0.1;
pub const PENALTY_MAX: FloatType = 100_000.0;
