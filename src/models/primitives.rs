/// Floating point type used for distances, loads and costs
pub type FloatType = f64;

/// Integer type used for counters and timestamps
pub type IntType = i64;
