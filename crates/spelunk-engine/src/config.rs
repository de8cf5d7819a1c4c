//! Walker configuration.

/// Tuning knobs for one walker. The defaults are the canonical limits; they
/// exist as configuration so tests and drivers can tighten or relax them.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Maximum worklist pops per procedure before aborting with
    /// [`EngineError::MaximumStepsReached`](crate::EngineError::MaximumStepsReached).
    pub max_steps: usize,

    /// How many times a single program point may be re-entered along one
    /// path before further enqueues at that point are dropped. This is the
    /// loop-unroll bound.
    pub max_point_visits: u32,

    /// Size of the constraint store past which a state counts as oversized.
    /// The abort fires only when the step-and-frontier gate is also
    /// exceeded, so a large store alone does not end exploration.
    pub constraints_soft_limit: usize,

    /// Fully qualified annotation names marking a parameter as nullable.
    /// Each such parameter fans the starting states out into a null and a
    /// non-null variant.
    pub nullable_annotations: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        WalkerConfig {
            max_steps: 10_000,
            max_point_visits: 2,
            constraints_soft_limit: 75,
            nullable_annotations: vec![
                "javax.annotation.CheckForNull".to_string(),
                "javax.annotation.Nullable".to_string(),
            ],
        }
    }
}
