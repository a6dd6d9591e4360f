//! Solver-wide tunables.

/// Tunable parameters for a [`crate::Solver`].
///
/// Grouping these in one small, cloneable struct (rather than scattering
/// magic numbers through the engine) mirrors the `*SolverStats` structs in
/// the teacher lineage: plain data, `Debug + Clone + Default`, documented
/// per field.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Number of internal search iterations between cooperative
    /// checkpoints, where cancellation is polled and a progress snapshot
    /// may be emitted.
    pub checkpoint_interval: u32,

    /// Emit a progress-callback snapshot every `2^k` iterations for this
    /// `k`. `0` disables progress callbacks entirely.
    pub progress_every_power_of_2_iterations: u32,

    /// Number of [`crate::conflict::ConflictScores::bump`] calls between
    /// decay passes.
    pub conflict_decay_countdown: u32,

    /// The saturating support-count threshold `T` used by
    /// [`crate::conflict::SeenCandidateSet`] to decide whether a
    /// (cell, value) pair has been seen "enough" to stop being
    /// interesting.
    pub seen_candidate_threshold: u8,

    /// Optional fixed seed for the RNG driving
    /// [`crate::api::Solver::estimated_count_solutions`]. `None` seeds
    /// from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 1024,
            progress_every_power_of_2_iterations: 10,
            conflict_decay_countdown: 1024,
            seen_candidate_threshold: 3,
            rng_seed: None,
        }
    }
}

impl SolverConfig {
    /// Creates a config with the default tunables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
