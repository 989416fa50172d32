//! Configuration of the search and of the reference convex backend.

use std::path::PathBuf;
use std::time::Duration;

/// The precision of the search and the threshold it starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// The improvement step: after finding an incumbent with value `v`, only solutions better
    /// than `v + eta` are searched for.
    pub eta: f64,
    /// The pruning tolerance; when `None` it is `eta * 1e-3`.
    pub epsilon: Option<f64>,
    /// The threshold the first incumbent has to reach. `NaN` means unset.
    pub initial_threshold: f64,
    /// Log a progress line every this many iterations; zero disables progress output.
    pub output_every: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            eta: 1e-2,
            epsilon: None,
            initial_threshold: f64::NAN,
            output_every: 1000,
        }
    }
}

impl SearchOptions {
    pub fn epsilon(&self) -> f64 {
        self.epsilon.unwrap_or(self.eta * 1e-3)
    }
}

/// Tolerances of the reference convex backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendOptions {
    /// Slack allowed when checking a point against the exact constraints.
    pub feasibility_tolerance: f64,
    /// The cutting-plane loop stops once every logarithm is approximated this closely.
    pub cut_tolerance: f64,
    /// The maximal number of cuts per solve.
    pub max_cuts: usize,
    /// The Dinkelbach loop stops once `|N(y) - lambda D(y)|` drops below this value.
    pub dinkelbach_tolerance: f64,
    pub dinkelbach_max_iterations: usize,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            feasibility_tolerance: 1e-7,
            cut_tolerance: 1e-9,
            max_cuts: 200,
            dinkelbach_tolerance: 1e-9,
            dinkelbach_max_iterations: 100,
        }
    }
}

/// The options of a [`Solver`](crate::Solver).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub search: SearchOptions,
    pub backend: BackendOptions,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            // Objectives are compared against zero until the first incumbent is found.
            search: SearchOptions {
                initial_threshold: 0.0,
                ..SearchOptions::default()
            },
            backend: BackendOptions::default(),
        }
    }
}

/// Where and how often the search state is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointOptions {
    pub path: PathBuf,
    /// The wall-clock time between two checkpoints.
    pub interval: Duration,
}

impl CheckpointOptions {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }
}
