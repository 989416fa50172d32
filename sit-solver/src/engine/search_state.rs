use std::time::Duration;

use crate::basic_types::Status;

/// The incumbent and counters of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub(crate) xopt: Vec<f64>,
    pub(crate) optval: f64,
    pub(crate) gamma: f64,
    pub(crate) has_incumbent: bool,
    pub(crate) iter: u64,
    pub(crate) last_update: u64,
    pub(crate) runtime: Duration,
    pub(crate) status: Status,
}

impl SearchState {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            xopt: vec![0.0; dimension],
            optval: f64::NEG_INFINITY,
            gamma: f64::NAN,
            has_incumbent: false,
            iter: 0,
            last_update: 0,
            runtime: Duration::ZERO,
            status: Status::Unsolved,
        }
    }

    pub(crate) fn reset(&mut self, gamma: f64) {
        self.xopt.iter_mut().for_each(|value| *value = 0.0);
        self.optval = f64::NEG_INFINITY;
        self.gamma = gamma;
        self.has_incumbent = false;
        self.iter = 0;
        self.last_update = 0;
        self.runtime = Duration::ZERO;
        self.status = Status::Unsolved;
    }

    /// The best point found; meaningless without an incumbent.
    pub fn xopt(&self) -> &[f64] {
        &self.xopt
    }

    /// The objective value of the incumbent, `-inf` if there is none.
    pub fn optval(&self) -> f64 {
        self.optval
    }

    /// The value a new incumbent has to reach.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn has_incumbent(&self) -> bool {
        self.has_incumbent
    }

    pub fn iter(&self) -> u64 {
        self.iter
    }

    /// The iteration in which the incumbent was found.
    pub fn last_update(&self) -> u64 {
        self.last_update
    }

    /// Time spent searching, excluding checkpoint writes.
    pub fn runtime(&self) -> Duration {
        self.runtime
    }

    pub fn status(&self) -> Status {
        self.status
    }
}
