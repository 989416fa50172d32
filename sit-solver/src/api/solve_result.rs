use std::fmt::Display;
use std::fmt::Formatter;
use std::time::Duration;

use itertools::Itertools;

use crate::basic_types::Status;
#[cfg(doc)]
use crate::Solver;

/// A snapshot of the outcome of [`Solver::optimise`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub status: Status,
    /// The objective value at `xopt`; `-inf` when the problem is infeasible.
    pub optval: f64,
    /// The non-convex part of the best point.
    pub xopt: Vec<f64>,
    /// The convex part of the best point, as found by the objective solver at `xopt`. Empty
    /// when `xopt` could not be evaluated again after the search.
    pub xopt_c: Vec<f64>,
    pub iter: u64,
    /// The iteration in which `xopt` was found.
    pub last_update: u64,
    pub runtime: Duration,
    pub eta: f64,
    pub epsilon: f64,
}

impl Display for SolveResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "status: {}", self.status)?;
        if self.status == Status::Optimal {
            writeln!(f, "optval: {}", self.optval)?;
            writeln!(f, "xopt_c: [{}]", self.xopt_c.iter().join(", "))?;
            writeln!(f, "xopt_nc: [{}]", self.xopt.iter().join(", "))?;
        }
        writeln!(f, "precision: eta = {}, epsilon = {}", self.eta, self.epsilon)?;
        writeln!(
            f,
            "iterations: {} (solution found in iteration {})",
            self.iter, self.last_update
        )?;
        write!(f, "runtime: {:.6} s", self.runtime.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_results_omit_the_solution() {
        let result = SolveResult {
            status: Status::Infeasible,
            optval: f64::NEG_INFINITY,
            xopt: vec![0.0],
            xopt_c: vec![],
            iter: 1,
            last_update: 0,
            runtime: Duration::from_millis(1500),
            eta: 1e-3,
            epsilon: 1e-6,
        };

        let printed = result.to_string();
        assert!(printed.starts_with("status: Infeasible\n"));
        assert!(!printed.contains("optval"));
        assert!(printed.ends_with("runtime: 1.500000 s"));
    }

    #[test]
    fn optimal_results_list_both_parts_of_the_point() {
        let result = SolveResult {
            status: Status::Optimal,
            optval: 2.5,
            xopt: vec![1.0, 1.5],
            xopt_c: vec![0.5],
            iter: 10,
            last_update: 4,
            runtime: Duration::ZERO,
            eta: 1e-2,
            epsilon: 1e-5,
        };

        let printed = result.to_string();
        assert!(printed.contains("optval: 2.5\n"));
        assert!(printed.contains("xopt_c: [0.5]\n"));
        assert!(printed.contains("xopt_nc: [1, 1.5]\n"));
        assert!(printed.contains("iterations: 10 (solution found in iteration 4)\n"));
    }
}
