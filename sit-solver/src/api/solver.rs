use std::path::PathBuf;
use std::time::Duration;

use super::SolveResult;
use crate::adapters::reference::CornerBoundSolver;
use crate::adapters::reference::FixedPointObjectiveSolver;
use crate::adapters::BoundSolver;
use crate::adapters::ObjectiveSolver;
use crate::basic_types::ModelError;
use crate::basic_types::Status;
use crate::engine::EngineStatistics;
use crate::engine::SitEngine;
use crate::options::CheckpointOptions;
use crate::options::SearchOptions;
use crate::options::SolverOptions;
use crate::reformulation::Constraint;
use crate::reformulation::LinearExpression;
use crate::reformulation::Logterm;
use crate::reformulation::Reformulation;
use crate::reformulation::ReformulationStatistics;
use crate::statistics::log_statistic_postfix;
use crate::statistics::StatisticLogger;

/// The main interaction point: builds a model over non-convex (`nc`) and convex (`c`)
/// variables and optimises it.
///
/// The objective is maximised over a box of the non-convex variables. The convex variables are
/// non-negative and only appear linearly or inside logarithms that keep the problem convex once
/// the non-convex variables are fixed.
///
/// ```rust
/// # use sit_solver::BoundType;
/// # use sit_solver::Constraint;
/// # use sit_solver::LinearExpression;
/// # use sit_solver::Logterm;
/// # use sit_solver::LogtermSign;
/// # use sit_solver::Solver;
/// # use sit_solver::Status;
/// // max x s.t. log(1 + x) <= 2 on [0, 10]
/// let mut solver = Solver::new(1, 0, 1);
/// solver.set_nc_bounds(0, 0.0, 10.0).unwrap();
/// solver
///     .set_objective(LinearExpression::new([1.0], [], 0.0), None)
///     .unwrap();
/// solver
///     .set_constraint(0, Constraint::new([0.0], [], BoundType::Upper, 2.0))
///     .unwrap();
/// solver
///     .add_logterm(
///         0,
///         Logterm::plain(LogtermSign::Plus, LinearExpression::new([1.0], [], 1.0)),
///     )
///     .unwrap();
/// solver.set_precision(1e-3, None).unwrap();
///
/// let result = solver.optimise().unwrap();
/// assert_eq!(result.status, Status::Optimal);
/// assert!((result.optval - 6.389).abs() <= 1e-3);
/// ```
#[derive(Debug)]
pub struct Solver<
    Bound: BoundSolver = CornerBoundSolver,
    Objectives: ObjectiveSolver = FixedPointObjectiveSolver,
> {
    engine: SitEngine,
    reformulation: Reformulation<Bound, Objectives>,
}

impl Solver {
    /// Creates a solver with `nc_dimension` non-convex variables, `c_dimension` convex variables
    /// and `num_constraints` constraints, using the default [`SolverOptions`].
    pub fn new(nc_dimension: usize, c_dimension: usize, num_constraints: usize) -> Self {
        Self::with_options(
            nc_dimension,
            c_dimension,
            num_constraints,
            SolverOptions::default(),
        )
    }

    pub fn with_options(
        nc_dimension: usize,
        c_dimension: usize,
        num_constraints: usize,
        options: SolverOptions,
    ) -> Self {
        Self::with_backends(
            nc_dimension,
            c_dimension,
            num_constraints,
            options.search,
            CornerBoundSolver::new(options.backend),
            FixedPointObjectiveSolver::new(options.backend),
        )
    }
}

impl<Bound: BoundSolver, Objectives: ObjectiveSolver> Solver<Bound, Objectives> {
    /// Creates a solver which uses the given convex subproblem solvers.
    pub fn with_backends(
        nc_dimension: usize,
        c_dimension: usize,
        num_constraints: usize,
        options: SearchOptions,
        bound_solver: Bound,
        objective_solver: Objectives,
    ) -> Self {
        Self {
            engine: SitEngine::new(nc_dimension, options),
            reformulation: Reformulation::with_backends(
                nc_dimension,
                c_dimension,
                num_constraints,
                bound_solver,
                objective_solver,
            ),
        }
    }

    /// Sets the range of non-convex variable `index`; both bounds are required and finite.
    pub fn set_nc_bounds(&mut self, index: usize, lb: f64, ub: f64) -> Result<(), ModelError> {
        self.engine.set_bounds(index, lb, ub)
    }

    /// Sets the range of convex variable `index`: `lb >= 0` and an optional `ub > lb`.
    pub fn set_c_bounds(
        &mut self,
        index: usize,
        lb: f64,
        ub: Option<f64>,
    ) -> Result<(), ModelError> {
        self.reformulation.set_c_bounds(index, lb, ub)?;
        self.engine.reset_status();
        Ok(())
    }

    /// Sets the objective `numerator / denominator`, or the numerator alone.
    pub fn set_objective(
        &mut self,
        numerator: LinearExpression,
        denominator: Option<LinearExpression>,
    ) -> Result<(), ModelError> {
        self.reformulation.set_objective(numerator, denominator)?;
        self.engine.reset_status();
        Ok(())
    }

    pub fn set_constraint(&mut self, index: usize, constraint: Constraint) -> Result<(), ModelError> {
        self.reformulation.set_constraint(index, constraint)?;
        self.engine.reset_status();
        Ok(())
    }

    pub fn add_logterm(&mut self, constraint: usize, logterm: Logterm) -> Result<(), ModelError> {
        self.reformulation.add_logterm(constraint, logterm)?;
        self.engine.reset_status();
        Ok(())
    }

    /// Sets the improvement step `eta` and the pruning tolerance, `eta * 1e-3` unless given.
    pub fn set_precision(&mut self, eta: f64, epsilon: Option<f64>) -> Result<(), ModelError> {
        self.engine.set_precision(eta, epsilon)
    }

    pub fn eta(&self) -> f64 {
        self.engine.eta()
    }

    pub fn epsilon(&self) -> f64 {
        self.engine.epsilon()
    }

    /// Sets the value the first incumbent has to reach. With `-inf` any feasible point is
    /// accepted as the first incumbent.
    pub fn set_initial_threshold(&mut self, gamma: f64) {
        self.engine.set_initial_threshold(gamma);
    }

    pub fn set_output_every(&mut self, iterations: u64) {
        self.engine.set_output_every(iterations);
    }

    /// Saves the search to `path` every `interval`, and resumes from it when it exists.
    pub fn enable_checkpoint(&mut self, path: impl Into<PathBuf>, interval: Duration) {
        self.engine
            .enable_checkpoint(CheckpointOptions::new(path, interval));
    }

    pub fn disable_checkpoint(&mut self) {
        self.engine.disable_checkpoint();
    }

    /// Deletes the checkpoint and its backup.
    pub fn remove_checkpoint(&self) -> std::io::Result<()> {
        self.engine.remove_checkpoint()
    }

    pub fn status(&self) -> Status {
        self.engine.state().status()
    }

    pub fn engine_statistics(&self) -> &EngineStatistics {
        self.engine.statistics()
    }

    pub fn reformulation_statistics(&self) -> &ReformulationStatistics {
        self.reformulation.statistics()
    }

    /// Runs the search until the incumbent is optimal within the precision, or no point is
    /// feasible.
    pub fn optimise(&mut self) -> Result<SolveResult, ModelError> {
        self.reformulation.prepare()?;
        let state = self.engine.optimise(&mut self.reformulation)?;

        let solved = state.status() == Status::Optimal;
        Ok(SolveResult {
            status: state.status(),
            optval: if solved {
                state.optval()
            } else {
                f64::NEG_INFINITY
            },
            xopt: state.xopt().to_vec(),
            xopt_c: match self.reformulation.last_c_solution() {
                Some(solution) if solved => solution.to_vec(),
                _ => vec![],
            },
            iter: state.iter(),
            last_update: state.last_update(),
            runtime: state.runtime(),
            eta: self.engine.eta(),
            epsilon: self.engine.epsilon(),
        })
    }

    /// Logs the statistics of the last search.
    pub fn log_statistics(&self) {
        self.engine
            .log_statistics(StatisticLogger::new(["engine"]));
        self.reformulation
            .log_statistics(StatisticLogger::new(["reformulation"]));
        log_statistic_postfix();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::BoundType;

    #[test]
    fn model_changes_reset_the_status() {
        let mut solver = Solver::new(1, 0, 1);
        solver.set_nc_bounds(0, 0.0, 1.0).unwrap();
        solver
            .set_objective(LinearExpression::new([1.0], [], 0.0), None)
            .unwrap();
        solver
            .set_constraint(0, Constraint::new([1.0], [], BoundType::Upper, 0.5))
            .unwrap();

        let result = solver.optimise().unwrap();
        assert_eq!(result.status, Status::Optimal);
        assert_eq!(solver.status(), Status::Optimal);

        solver.set_precision(1e-3, None).unwrap();
        assert_eq!(solver.status(), Status::Unsolved);
    }

    #[test]
    fn missing_constraints_abort_before_searching() {
        let mut solver = Solver::new(1, 0, 1);
        solver.set_nc_bounds(0, 0.0, 1.0).unwrap();
        solver
            .set_objective(LinearExpression::new([1.0], [], 0.0), None)
            .unwrap();

        assert_eq!(solver.optimise(), Err(ModelError::ConstraintUndefined(0)));
        assert_eq!(solver.engine_statistics().regions_bounded, 0);
    }

    #[test]
    fn epsilon_follows_eta_unless_given() {
        let mut solver = Solver::new(1, 0, 0);
        solver.set_precision(1e-2, None).unwrap();
        assert_eq!(solver.epsilon(), 1e-5);

        solver.set_precision(1e-2, Some(1e-4)).unwrap();
        assert_eq!(solver.eta(), 1e-2);
        assert_eq!(solver.epsilon(), 1e-4);
    }
}
