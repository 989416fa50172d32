use std::time::Duration;
use std::time::Instant;

use log::debug;
use log::info;
use log::warn;

use super::split_region;
use super::BoundingProblem;
use super::EngineStatistics;
use super::Partition;
use super::SearchState;
use crate::basic_types::ModelError;
use crate::basic_types::Status;
use crate::checkpoint::remove_checkpoint;
use crate::checkpoint::restore_checkpoint;
use crate::checkpoint::write_checkpoint;
use crate::checkpoint::CheckpointState;
use crate::checkpoint::FrontierRecord;
use crate::containers::Frontier;
use crate::containers::RegionId;
use crate::containers::RegionPool;
use crate::options::CheckpointOptions;
use crate::options::SearchOptions;
use crate::sit_assert_moderate;
use crate::sit_assert_simple;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

/// The branch-and-bound engine over a box of non-convex variables.
///
/// Every iteration bounds the regions created by the previous branch, keeps those with
/// `beta <= -epsilon` in the frontier, tries the candidate of the most promising region as a new
/// incumbent and splits that region in two. The search ends when the frontier runs empty.
#[derive(Debug)]
pub struct SitEngine {
    lb: Vec<f64>,
    ub: Vec<f64>,
    eta: f64,
    epsilon: f64,
    initial_threshold: f64,
    output_every: u64,
    checkpoint: Option<CheckpointOptions>,
    state: SearchState,
    statistics: EngineStatistics,
}

/// The frontier and pool of a running search.
struct SearchSpace {
    pool: RegionPool,
    frontier: Frontier,
    partition: Partition,
}

impl SitEngine {
    pub fn new(dimension: usize, options: SearchOptions) -> Self {
        Self {
            lb: vec![f64::NAN; dimension],
            ub: vec![f64::NAN; dimension],
            eta: options.eta,
            epsilon: options.epsilon(),
            initial_threshold: options.initial_threshold,
            output_every: options.output_every,
            checkpoint: None,
            state: SearchState::new(dimension),
            statistics: EngineStatistics::default(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.lb.len()
    }

    /// Sets the range of variable `index` in the initial box.
    pub fn set_bounds(&mut self, index: usize, lb: f64, ub: f64) -> Result<(), ModelError> {
        if index >= self.dimension() {
            return Err(ModelError::IndexOutOfRange {
                kind: "the non-convex variables",
                index,
                size: self.dimension(),
            });
        }
        if !lb.is_finite() || !ub.is_finite() || lb > ub {
            return Err(ModelError::InvalidNonConvexBounds { index, lb, ub });
        }

        self.lb[index] = lb;
        self.ub[index] = ub;
        self.state.status = Status::Unsolved;
        Ok(())
    }

    /// Sets the improvement step `eta` and the pruning tolerance `epsilon`, which defaults to
    /// `eta * 1e-3`.
    pub fn set_precision(&mut self, eta: f64, epsilon: Option<f64>) -> Result<(), ModelError> {
        let epsilon = epsilon.unwrap_or(eta * 1e-3);
        let valid = |value: f64| value.is_finite() && value > 0.0;
        if !valid(eta) || !valid(epsilon) {
            return Err(ModelError::InvalidPrecision { eta, epsilon });
        }

        self.eta = eta;
        self.epsilon = epsilon;
        self.state.status = Status::Unsolved;
        Ok(())
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_initial_threshold(&mut self, gamma: f64) {
        self.initial_threshold = gamma;
        self.state.status = Status::Unsolved;
    }

    pub fn initial_threshold(&self) -> f64 {
        self.initial_threshold
    }

    pub fn set_output_every(&mut self, iterations: u64) {
        self.output_every = iterations;
    }

    pub fn enable_checkpoint(&mut self, options: CheckpointOptions) {
        self.checkpoint = Some(options);
    }

    pub fn disable_checkpoint(&mut self) {
        self.checkpoint = None;
    }

    /// Deletes the checkpoint files of the configured checkpoint, if any.
    pub fn remove_checkpoint(&self) -> std::io::Result<()> {
        match &self.checkpoint {
            Some(options) => remove_checkpoint(&options.path),
            None => Ok(()),
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn statistics(&self) -> &EngineStatistics {
        &self.statistics
    }

    pub fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.statistics.log(statistic_logger);
    }

    /// Marks the last result as outdated after the problem changed.
    pub fn reset_status(&mut self) {
        self.state.status = Status::Unsolved;
    }

    fn validate(&self, problem: &impl BoundingProblem) -> Result<(), ModelError> {
        if problem.dimension() != self.dimension() {
            return Err(ModelError::DimensionMismatch {
                kind: "the bounding problem",
                expected: self.dimension(),
                actual: problem.dimension(),
            });
        }
        if self.initial_threshold.is_nan() {
            return Err(ModelError::ThresholdUnset);
        }
        if self.initial_threshold == f64::INFINITY {
            return Err(ModelError::InvalidThreshold(self.initial_threshold));
        }
        if let Some(index) = (0..self.dimension()).find(|&index| self.lb[index].is_nan()) {
            return Err(ModelError::BoundsUnset(index));
        }
        Ok(())
    }

    /// Runs the search to completion.
    ///
    /// If checkpointing is enabled and a checkpoint exists, the search resumes from it.
    pub fn optimise<Problem: BoundingProblem>(
        &mut self,
        problem: &mut Problem,
    ) -> Result<&SearchState, ModelError> {
        self.validate(problem)?;
        self.statistics = EngineStatistics::default();

        let mut space = self.initialise();
        problem.set_threshold(self.state.gamma);

        let start = Instant::now();
        let previous_runtime = self.state.runtime;
        let mut paused = Duration::ZERO;
        let mut last_checkpoint = Instant::now();

        loop {
            if self.output_every > 0 && self.state.iter % self.output_every == 0 {
                info!(
                    "iteration {}: {} regions open, optval {}, last update {}",
                    self.state.iter,
                    space.frontier.len(),
                    self.state.optval,
                    self.state.last_update
                );
            }

            let checkpoint_due = self
                .checkpoint
                .as_ref()
                .is_some_and(|options| last_checkpoint.elapsed() >= options.interval);
            if checkpoint_due {
                let pause = Instant::now();
                self.state.runtime = previous_runtime + start.elapsed().saturating_sub(paused);
                self.save(&space);
                paused += pause.elapsed();
                last_checkpoint = Instant::now();
            }

            self.state.iter += 1;

            for id in space.partition.take() {
                let region = space.pool.get_mut(id);
                problem.bound(region);
                self.statistics.regions_bounded += 1;

                let beta = region.beta();
                if beta <= -self.epsilon {
                    space.frontier.push(id, beta);
                } else {
                    self.statistics.regions_pruned += 1;
                    space.pool.release(id);
                }
            }

            let Some(selected) = space.frontier.pop_min() else {
                break;
            };

            let candidate = space.pool.get(selected).candidate();
            if let Some(value) = problem.evaluate(candidate) {
                let improves = if self.state.has_incumbent {
                    value > self.state.optval
                } else {
                    value >= self.initial_threshold
                };
                if improves {
                    let previous_gamma = self.state.gamma;
                    self.state.xopt.copy_from_slice(candidate);
                    self.state.optval = value;
                    self.state.gamma = value + self.eta;
                    self.state.has_incumbent = true;
                    self.state.last_update = self.state.iter;
                    self.statistics.incumbent_updates += 1;
                    sit_assert_moderate!(self.state.gamma > previous_gamma);

                    debug!(
                        "iteration {}: new incumbent with value {value}",
                        self.state.iter
                    );
                    problem.set_threshold(self.state.gamma);
                }
            }

            space.partition = Self::branch(&mut space.pool, selected);
        }

        self.state.runtime = previous_runtime + start.elapsed().saturating_sub(paused);
        self.finish(problem, &space);
        Ok(&self.state)
    }

    /// Restores the search from the checkpoint, or starts from the initial box.
    fn initialise(&mut self) -> SearchSpace {
        let dimension = self.dimension();
        let mut pool = RegionPool::new(dimension);
        let mut frontier = Frontier::default();

        let restored = self
            .checkpoint
            .as_ref()
            .and_then(|options| restore_checkpoint(&options.path, dimension));

        let Some(checkpoint) = restored else {
            self.state.reset(self.initial_threshold);
            let initial = pool.acquire(&self.lb, &self.ub);
            return SearchSpace {
                pool,
                frontier,
                partition: Partition::single(initial),
            };
        };

        self.state.reset(self.initial_threshold);
        self.state.has_incumbent = checkpoint.optval.is_finite();
        if self.state.has_incumbent {
            self.state.optval = checkpoint.optval;
            self.state.xopt.copy_from_slice(&checkpoint.xopt);
            self.state.gamma = checkpoint.optval + self.eta;
        }
        self.state.runtime = Duration::from_secs_f64(checkpoint.runtime.max(0.0));
        self.state.iter = checkpoint.iter;
        self.state.last_update = checkpoint.last_update;

        let partition = Partition::from_members(
            checkpoint
                .partition
                .iter()
                .map(|region| pool.acquire(&region.lb, &region.ub))
                .collect(),
        );

        for record in &checkpoint.frontier {
            let id = pool.acquire(&record.region.lb, &record.region.ub);
            pool.get_mut(id).restore(record.beta, &record.xk, record.yk);
            frontier.push(id, record.beta);
        }

        info!(
            "Resuming at iteration {} with {} open regions",
            self.state.iter,
            frontier.len()
        );
        SearchSpace {
            pool,
            frontier,
            partition,
        }
    }

    fn save(&mut self, space: &SearchSpace) {
        let Some(options) = &self.checkpoint else {
            return;
        };

        let checkpoint = CheckpointState {
            optval: if self.state.has_incumbent {
                self.state.optval
            } else {
                f64::NEG_INFINITY
            },
            xopt: self.state.xopt.clone(),
            runtime: self.state.runtime.as_secs_f64(),
            iter: self.state.iter,
            last_update: self.state.last_update,
            partition: space
                .partition
                .members()
                .iter()
                .map(|&id| space.pool.get(id).to_pbox())
                .collect(),
            frontier: space
                .frontier
                .regions()
                .map(|id| {
                    let region = space.pool.get(id);
                    FrontierRecord {
                        beta: region.beta(),
                        region: region.to_pbox(),
                        xk: region.candidate().into(),
                        yk: region.reference_corner(),
                    }
                })
                .collect(),
        };

        match write_checkpoint(&options.path, &checkpoint) {
            Ok(()) => self.statistics.checkpoints_written += 1,
            Err(error) => {
                self.statistics.checkpoint_failures += 1;
                warn!(
                    "Writing checkpoint {} failed, keeping the previous one: {error}",
                    options.path.display()
                );
            }
        }
    }

    /// Splits `selected` into two regions and returns it to the pool.
    fn branch(pool: &mut RegionPool, selected: RegionId) -> Partition {
        let region = pool.get(selected);
        let split = split_region(region);
        sit_assert_simple!(split.coordinate < region.dimension());

        let lb = region.lower_bounds().to_vec();
        let mut ub = region.upper_bounds().to_vec();

        let upper_half = {
            let mut lb = lb.clone();
            lb[split.coordinate] = split.value;
            pool.acquire(&lb, &ub)
        };
        ub[split.coordinate] = split.value;
        let lower_half = pool.acquire(&lb, &ub);

        pool.release(selected);
        Partition::pair(lower_half, upper_half)
    }

    fn finish(&mut self, problem: &mut impl BoundingProblem, space: &SearchSpace) {
        self.statistics.peak_frontier = space.frontier.peak_len();
        self.statistics.regions_allocated = space.pool.num_allocated();
        self.statistics.regions_recycled = space.pool.num_recycled();
        self.statistics.runtime = self.state.runtime.as_secs_f64();

        if !self.state.has_incumbent {
            self.state.status = Status::Infeasible;
            info!("Search finished after {} iterations: infeasible", self.state.iter);
            return;
        }

        let xopt = self.state.xopt.clone();
        match problem.evaluate(&xopt) {
            Some(value) => self.state.optval = value,
            None => warn!("The incumbent could not be re-evaluated, keeping its recorded value"),
        }
        self.state.status = Status::Optimal;
        info!(
            "Search finished after {} iterations: optimal value {} found in iteration {}",
            self.state.iter, self.state.optval, self.state.last_update
        );
    }
}
