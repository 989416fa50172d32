use log::debug;

use super::model::dot;
use super::Constraint;
use super::LinearExpression;
use super::Logterm;
use super::Objective;
use super::SignRegistry;
use crate::adapters::reference::CornerBoundSolver;
use crate::adapters::reference::FixedPointObjectiveSolver;
use crate::adapters::BoundSolver;
use crate::adapters::BoundType;
use crate::adapters::LogHandle;
use crate::adapters::ObjectiveSolver;
use crate::basic_types::ModelError;
use crate::create_statistics_struct;
use crate::engine::BoundingProblem;
use crate::engine::ReferenceCorner;
use crate::engine::Region;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

create_statistics_struct!(
    /// Counters of the calls into the convex subproblem solvers.
    ReformulationStatistics {
        bound_solves: u64,
        /// Bound computations the bound solver could not complete
        bound_failures: u64,
        objective_solves: u64,
        /// Candidate points which turned out to violate the exact constraints
        infeasible_points: u64,
});

/// The corner of a box at which the denominators of all logterm envelopes are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeCorner {
    Lower,
    Upper,
}

#[derive(Debug, Clone)]
struct RegisteredLogterm {
    constraint: usize,
    logterm: Logterm,
    objective_handle: Option<LogHandle>,
}

impl RegisteredLogterm {
    /// The sign of the logterm in the `<=` orientation of its constraint.
    fn orientation(&self, bound_type: BoundType) -> f64 {
        self.logterm.sign.value() * bound_type.direction()
    }
}

/// Turns a model of objective, constraints and logterms into bounds over boxes of the
/// non-convex variables.
///
/// The objective `N / D` is handled through its parametric form: a box can only contain a point
/// reaching the threshold `gamma` if `gamma * D - N <= 0` holds somewhere in it, which is row `0`
/// of the bound solver. Constraint `i` becomes row `i + 1` there and row `i` of the objective
/// solver. Logterm denominators are moved to the right-hand side, evaluated at the box corner
/// where they loosen the constraint most.
#[derive(Debug)]
pub struct Reformulation<
    Bound: BoundSolver = CornerBoundSolver,
    Objectives: ObjectiveSolver = FixedPointObjectiveSolver,
> {
    nc_dimension: usize,
    c_dimension: usize,
    c_lb: Vec<f64>,
    c_ub: Vec<Option<f64>>,
    objective: Option<Objective>,
    constraints: Vec<Option<Constraint>>,
    logterms: Vec<RegisteredLogterm>,
    sign_registry: SignRegistry,
    envelope: Option<EnvelopeCorner>,
    bound_solver: Bound,
    objective_solver: Objectives,
    gamma: f64,
    last_c_solution: Option<Vec<f64>>,
    statistics: ReformulationStatistics,
}

impl Reformulation {
    pub fn new(nc_dimension: usize, c_dimension: usize, num_constraints: usize) -> Self {
        Self::with_backends(
            nc_dimension,
            c_dimension,
            num_constraints,
            CornerBoundSolver::default(),
            FixedPointObjectiveSolver::default(),
        )
    }
}

impl<Bound: BoundSolver, Objectives: ObjectiveSolver> Reformulation<Bound, Objectives> {
    pub fn with_backends(
        nc_dimension: usize,
        c_dimension: usize,
        num_constraints: usize,
        bound_solver: Bound,
        objective_solver: Objectives,
    ) -> Self {
        Self {
            nc_dimension,
            c_dimension,
            c_lb: vec![0.0; c_dimension],
            c_ub: vec![None; c_dimension],
            objective: None,
            constraints: vec![None; num_constraints],
            logterms: vec![],
            sign_registry: SignRegistry::new(nc_dimension),
            envelope: None,
            bound_solver,
            objective_solver,
            gamma: f64::NAN,
            last_c_solution: None,
            statistics: ReformulationStatistics::default(),
        }
    }

    pub fn nc_dimension(&self) -> usize {
        self.nc_dimension
    }

    pub fn c_dimension(&self) -> usize {
        self.c_dimension
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Sets the range of convex variable `index`: `lb >= 0` and, if given, `ub > lb`.
    pub fn set_c_bounds(&mut self, index: usize, lb: f64, ub: Option<f64>) -> Result<(), ModelError> {
        check_index("the convex variables", index, self.c_dimension)?;
        let valid_ub = ub.map_or(true, |ub| ub.is_finite() && ub > lb);
        if !lb.is_finite() || lb < 0.0 || !valid_ub {
            return Err(ModelError::InvalidConvexBounds {
                index,
                lb,
                ub: ub.unwrap_or(f64::INFINITY),
            });
        }

        self.c_lb[index] = lb;
        self.c_ub[index] = ub;
        Ok(())
    }

    /// Sets the objective; a denominator which is identically zero counts as absent.
    pub fn set_objective(
        &mut self,
        numerator: LinearExpression,
        denominator: Option<LinearExpression>,
    ) -> Result<(), ModelError> {
        self.check_expression("the objective numerator", &numerator)?;
        if let Some(denominator) = &denominator {
            self.check_expression("the objective denominator", denominator)?;
        }

        self.objective = Some(Objective {
            numerator,
            denominator: denominator.filter(|denominator| !denominator.is_zero()),
        });
        Ok(())
    }

    pub fn set_constraint(&mut self, index: usize, constraint: Constraint) -> Result<(), ModelError> {
        check_index("the constraints", index, self.constraints.len())?;
        if self.constraints[index].is_some() {
            return Err(ModelError::ConstraintRedefined(index));
        }
        check_dimension("the constraint", self.nc_dimension, constraint.nc.len())?;
        check_dimension("the constraint", self.c_dimension, constraint.c.len())?;

        self.constraints[index] = Some(constraint);
        Ok(())
    }

    /// Adds a logterm to the left-hand side of an already defined constraint.
    pub fn add_logterm(&mut self, constraint: usize, logterm: Logterm) -> Result<(), ModelError> {
        check_index("the constraints", constraint, self.constraints.len())?;
        let bound_type = self.constraints[constraint]
            .as_ref()
            .map(|constraint| constraint.bound_type)
            .ok_or(ModelError::ConstraintUndefined(constraint))?;

        self.check_expression("the logterm numerator", &logterm.numerator)?;
        check_dimension("the logterm denominator", self.nc_dimension, logterm.denominator_nc.len())?;
        if let Some(variable) = logterm
            .denominator_nc
            .iter()
            .position(|&coefficient| coefficient < 0.0)
        {
            return Err(ModelError::NegativeEnvelopeCoefficient {
                constraint,
                variable,
            });
        }
        if logterm.has_envelope() {
            if bound_type == BoundType::Fixed {
                return Err(ModelError::EnvelopeInEquality(constraint));
            }
        } else if logterm.denominator_constant <= 0.0 {
            return Err(ModelError::NonPositiveLogDenominator(constraint));
        }

        let orientation = logterm.sign.value() * bound_type.direction();
        self.sign_registry
            .check(constraint, &logterm.numerator.nc, orientation)?;
        self.sign_registry.record(&logterm.numerator.nc, orientation);

        self.logterms.push(RegisteredLogterm {
            constraint,
            logterm,
            objective_handle: None,
        });
        Ok(())
    }

    /// The threshold the bound solver currently tests against.
    pub fn threshold(&self) -> f64 {
        self.gamma
    }

    pub fn statistics(&self) -> &ReformulationStatistics {
        &self.statistics
    }

    pub fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.statistics.log(statistic_logger);
    }

    /// The optimal convex variables of the last evaluated point, or `None` if that point was
    /// infeasible.
    pub fn last_c_solution(&self) -> Option<&[f64]> {
        self.last_c_solution.as_deref()
    }

    /// Checks the model and loads it into both solvers. Has to be called before a search.
    pub fn prepare(&mut self) -> Result<(), ModelError> {
        let objective = self.objective.clone().ok_or(ModelError::ObjectiveUnset)?;
        if let Some(index) = self.constraints.iter().position(Option::is_none) {
            return Err(ModelError::ConstraintUndefined(index));
        }
        self.envelope = self.envelope_corner()?;

        let num_constraints = self.constraints.len();
        self.bound_solver
            .reset(self.nc_dimension, self.c_dimension, num_constraints + 1);
        self.objective_solver.reset(self.c_dimension, num_constraints);

        for index in 0..self.c_dimension {
            self.bound_solver
                .set_c_bounds(index, self.c_lb[index], self.c_ub[index]);
            self.objective_solver
                .set_c_bounds(index, self.c_lb[index], self.c_ub[index]);
        }

        // Vacuous until the first threshold is set.
        self.bound_solver.set_row(
            0,
            &vec![0.0; self.nc_dimension],
            &vec![0.0; self.c_dimension],
            BoundType::Upper,
            f64::INFINITY,
        );
        for (index, constraint) in self.constraints.iter().flatten().enumerate() {
            self.bound_solver.set_row(
                index + 1,
                &constraint.nc,
                &constraint.c,
                constraint.bound_type,
                constraint.rhs,
            );
            self.objective_solver.set_row(
                index,
                &constraint.c,
                constraint.bound_type,
                constraint.rhs,
            );
        }

        for registered in &mut self.logterms {
            let sign = registered.logterm.sign.value();
            let numerator = &registered.logterm.numerator;
            // The bound side never changes the constant, so its handle is not kept.
            let _ = self.bound_solver.set_log_term(
                registered.constraint + 1,
                sign,
                &numerator.nc,
                &numerator.c,
                numerator.constant,
            )?;
            registered.objective_handle = if numerator.has_c() {
                Some(self.objective_solver.set_log_term(
                    registered.constraint,
                    sign,
                    &numerator.c,
                    numerator.constant,
                )?)
            } else {
                None
            };
        }

        self.objective_solver.set_objective(
            &objective.numerator.c,
            objective
                .denominator
                .as_ref()
                .map(|denominator| denominator.c.as_slice()),
        );
        self.last_c_solution = None;
        Ok(())
    }

    /// The corner every envelope denominator is evaluated at, if there are any envelopes.
    fn envelope_corner(&self) -> Result<Option<EnvelopeCorner>, ModelError> {
        let mut agreed = None;
        for registered in self.logterms.iter().filter(|l| l.logterm.has_envelope()) {
            let bound_type = self.bound_type(registered.constraint);
            let corner = if registered.orientation(bound_type) > 0.0 {
                EnvelopeCorner::Upper
            } else {
                EnvelopeCorner::Lower
            };
            match agreed {
                Some(previous) if previous != corner => {
                    return Err(ModelError::ContradictoryEnvelope(registered.constraint))
                }
                _ => agreed = Some(corner),
            }
        }
        Ok(agreed)
    }

    fn bound_type(&self, constraint: usize) -> BoundType {
        self.constraints[constraint]
            .as_ref()
            .map_or(BoundType::Upper, |constraint| constraint.bound_type)
    }

    fn check_expression(
        &self,
        kind: &'static str,
        expression: &LinearExpression,
    ) -> Result<(), ModelError> {
        check_dimension(kind, self.nc_dimension, expression.nc.len())?;
        check_dimension(kind, self.c_dimension, expression.c.len())
    }

    /// The right-hand sides of the bound solver rows over the box, or `None` if an envelope shows
    /// that no point of the box satisfies a constraint.
    fn relaxed_right_hand_sides(&self, lb: &[f64], ub: &[f64]) -> Option<Vec<f64>> {
        let mut rhs = self
            .constraints
            .iter()
            .flatten()
            .map(|constraint| constraint.rhs)
            .collect::<Vec<_>>();

        for registered in &self.logterms {
            let bound_type = self.bound_type(registered.constraint);
            let orientation = registered.orientation(bound_type);
            let corner = if orientation > 0.0 { ub } else { lb };
            let denominator = registered.logterm.denominator_at(corner);
            let row_rhs = &mut rhs[registered.constraint];

            if denominator > 0.0 {
                *row_rhs += registered.logterm.sign.value() * denominator.ln();
            } else if orientation > 0.0 {
                // The denominator is not positive anywhere in the box.
                return None;
            } else {
                *row_rhs = bound_type.direction() * f64::INFINITY;
            }
        }
        Some(rhs)
    }

    fn reference_corner(&self, region: &Region) -> ReferenceCorner {
        match self.envelope {
            Some(EnvelopeCorner::Upper) => ReferenceCorner::PointsAtUpperBound,
            Some(EnvelopeCorner::Lower) => ReferenceCorner::PointsAtLowerBound,
            None => {
                let distance = |corner: &[f64]| {
                    region
                        .candidate()
                        .iter()
                        .zip(corner)
                        .map(|(x, y)| (x - y).abs())
                        .fold(0.0, f64::max)
                };
                if distance(region.lower_bounds()) >= distance(region.upper_bounds()) {
                    ReferenceCorner::PointsAtLowerBound
                } else {
                    ReferenceCorner::PointsAtUpperBound
                }
            }
        }
    }
}

impl<Bound: BoundSolver, Objectives: ObjectiveSolver> BoundingProblem
    for Reformulation<Bound, Objectives>
{
    fn dimension(&self) -> usize {
        self.nc_dimension
    }

    fn set_threshold(&mut self, gamma: f64) {
        let Some(objective) = &self.objective else {
            return;
        };
        self.gamma = gamma;

        if gamma == f64::NEG_INFINITY {
            // Every point beats the threshold.
            self.bound_solver.set_row(
                0,
                &vec![0.0; self.nc_dimension],
                &vec![0.0; self.c_dimension],
                BoundType::Upper,
                f64::INFINITY,
            );
            return;
        }

        let numerator = &objective.numerator;
        let (denominator_nc, denominator_c, denominator_constant) = match &objective.denominator {
            Some(denominator) => (
                denominator.nc.clone(),
                denominator.c.clone(),
                denominator.constant,
            ),
            None => (
                vec![0.0; self.nc_dimension],
                vec![0.0; self.c_dimension],
                1.0,
            ),
        };

        // gamma * D - N <= 0
        let nc = denominator_nc
            .iter()
            .zip(&numerator.nc)
            .map(|(d, n)| gamma * d - n)
            .collect::<Vec<_>>();
        let c = denominator_c
            .iter()
            .zip(&numerator.c)
            .map(|(d, n)| gamma * d - n)
            .collect::<Vec<_>>();
        let rhs = numerator.constant - gamma * denominator_constant;
        self.bound_solver
            .set_row(0, &nc, &c, BoundType::Upper, rhs);
    }

    fn bound(&mut self, region: &mut Region) {
        for (index, (&lb, &ub)) in region
            .lower_bounds()
            .iter()
            .zip(region.upper_bounds())
            .enumerate()
        {
            self.bound_solver.set_nc_bounds(index, lb, ub);
        }

        let Some(rhs) = self.relaxed_right_hand_sides(region.lower_bounds(), region.upper_bounds())
        else {
            region.record_bound(f64::INFINITY, ReferenceCorner::None);
            return;
        };
        for (index, &row_rhs) in rhs.iter().enumerate() {
            self.bound_solver.set_row_bound(index + 1, row_rhs);
        }

        self.statistics.bound_solves += 1;
        if !self.bound_solver.solve() || self.bound_solver.objective().is_nan() {
            self.statistics.bound_failures += 1;
            debug!("Bounding failed, discarding the box");
            region.record_bound(f64::INFINITY, ReferenceCorner::None);
            return;
        }

        region
            .candidate_mut()
            .copy_from_slice(self.bound_solver.nc_solution());
        let corner = self.reference_corner(region);
        region.record_bound(self.bound_solver.objective(), corner);
    }

    fn evaluate(&mut self, point: &[f64]) -> Option<f64> {
        self.last_c_solution = None;
        let objective = self.objective.as_ref()?;
        self.statistics.objective_solves += 1;

        let mut rhs = self
            .constraints
            .iter()
            .flatten()
            .map(|constraint| constraint.rhs - dot(&constraint.nc, point))
            .collect::<Vec<_>>();

        for registered in &self.logterms {
            let logterm = &registered.logterm;
            let sign = logterm.sign.value();
            let denominator = logterm.denominator_at(point);
            let numerator_nc = logterm.numerator.evaluate_nc(point);
            let row_rhs = &mut rhs[registered.constraint];

            if denominator <= 0.0 {
                self.statistics.infeasible_points += 1;
                return None;
            }
            match registered.objective_handle {
                Some(handle) => {
                    self.objective_solver
                        .update_log_constant(handle, numerator_nc);
                    *row_rhs += sign * denominator.ln();
                }
                None => {
                    if numerator_nc <= 0.0 {
                        self.statistics.infeasible_points += 1;
                        return None;
                    }
                    *row_rhs -= sign * (numerator_nc.ln() - denominator.ln());
                }
            }
        }

        for (index, &row_rhs) in rhs.iter().enumerate() {
            self.objective_solver.set_row_bound(index, row_rhs);
        }
        let denominator = objective
            .denominator
            .as_ref()
            .map_or(1.0, |denominator| denominator.evaluate_nc(point));
        self.objective_solver
            .set_objective_constants(objective.numerator.evaluate_nc(point), denominator);

        if !self.objective_solver.solve() || self.objective_solver.objective().is_nan() {
            self.statistics.infeasible_points += 1;
            return None;
        }
        self.last_c_solution = Some(self.objective_solver.c_solution().to_vec());
        Some(self.objective_solver.objective())
    }
}

fn check_index(kind: &'static str, index: usize, size: usize) -> Result<(), ModelError> {
    if index < size {
        Ok(())
    } else {
        Err(ModelError::IndexOutOfRange { kind, index, size })
    }
}

fn check_dimension(kind: &'static str, expected: usize, actual: usize) -> Result<(), ModelError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ModelError::DimensionMismatch {
            kind,
            expected,
            actual,
        })
    }
}
