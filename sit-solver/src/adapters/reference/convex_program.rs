use itertools::Itertools;
use log::debug;
use microlp::ComparisonOp;
use microlp::OptimizationDirection;
use microlp::Problem;
use microlp::Variable;
use thiserror::Error;

use crate::adapters::BoundType;
use crate::adapters::LogHandle;
use crate::options::BackendOptions;

/// The argument of a logarithm is kept at least this far above zero.
const DOMAIN_MARGIN: f64 = 1e-9;
/// Tangents are never taken closer to zero than this.
const MIN_CUT_POINT: f64 = 1e-6;
/// Slack used when checking rows which do not contain any variable.
const CONSTANT_ROW_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProgramError {
    #[error("the program is infeasible")]
    Infeasible,
    #[error("the program is unbounded")]
    Unbounded,
    #[error("the linear programming solver failed: {0}")]
    Internal(String),
}

impl From<microlp::Error> for ProgramError {
    fn from(error: microlp::Error) -> Self {
        match error {
            microlp::Error::Infeasible => ProgramError::Infeasible,
            microlp::Error::Unbounded => ProgramError::Unbounded,
            microlp::Error::InternalError(message) => ProgramError::Internal(message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgramSolution {
    values: Vec<f64>,
    objective: f64,
    converged: bool,
}

impl ProgramSolution {
    pub fn value(&self, variable: usize) -> f64 {
        self.values[variable]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Whether every logarithm is approximated within the cut tolerance. An unconverged solution
    /// is optimal for an outer approximation of the program, so its objective is still a bound.
    pub fn is_converged(&self) -> bool {
        self.converged
    }
}

#[derive(Debug, Clone, Copy)]
struct ProgramVariable {
    objective: f64,
    lb: f64,
    ub: f64,
}

#[derive(Debug, Clone)]
struct ProgramRow {
    terms: Vec<(usize, f64)>,
    bound_type: BoundType,
    rhs: f64,
}

/// The hypograph `z <= log(argument . y + constant)`.
#[derive(Debug, Clone)]
struct Logarithm {
    epigraph: usize,
    argument: Vec<(usize, f64)>,
    constant: f64,
}

impl Logarithm {
    fn argument_at(&self, values: &[f64]) -> f64 {
        self.argument
            .iter()
            .map(|&(variable, coefficient)| coefficient * values[variable])
            .sum::<f64>()
            + self.constant
    }
}

/// A linear program extended with concave logarithms.
///
/// Every logarithm gets its own variable `z` with `z <= log(a . y + h)`; the variable can then be
/// used in rows like any other variable, as long as larger values of `z` never make a row harder
/// to satisfy. The hypographs are outer-approximated by tangents (Kelley's method) until the
/// solution of the linear program lies on every logarithm.
#[derive(Debug, Clone)]
pub struct ConvexProgram {
    direction: OptimizationDirection,
    variables: Vec<ProgramVariable>,
    rows: Vec<ProgramRow>,
    logarithms: Vec<Logarithm>,
}

impl ConvexProgram {
    pub fn minimise() -> Self {
        Self::new(OptimizationDirection::Minimize)
    }

    pub fn maximise() -> Self {
        Self::new(OptimizationDirection::Maximize)
    }

    fn new(direction: OptimizationDirection) -> Self {
        Self {
            direction,
            variables: vec![],
            rows: vec![],
            logarithms: vec![],
        }
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Adds a variable with the given objective coefficient; infinite bounds are allowed.
    pub fn add_variable(&mut self, objective: f64, lb: f64, ub: f64) -> usize {
        self.variables.push(ProgramVariable { objective, lb, ub });
        self.variables.len() - 1
    }

    pub fn add_row(&mut self, terms: Vec<(usize, f64)>, bound_type: BoundType, rhs: f64) {
        self.rows.push(ProgramRow {
            terms,
            bound_type,
            rhs,
        });
    }

    /// Adds a fresh variable bounded above by `log(argument . y + constant)`.
    pub fn add_logarithm(&mut self, argument: Vec<(usize, f64)>, constant: f64) -> LogHandle {
        let epigraph = self.add_variable(0.0, f64::NEG_INFINITY, f64::INFINITY);
        self.logarithms.push(Logarithm {
            epigraph,
            argument: merge_terms(&argument),
            constant,
        });
        LogHandle::new(self.logarithms.len() - 1)
    }

    /// The variable standing in for the logarithm.
    pub fn log_variable(&self, handle: LogHandle) -> usize {
        self.logarithms[handle.index()].epigraph
    }

    pub fn set_log_constant(&mut self, handle: LogHandle, constant: f64) {
        self.logarithms[handle.index()].constant = constant;
    }

    pub fn solve(&self, options: &BackendOptions) -> Result<ProgramSolution, ProgramError> {
        if self.variables.is_empty() {
            return self.solve_constant();
        }

        // A logarithm of a constant is a plain upper bound on its variable.
        let mut upper = self.variables.iter().map(|variable| variable.ub).collect_vec();
        for logarithm in self.logarithms.iter().filter(|log| log.argument.is_empty()) {
            if logarithm.constant <= 0.0 {
                return Err(ProgramError::Infeasible);
            }
            let bound = &mut upper[logarithm.epigraph];
            *bound = bound.min(logarithm.constant.ln());
        }

        let mut cuts = self
            .logarithms
            .iter()
            .map(|logarithm| {
                if logarithm.argument.is_empty() {
                    vec![]
                } else {
                    vec![self.initial_cut_point(logarithm)]
                }
            })
            .collect_vec();
        let mut num_cuts = 0;

        loop {
            let (problem, variables) = self.build(&upper, &cuts)?;
            let solution = problem.solve()?;
            let values = variables
                .iter()
                .map(|&variable| solution[variable])
                .collect_vec();

            let mut converged = true;
            let mut refined = false;
            for (logarithm, points) in self.logarithms.iter().zip(cuts.iter_mut()) {
                if logarithm.argument.is_empty() {
                    continue;
                }
                let argument = logarithm.argument_at(&values);
                let z = values[logarithm.epigraph];
                // Also catches a NaN logarithm of a non-positive argument.
                if !(z <= argument.ln() + options.cut_tolerance * (1.0 + z.abs())) {
                    converged = false;
                    if num_cuts < options.max_cuts {
                        points.push(argument.max(MIN_CUT_POINT));
                        num_cuts += 1;
                        refined = true;
                    }
                }
            }

            if converged || !refined {
                if !converged {
                    debug!("Cutting planes did not converge after {num_cuts} cuts");
                }
                return Ok(ProgramSolution {
                    objective: solution.objective(),
                    values,
                    converged,
                });
            }
        }
    }

    /// The tangent at the lower corner of the variables, moved to at least `1` so that the
    /// first cut has a moderate slope.
    fn initial_cut_point(&self, logarithm: &Logarithm) -> f64 {
        let corner = self
            .variables
            .iter()
            .map(|variable| if variable.lb.is_finite() { variable.lb } else { 0.0 })
            .collect_vec();
        logarithm.argument_at(&corner).max(1.0)
    }

    fn build(
        &self,
        upper: &[f64],
        cuts: &[Vec<f64>],
    ) -> Result<(Problem, Vec<Variable>), ProgramError> {
        let mut problem = Problem::new(self.direction);
        let mut variables = Vec::with_capacity(self.variables.len());
        for (variable, &ub) in self.variables.iter().zip(upper) {
            if variable.lb > ub {
                return Err(ProgramError::Infeasible);
            }
            variables.push(problem.add_var(variable.objective, (variable.lb, ub)));
        }

        for row in &self.rows {
            add_linear(
                &mut problem,
                &variables,
                &row.terms,
                row.bound_type,
                row.rhs,
            )?;
        }

        for (logarithm, points) in self.logarithms.iter().zip(cuts) {
            if logarithm.argument.is_empty() {
                continue;
            }
            add_linear(
                &mut problem,
                &variables,
                &logarithm.argument,
                BoundType::Lower,
                DOMAIN_MARGIN - logarithm.constant,
            )?;
            // z <= ln(p) - 1 + (a . y + h) / p
            for &point in points {
                let mut terms = vec![(logarithm.epigraph, 1.0)];
                terms.extend(
                    logarithm
                        .argument
                        .iter()
                        .map(|&(variable, coefficient)| (variable, -coefficient / point)),
                );
                let rhs = point.ln() - 1.0 + logarithm.constant / point;
                add_linear(&mut problem, &variables, &terms, BoundType::Upper, rhs)?;
            }
        }

        Ok((problem, variables))
    }

    fn solve_constant(&self) -> Result<ProgramSolution, ProgramError> {
        let satisfied = self.rows.iter().all(|row| {
            merge_terms(&row.terms).is_empty()
                && row
                    .bound_type
                    .is_satisfied(0.0, row.rhs, CONSTANT_ROW_TOLERANCE)
        });
        if satisfied {
            Ok(ProgramSolution {
                values: vec![],
                objective: 0.0,
                converged: true,
            })
        } else {
            Err(ProgramError::Infeasible)
        }
    }
}

/// Sums the coefficients of repeated variables and drops zero terms.
fn merge_terms(terms: &[(usize, f64)]) -> Vec<(usize, f64)> {
    terms
        .iter()
        .copied()
        .sorted_by_key(|&(variable, _)| variable)
        .coalesce(|left, right| {
            if left.0 == right.0 {
                Ok((left.0, left.1 + right.1))
            } else {
                Err((left, right))
            }
        })
        .filter(|&(_, coefficient)| coefficient != 0.0)
        .collect()
}

fn add_linear(
    problem: &mut Problem,
    variables: &[Variable],
    terms: &[(usize, f64)],
    bound_type: BoundType,
    rhs: f64,
) -> Result<(), ProgramError> {
    let terms = merge_terms(terms);
    if terms.is_empty() {
        return if bound_type.is_satisfied(0.0, rhs, CONSTANT_ROW_TOLERANCE) {
            Ok(())
        } else {
            Err(ProgramError::Infeasible)
        };
    }

    if rhs.is_infinite() {
        // Either the row is vacuous or it cannot be satisfied at all.
        let vacuous = matches!(
            (bound_type, rhs > 0.0),
            (BoundType::Upper, true) | (BoundType::Lower, false)
        );
        return if vacuous {
            Ok(())
        } else {
            Err(ProgramError::Infeasible)
        };
    }

    let operator = match bound_type {
        BoundType::Upper => ComparisonOp::Le,
        BoundType::Lower => ComparisonOp::Ge,
        BoundType::Fixed => ComparisonOp::Eq,
    };
    problem.add_constraint(
        terms
            .iter()
            .map(|&(variable, coefficient)| (variables[variable], coefficient)),
        operator,
        rhs,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_linear_program() {
        let mut program = ConvexProgram::maximise();
        let x = program.add_variable(1.0, 0.0, 10.0);
        let y = program.add_variable(2.0, 0.0, 3.0);
        program.add_row(vec![(x, 1.0), (y, 1.0)], BoundType::Upper, 4.0);

        let solution = program.solve(&BackendOptions::default()).unwrap();
        assert!((solution.objective() - 7.0).abs() < 1e-9);
        assert!((solution.value(x) - 1.0).abs() < 1e-9);
        assert!(solution.is_converged());
    }

    #[test]
    fn repeated_variables_are_merged() {
        let mut program = ConvexProgram::maximise();
        let x = program.add_variable(1.0, 0.0, 10.0);
        program.add_row(vec![(x, 1.0), (x, 1.0)], BoundType::Upper, 4.0);

        let solution = program.solve(&BackendOptions::default()).unwrap();
        assert!((solution.value(x) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn logarithm_is_approximated_by_cuts() {
        // min y s.t. log(1 + y) >= 1
        let mut program = ConvexProgram::minimise();
        let y = program.add_variable(1.0, 0.0, f64::INFINITY);
        let log = program.add_logarithm(vec![(y, 1.0)], 1.0);
        let z = program.log_variable(log);
        program.add_row(vec![(z, 1.0)], BoundType::Lower, 1.0);

        let solution = program.solve(&BackendOptions::default()).unwrap();
        assert!(solution.is_converged());
        assert!((solution.value(y) - (std::f64::consts::E - 1.0)).abs() < 1e-6);
    }

    #[test]
    fn log_constant_can_be_updated() {
        // min y s.t. log(y + h) >= 0
        let mut program = ConvexProgram::minimise();
        let y = program.add_variable(1.0, 0.0, 10.0);
        let log = program.add_logarithm(vec![(y, 1.0)], 0.5);
        let z = program.log_variable(log);
        program.add_row(vec![(z, 1.0)], BoundType::Lower, 0.0);

        let solution = program.solve(&BackendOptions::default()).unwrap();
        assert!((solution.value(y) - 0.5).abs() < 1e-6);

        program.set_log_constant(log, 2.0);
        let solution = program.solve(&BackendOptions::default()).unwrap();
        assert!(solution.value(y).abs() < 1e-9);
    }

    #[test]
    fn logarithm_of_a_constant_bounds_its_variable() {
        let mut program = ConvexProgram::maximise();
        let log = program.add_logarithm(vec![], std::f64::consts::E);
        let z = program.log_variable(log);
        let w = program.add_variable(1.0, 0.0, 5.0);
        program.add_row(vec![(w, 1.0), (z, -1.0)], BoundType::Upper, 0.0);

        let solution = program.solve(&BackendOptions::default()).unwrap();
        assert!((solution.value(w) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn contradicting_rows_are_infeasible() {
        let mut program = ConvexProgram::minimise();
        let x = program.add_variable(1.0, 0.0, 2.0);
        program.add_row(vec![(x, 1.0)], BoundType::Lower, 5.0);

        assert_eq!(
            program.solve(&BackendOptions::default()).unwrap_err(),
            ProgramError::Infeasible
        );
    }

    #[test]
    fn rows_without_variables_are_checked_directly() {
        let mut program = ConvexProgram::minimise();
        program.add_row(vec![], BoundType::Upper, 1.0);
        assert!(program.solve(&BackendOptions::default()).is_ok());

        program.add_row(vec![], BoundType::Lower, 1.0);
        assert_eq!(
            program.solve(&BackendOptions::default()).unwrap_err(),
            ProgramError::Infeasible
        );
    }
}
