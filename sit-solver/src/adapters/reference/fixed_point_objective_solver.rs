use itertools::Itertools;
use log::debug;

use super::rows::add_log_epigraph;
use super::rows::check_convexity;
use super::rows::push_c_terms;
use super::rows::LogTerm;
use super::rows::Row;
use super::ConvexProgram;
use crate::adapters::BoundType;
use crate::adapters::LogHandle;
use crate::adapters::ObjectiveSolver;
use crate::basic_types::ModelError;
use crate::options::BackendOptions;

/// An [`ObjectiveSolver`] over a [`ConvexProgram`].
///
/// A linear objective is maximised directly. A ratio whose denominator depends on the convex
/// variables is maximised with Dinkelbach's method: `max N(y) - lambda D(y)` is solved for the
/// ratio `lambda` of the previous solution until the auxiliary optimum vanishes.
#[derive(Debug, Clone)]
pub struct FixedPointObjectiveSolver {
    options: BackendOptions,
    c_lb: Vec<f64>,
    c_ub: Vec<Option<f64>>,
    rows: Vec<Row>,
    log_terms: Vec<LogTerm>,
    numerator: Vec<f64>,
    denominator: Option<Vec<f64>>,
    numerator_constant: f64,
    denominator_constant: f64,
    objective: f64,
    c_solution: Vec<f64>,
}

impl Default for FixedPointObjectiveSolver {
    fn default() -> Self {
        Self::new(BackendOptions::default())
    }
}

impl FixedPointObjectiveSolver {
    pub fn new(options: BackendOptions) -> Self {
        Self {
            options,
            c_lb: vec![],
            c_ub: vec![],
            rows: vec![],
            log_terms: vec![],
            numerator: vec![],
            denominator: None,
            numerator_constant: 0.0,
            denominator_constant: 1.0,
            objective: f64::NAN,
            c_solution: vec![],
        }
    }

    fn numerator_at(&self, y: &[f64]) -> f64 {
        dot(&self.numerator, y) + self.numerator_constant
    }

    fn denominator_at(&self, y: &[f64]) -> f64 {
        self.denominator
            .as_ref()
            .map_or(0.0, |denominator| dot(denominator, y))
            + self.denominator_constant
    }

    /// Maximises `weights . y` subject to the rows; `None` when that is impossible.
    fn maximise(&self, weights: &[f64]) -> Option<Vec<f64>> {
        let mut program = ConvexProgram::maximise();
        let variables = self
            .c_lb
            .iter()
            .zip(&self.c_ub)
            .zip(weights)
            .map(|((&lb, &ub), &weight)| {
                program.add_variable(weight, lb, ub.unwrap_or(f64::INFINITY))
            })
            .collect_vec();

        for row in &self.rows {
            let mut terms = vec![];
            push_c_terms(&mut terms, &variables, &row.c, 1.0);
            for &index in &row.log_terms {
                let term = &self.log_terms[index];
                let handle = add_log_epigraph(&mut program, &variables, &term.c, term.constant);
                terms.push((program.log_variable(handle), term.coefficient));
            }
            program.add_row(terms, row.bound_type, row.rhs);
        }

        match program.solve(&self.options) {
            Ok(solution) if solution.is_converged() => {
                Some(variables.iter().map(|&v| solution.value(v)).collect())
            }
            Ok(_) => {
                debug!("Cutting planes did not converge at the fixed point");
                None
            }
            Err(error) => {
                debug!("Objective subproblem failed: {error}");
                None
            }
        }
    }

    /// Without convex variables the rows only contain constants.
    fn rows_hold(&self) -> bool {
        self.rows.iter().all(|row| {
            let mut lhs = 0.0;
            for &index in &row.log_terms {
                let term = &self.log_terms[index];
                if term.constant <= 0.0 {
                    return false;
                }
                lhs += term.coefficient * term.constant.ln();
            }
            row.bound_type
                .is_satisfied(lhs, row.rhs, self.options.feasibility_tolerance)
        })
    }

    fn ratio(&self, y: &[f64]) -> Option<f64> {
        let denominator = self.denominator_at(y);
        if denominator > 0.0 {
            Some(self.numerator_at(y) / denominator)
        } else {
            None
        }
    }

    fn solve_ratio(&self) -> Option<(f64, Vec<f64>)> {
        let Some(denominator) = self.denominator.as_ref() else {
            let y = self.maximise(&self.numerator)?;
            return Some((self.ratio(&y)?, y));
        };

        let mut y = self.maximise(&self.numerator)?;
        let mut lambda = self.ratio(&y)?;
        for _ in 0..self.options.dinkelbach_max_iterations {
            let weights = self
                .numerator
                .iter()
                .zip(denominator)
                .map(|(&n, &d)| n - lambda * d)
                .collect_vec();
            y = self.maximise(&weights)?;

            let auxiliary = self.numerator_at(&y) - lambda * self.denominator_at(&y);
            if auxiliary.abs() < self.options.dinkelbach_tolerance {
                return Some((self.ratio(&y)?, y));
            }
            lambda = self.ratio(&y)?;
        }

        debug!("Dinkelbach iteration stopped at its iteration limit");
        Some((self.ratio(&y)?, y))
    }
}

fn dot(coefficients: &[f64], values: &[f64]) -> f64 {
    coefficients
        .iter()
        .zip(values)
        .map(|(coefficient, value)| coefficient * value)
        .sum()
}

impl ObjectiveSolver for FixedPointObjectiveSolver {
    fn reset(&mut self, c_dimension: usize, num_rows: usize) {
        self.c_lb = vec![0.0; c_dimension];
        self.c_ub = vec![None; c_dimension];
        self.rows = (0..num_rows).map(|_| Row::empty(0, c_dimension)).collect();
        self.log_terms.clear();
        self.numerator = vec![0.0; c_dimension];
        self.denominator = None;
        self.numerator_constant = 0.0;
        self.denominator_constant = 1.0;
        self.objective = f64::NAN;
        self.c_solution = vec![0.0; c_dimension];
    }

    fn set_c_bounds(&mut self, index: usize, lb: f64, ub: Option<f64>) {
        self.c_lb[index] = lb;
        self.c_ub[index] = ub;
    }

    fn set_row(&mut self, row: usize, c: &[f64], bound_type: BoundType, rhs: f64) {
        let row = &mut self.rows[row];
        row.c.copy_from_slice(c);
        row.bound_type = bound_type;
        row.rhs = rhs;
    }

    fn set_row_bound(&mut self, row: usize, rhs: f64) {
        self.rows[row].rhs = rhs;
    }

    fn set_log_term(
        &mut self,
        row: usize,
        coefficient: f64,
        c: &[f64],
        constant: f64,
    ) -> Result<LogHandle, ModelError> {
        if row >= self.rows.len() {
            return Err(ModelError::IndexOutOfRange {
                kind: "row",
                index: row,
                size: self.rows.len(),
            });
        }
        let term = LogTerm {
            coefficient,
            nc: vec![],
            c: c.to_vec(),
            constant,
        };
        check_convexity(row, self.rows[row].bound_type, &term)?;

        self.log_terms.push(term);
        self.rows[row].log_terms.push(self.log_terms.len() - 1);
        Ok(LogHandle::new(self.log_terms.len() - 1))
    }

    fn update_log_constant(&mut self, handle: LogHandle, constant: f64) {
        self.log_terms[handle.index()].constant = constant;
    }

    fn set_objective(&mut self, numerator: &[f64], denominator: Option<&[f64]>) {
        self.numerator = numerator.to_vec();
        self.denominator = denominator
            .filter(|denominator| denominator.iter().any(|&value| value != 0.0))
            .map(<[f64]>::to_vec);
    }

    fn set_objective_constants(&mut self, numerator: f64, denominator: f64) {
        self.numerator_constant = numerator;
        self.denominator_constant = denominator;
    }

    fn solve(&mut self) -> bool {
        self.objective = f64::NAN;

        if self.c_lb.is_empty() {
            if !self.rows_hold() {
                return false;
            }
            return match self.ratio(&[]) {
                Some(objective) => {
                    self.objective = objective;
                    true
                }
                None => false,
            };
        }

        match self.solve_ratio() {
            Some((objective, y)) => {
                self.objective = objective;
                self.c_solution = y;
                true
            }
            None => false,
        }
    }

    fn objective(&self) -> f64 {
        self.objective
    }

    fn c_solution(&self) -> &[f64] {
        &self.c_solution
    }
}
