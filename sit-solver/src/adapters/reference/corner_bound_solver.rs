use itertools::Itertools;
use log::debug;

use super::rows::add_log_epigraph;
use super::rows::check_convexity;
use super::rows::push_c_terms;
use super::rows::relaxed_log;
use super::rows::LogTerm;
use super::rows::Row;
use super::ConvexProgram;
use super::ProgramError;
use crate::adapters::BoundSolver;
use crate::adapters::BoundType;
use crate::adapters::LogHandle;
use crate::basic_types::ModelError;
use crate::options::BackendOptions;
use crate::sit_assert_simple;

/// A [`BoundSolver`] which relaxes every term of the non-convex variables separately.
///
/// Linear terms and logarithms without convex variables are replaced by their smallest value
/// over the box, which is attained at a corner. A logarithm which also contains convex variables
/// is kept, with its non-convex part fixed at the corner maximising it, and handled by a
/// [`ConvexProgram`]. The result never exceeds the minimal violation over the box.
#[derive(Debug, Clone)]
pub struct CornerBoundSolver {
    options: BackendOptions,
    nc_lb: Vec<f64>,
    nc_ub: Vec<f64>,
    c_lb: Vec<f64>,
    c_ub: Vec<Option<f64>>,
    rows: Vec<Row>,
    log_terms: Vec<LogTerm>,
    objective: f64,
    nc_solution: Vec<f64>,
}

/// One orientation of a row after the non-convex variables have been relaxed:
/// `c . y + sum(coefficient * log(c_log . y + constant)) <= rhs`.
struct RelaxedRow {
    is_objective_row: bool,
    c: Vec<f64>,
    logs: Vec<(f64, Vec<f64>, f64)>,
    rhs: f64,
}

enum Relaxation {
    Vacuous,
    Impossible,
    Row(RelaxedRow),
}

impl Default for CornerBoundSolver {
    fn default() -> Self {
        Self::new(BackendOptions::default())
    }
}

impl CornerBoundSolver {
    pub fn new(options: BackendOptions) -> Self {
        Self {
            options,
            nc_lb: vec![],
            nc_ub: vec![],
            c_lb: vec![],
            c_ub: vec![],
            rows: vec![],
            log_terms: vec![],
            objective: f64::NAN,
            nc_solution: vec![],
        }
    }

    fn relax(&self, row_index: usize, orientation: f64) -> Relaxation {
        let row = &self.rows[row_index];
        let oriented_rhs = orientation * row.rhs;
        if oriented_rhs == f64::INFINITY {
            return Relaxation::Vacuous;
        }

        let mut constant = 0.0;
        for (j, &coefficient) in row.nc.iter().enumerate() {
            let coefficient = orientation * coefficient;
            if coefficient != 0.0 {
                let corner = if coefficient >= 0.0 {
                    self.nc_lb[j]
                } else {
                    self.nc_ub[j]
                };
                constant += coefficient * corner;
            }
        }

        let mut logs = vec![];
        for &index in &row.log_terms {
            let term = &self.log_terms[index];
            let coefficient = orientation * term.coefficient;
            if term.depends_on_c() {
                // The argument is made as large as possible; the term is non-increasing in it.
                let shift = self.corner_value(&term.nc, |nc| coefficient * nc < 0.0);
                logs.push((coefficient, term.c.clone(), term.constant + shift));
            } else {
                let argument =
                    term.constant + self.corner_value(&term.nc, |nc| coefficient * nc <= 0.0);
                constant += relaxed_log(coefficient, argument);
            }
        }

        if constant == f64::NEG_INFINITY {
            Relaxation::Vacuous
        } else if constant == f64::INFINITY || oriented_rhs == f64::NEG_INFINITY {
            Relaxation::Impossible
        } else {
            Relaxation::Row(RelaxedRow {
                is_objective_row: row_index == 0,
                c: row.c.iter().map(|&value| orientation * value).collect(),
                logs,
                rhs: oriented_rhs - constant,
            })
        }
    }

    /// `nc . x` where `x_j` is the upper bound when `take_upper(nc_j)` holds and the lower bound
    /// otherwise.
    fn corner_value(&self, nc: &[f64], take_upper: impl Fn(f64) -> bool) -> f64 {
        nc.iter()
            .enumerate()
            .filter(|&(_, &coefficient)| coefficient != 0.0)
            .map(|(j, &coefficient)| {
                let corner = if take_upper(coefficient) {
                    self.nc_ub[j]
                } else {
                    self.nc_lb[j]
                };
                coefficient * corner
            })
            .sum()
    }

    fn relaxed_rows(&self) -> Option<Vec<RelaxedRow>> {
        let mut relaxed = vec![];
        for (index, row) in self.rows.iter().enumerate() {
            for &orientation in row.bound_type.orientations() {
                match self.relax(index, orientation) {
                    Relaxation::Vacuous => {}
                    Relaxation::Impossible => return None,
                    Relaxation::Row(row) => relaxed.push(row),
                }
            }
        }
        Some(relaxed)
    }

    /// Without convex variables every relaxed row is a comparison of constants.
    fn solve_constant(&self, rows: &[RelaxedRow]) -> f64 {
        if rows
            .iter()
            .any(|row| row.is_objective_row && row.rhs < 0.0)
        {
            return f64::INFINITY;
        }
        rows.iter()
            .filter(|row| !row.is_objective_row)
            .map(|row| -row.rhs)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn solve_program(&self, rows: &[RelaxedRow]) -> Result<f64, ProgramError> {
        let has_soft_rows = rows.iter().any(|row| !row.is_objective_row);

        let mut program = ConvexProgram::minimise();
        let variables = self
            .c_lb
            .iter()
            .zip(&self.c_ub)
            .map(|(&lb, &ub)| program.add_variable(0.0, lb, ub.unwrap_or(f64::INFINITY)))
            .collect_vec();
        let slack = if has_soft_rows {
            program.add_variable(1.0, f64::NEG_INFINITY, f64::INFINITY)
        } else {
            program.add_variable(0.0, 0.0, 0.0)
        };

        for row in rows {
            let mut terms = vec![];
            push_c_terms(&mut terms, &variables, &row.c, 1.0);
            for (coefficient, c, constant) in &row.logs {
                let handle = add_log_epigraph(&mut program, &variables, c, *constant);
                terms.push((program.log_variable(handle), *coefficient));
            }
            if !row.is_objective_row {
                terms.push((slack, -1.0));
            }
            program.add_row(terms, BoundType::Upper, row.rhs);
        }

        let solution = match program.solve(&self.options) {
            Ok(solution) => solution,
            Err(ProgramError::Unbounded) => return Ok(f64::NEG_INFINITY),
            Err(ProgramError::Infeasible) => return Ok(f64::INFINITY),
            Err(error) => return Err(error),
        };
        if !solution.is_converged() {
            debug!("Using the outer approximation as bound");
        }

        Ok(if has_soft_rows {
            solution.value(slack)
        } else {
            f64::NEG_INFINITY
        })
    }
}

impl BoundSolver for CornerBoundSolver {
    fn reset(&mut self, nc_dimension: usize, c_dimension: usize, num_rows: usize) {
        self.nc_lb = vec![0.0; nc_dimension];
        self.nc_ub = vec![0.0; nc_dimension];
        self.c_lb = vec![0.0; c_dimension];
        self.c_ub = vec![None; c_dimension];
        self.rows = (0..num_rows)
            .map(|_| Row::empty(nc_dimension, c_dimension))
            .collect();
        self.log_terms.clear();
        self.objective = f64::NAN;
        self.nc_solution = vec![0.0; nc_dimension];
    }

    fn set_nc_bounds(&mut self, index: usize, lb: f64, ub: f64) {
        self.nc_lb[index] = lb;
        self.nc_ub[index] = ub;
    }

    fn set_c_bounds(&mut self, index: usize, lb: f64, ub: Option<f64>) {
        self.c_lb[index] = lb;
        self.c_ub[index] = ub;
    }

    fn set_row(&mut self, row: usize, nc: &[f64], c: &[f64], bound_type: BoundType, rhs: f64) {
        sit_assert_simple!(nc.len() == self.nc_lb.len() && c.len() == self.c_lb.len());
        let row = &mut self.rows[row];
        row.nc.copy_from_slice(nc);
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
        nc: &[f64],
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
            nc: nc.to_vec(),
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

    fn solve(&mut self) -> bool {
        // The candidate is the corner the objective row prefers.
        if let Some(objective_row) = self.rows.first() {
            for (j, &coefficient) in objective_row.nc.iter().enumerate() {
                self.nc_solution[j] = if coefficient <= 0.0 {
                    self.nc_ub[j]
                } else {
                    self.nc_lb[j]
                };
            }
        }

        let Some(rows) = self.relaxed_rows() else {
            self.objective = f64::INFINITY;
            return true;
        };

        if self.c_lb.is_empty() {
            self.objective = self.solve_constant(&rows);
            return true;
        }

        match self.solve_program(&rows) {
            Ok(objective) => {
                self.objective = objective;
                true
            }
            Err(error) => {
                debug!("Bounding failed: {error}");
                self.objective = f64::NAN;
                false
            }
        }
    }

    fn objective(&self) -> f64 {
        self.objective
    }

    fn nc_solution(&self) -> &[f64] {
        &self.nc_solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One non-convex variable on `[lb, ub]`, no convex variables; row 1 is `x <= 2`.
    fn linear_solver(lb: f64, ub: f64) -> CornerBoundSolver {
        let mut solver = CornerBoundSolver::default();
        solver.reset(1, 0, 2);
        solver.set_nc_bounds(0, lb, ub);
        // objective row: 1 - x <= 0, i.e. x >= 1
        solver.set_row(0, &[-1.0], &[], BoundType::Upper, -1.0);
        solver.set_row(1, &[1.0], &[], BoundType::Upper, 2.0);
        solver
    }

    #[test]
    fn violation_is_measured_at_the_best_corner() {
        let mut solver = linear_solver(3.0, 5.0);
        assert!(solver.solve());
        assert_eq!(solver.objective(), 1.0);
        assert_eq!(solver.nc_solution(), &[5.0]);

        let mut solver = linear_solver(0.0, 5.0);
        assert!(solver.solve());
        assert_eq!(solver.objective(), -2.0);
    }

    #[test]
    fn objective_row_must_hold() {
        let mut solver = linear_solver(0.0, 0.5);
        assert!(solver.solve());
        assert_eq!(solver.objective(), f64::INFINITY);
    }

    #[test]
    fn disabled_rows_are_skipped() {
        let mut solver = linear_solver(0.0, 5.0);
        solver.set_row_bound(1, f64::INFINITY);
        assert!(solver.solve());
        assert_eq!(solver.objective(), f64::NEG_INFINITY);
    }

    #[test]
    fn equality_rows_are_checked_in_both_directions() {
        let mut solver = linear_solver(3.0, 5.0);
        solver.set_row(1, &[1.0], &[], BoundType::Fixed, 4.0);
        assert!(solver.solve());
        assert_eq!(solver.objective(), -1.0);
    }

    #[test]
    fn logarithm_of_non_convex_variables_is_relaxed() {
        // log(1 + x) <= 2 on [0, 10] holds with a margin of 2 at x = 0
        let mut solver = linear_solver(0.0, 10.0);
        solver.set_row(1, &[0.0], &[], BoundType::Upper, 2.0);
        let _ = solver.set_log_term(1, 1.0, &[1.0], &[], 1.0).unwrap();
        assert!(solver.solve());
        assert_eq!(solver.objective(), -2.0);

        // on [8, 10] the margin shrinks to 2 - ln(9)
        solver.set_nc_bounds(0, 8.0, 10.0);
        assert!(solver.solve());
        assert!((solver.objective() - (9.0_f64.ln() - 2.0)).abs() < 1e-12);
    }

    #[test]
    fn logarithm_of_convex_variables_uses_cutting_planes() {
        // p - log(1 + r) <= 0 with p in [1, 2], r in [0, 10]
        let mut solver = CornerBoundSolver::default();
        solver.reset(1, 1, 2);
        solver.set_nc_bounds(0, 1.0, 2.0);
        solver.set_c_bounds(0, 0.0, Some(10.0));
        solver.set_row(0, &[0.0], &[0.0], BoundType::Upper, 0.0);
        solver.set_row(1, &[1.0], &[0.0], BoundType::Upper, 0.0);
        let _ = solver.set_log_term(1, -1.0, &[0.0], &[1.0], 1.0).unwrap();

        assert!(solver.solve());
        assert!((solver.objective() - (1.0 - 11.0_f64.ln())).abs() < 1e-6);
    }

    #[test]
    fn concave_logarithm_in_a_lower_row_is_rejected() {
        let mut solver = CornerBoundSolver::default();
        solver.reset(1, 1, 2);
        solver.set_row(1, &[0.0], &[0.0], BoundType::Lower, 0.0);
        assert_eq!(
            solver.set_log_term(1, -1.0, &[0.0], &[1.0], 1.0),
            Err(ModelError::NonConvexLogterm(1))
        );

        solver.set_row(1, &[0.0], &[0.0], BoundType::Fixed, 0.0);
        assert_eq!(
            solver.set_log_term(1, 1.0, &[0.0], &[1.0], 1.0),
            Err(ModelError::NonConvexLogterm(1))
        );
    }
}
