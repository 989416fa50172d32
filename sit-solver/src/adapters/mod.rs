//! The contract between the bounding reformulation and a convex subproblem solver.
//!
//! Two roles are needed. A [`BoundSolver`] works on a box of the non-convex variables together
//! with the convex variables and minimises the constraint violation; row `0` of its model is the
//! objective row, which must hold exactly, and every other row may be violated by a common slack.
//! An [`ObjectiveSolver`] works on the convex variables alone, with the non-convex variables fixed
//! by the caller, and maximises the objective.
//!
//! Adapters are stateful: their model is mutated in place between solves and they are never
//! called concurrently.
pub mod reference;

use crate::basic_types::ModelError;

/// The relation between the left-hand side and the right-hand side of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundType {
    /// `lhs <= rhs`
    Upper,
    /// `lhs >= rhs`
    Lower,
    /// `lhs == rhs`
    Fixed,
}

impl BoundType {
    /// The signs which turn the row into `sign * lhs <= sign * rhs` rows.
    pub fn orientations(self) -> &'static [f64] {
        match self {
            BoundType::Upper => &[1.0],
            BoundType::Lower => &[-1.0],
            BoundType::Fixed => &[1.0, -1.0],
        }
    }

    /// The direction in which the left-hand side is limited; equality rows count as `<=`.
    pub fn direction(self) -> f64 {
        match self {
            BoundType::Upper | BoundType::Fixed => 1.0,
            BoundType::Lower => -1.0,
        }
    }

    /// Whether `lhs <op> rhs` holds up to `tolerance`.
    pub fn is_satisfied(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            BoundType::Upper => lhs <= rhs + tolerance,
            BoundType::Lower => lhs >= rhs - tolerance,
            BoundType::Fixed => (lhs - rhs).abs() <= tolerance,
        }
    }
}

/// Refers to a logarithm registered with an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogHandle(usize);

impl LogHandle {
    pub fn new(index: usize) -> Self {
        LogHandle(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Computes bounds over a box of the non-convex variables.
///
/// The solver minimises a slack `t` subject to `lhs_r - t <op> rhs_r` for every row `r > 0` and
/// `lhs_0 <= rhs_0` for the objective row. The reported objective is the optimal `t`, or `-inf`
/// when no row limits it. Any relaxation of the non-convex variables over their box is allowed,
/// as long as the reported value never exceeds the exact minimum.
pub trait BoundSolver {
    /// Discards the model and prepares an empty one of the given size.
    fn reset(&mut self, nc_dimension: usize, c_dimension: usize, num_rows: usize);

    fn set_nc_bounds(&mut self, index: usize, lb: f64, ub: f64);

    /// Sets the range of a convex variable; `None` leaves it unbounded above.
    fn set_c_bounds(&mut self, index: usize, lb: f64, ub: Option<f64>);

    /// Overwrites the linear part, the relation and the right-hand side of a row.
    fn set_row(&mut self, row: usize, nc: &[f64], c: &[f64], bound_type: BoundType, rhs: f64);

    /// Overwrites the right-hand side of a row. An infinite value in the limited direction of
    /// the row disables it.
    fn set_row_bound(&mut self, row: usize, rhs: f64);

    /// Adds `coefficient * log(nc . x + c . y + constant)` to the left-hand side of a row.
    fn set_log_term(
        &mut self,
        row: usize,
        coefficient: f64,
        nc: &[f64],
        c: &[f64],
        constant: f64,
    ) -> Result<LogHandle, ModelError>;

    fn update_log_constant(&mut self, handle: LogHandle, constant: f64);

    /// Returns whether a bound was found.
    fn solve(&mut self) -> bool;

    fn objective(&self) -> f64;

    /// The point of the box at which the relaxation is attained.
    fn nc_solution(&self) -> &[f64];
}

/// Optimises the objective over the convex variables for a fixed non-convex point.
///
/// The objective is `(numerator . y + n) / (denominator . y + d)` where the constants `n` and `d`
/// carry the contribution of the fixed point.
pub trait ObjectiveSolver {
    fn reset(&mut self, c_dimension: usize, num_rows: usize);

    fn set_c_bounds(&mut self, index: usize, lb: f64, ub: Option<f64>);

    fn set_row(&mut self, row: usize, c: &[f64], bound_type: BoundType, rhs: f64);

    fn set_row_bound(&mut self, row: usize, rhs: f64);

    /// Adds `coefficient * log(c . y + constant)` to the left-hand side of a row.
    fn set_log_term(
        &mut self,
        row: usize,
        coefficient: f64,
        c: &[f64],
        constant: f64,
    ) -> Result<LogHandle, ModelError>;

    fn update_log_constant(&mut self, handle: LogHandle, constant: f64);

    /// Sets the linear parts of the objective; without a denominator it is `1`.
    fn set_objective(&mut self, numerator: &[f64], denominator: Option<&[f64]>);

    fn set_objective_constants(&mut self, numerator: f64, denominator: f64);

    /// Returns whether the constraints can be satisfied.
    fn solve(&mut self) -> bool;

    fn objective(&self) -> f64;

    fn c_solution(&self) -> &[f64];
}
