use super::Region;
#[cfg(doc)]
use crate::reformulation::Reformulation;

/// The problem-specific part of the search, implemented by the [`Reformulation`].
///
/// Bounds follow the slack convention: `beta` is a lower bound on the constraint violation of
/// any point in the region whose objective reaches the current threshold. A region is worth
/// exploring when `beta` is negative, and `+inf` marks a region without such points.
pub trait BoundingProblem {
    /// The number of non-convex variables.
    fn dimension(&self) -> usize;

    /// Sets the threshold `gamma` an objective value has to reach.
    fn set_threshold(&mut self, gamma: f64);

    /// Bounds `region`, recording `beta`, a candidate point and the reference corner in it.
    ///
    /// Failures of the underlying solvers result in `beta = +inf`.
    fn bound(&mut self, region: &mut Region);

    /// Returns the objective value at `point` if it is feasible for the exact constraints.
    fn evaluate(&mut self, point: &[f64]) -> Option<f64>;
}
