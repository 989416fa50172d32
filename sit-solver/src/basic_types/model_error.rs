use thiserror::Error;

/// Errors raised while building or configuring a model.
///
/// These indicate a mistake in the model construction and are never recovered from; the search
/// does not start when one of them is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("the initial threshold is not set (it is NaN)")]
    ThresholdUnset,
    #[error("the initial threshold {0} can never be reached")]
    InvalidThreshold(f64),
    #[error("the precision must be strictly positive, got eta={eta} and epsilon={epsilon}")]
    InvalidPrecision { eta: f64, epsilon: f64 },
    #[error("index {index} is out of range for {kind} of size {size}")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        size: usize,
    },
    #[error("expected {expected} coefficients for {kind}, got {actual}")]
    DimensionMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("the bounds [{lb}, {ub}] of non-convex variable {index} are not a finite interval")]
    InvalidNonConvexBounds { index: usize, lb: f64, ub: f64 },
    #[error("the bounds of convex variable {index} are invalid: lb={lb} must be non-negative and ub={ub} must exceed it")]
    InvalidConvexBounds { index: usize, lb: f64, ub: f64 },
    #[error("the bounds of non-convex variable {0} are not set")]
    BoundsUnset(usize),
    #[error("the objective is not set")]
    ObjectiveUnset,
    #[error("constraint {0} is not defined")]
    ConstraintUndefined(usize),
    #[error("constraint {0} is already defined")]
    ConstraintRedefined(usize),
    #[error("the denominator of a logterm in constraint {constraint} has a negative coefficient for variable {variable}")]
    NegativeEnvelopeCoefficient { constraint: usize, variable: usize },
    #[error("the constant denominator of a logterm in constraint {0} is not positive")]
    NonPositiveLogDenominator(usize),
    #[error("logterm sign wrong: non-convex variable {variable} is increasing in one logterm and decreasing in another (constraint {constraint})")]
    InconsistentLogtermSign { constraint: usize, variable: usize },
    #[error("logterm envelopes require contradictory reference corners (constraint {0})")]
    ContradictoryEnvelope(usize),
    #[error("equality constraint {0} cannot contain a logterm with a non-constant denominator")]
    EnvelopeInEquality(usize),
    #[error("the logarithm in row {0} is not convex in the convex variables")]
    NonConvexLogterm(usize),
}
