use crate::adapters::BoundType;

/// `nc . x + c . y + constant`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearExpression {
    pub nc: Vec<f64>,
    pub c: Vec<f64>,
    pub constant: f64,
}

impl LinearExpression {
    pub fn new(nc: impl Into<Vec<f64>>, c: impl Into<Vec<f64>>, constant: f64) -> Self {
        Self {
            nc: nc.into(),
            c: c.into(),
            constant,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.constant == 0.0 && is_zero(&self.nc) && is_zero(&self.c)
    }

    /// The value of the non-convex part at `point`, including the constant.
    pub(crate) fn evaluate_nc(&self, point: &[f64]) -> f64 {
        dot(&self.nc, point) + self.constant
    }

    pub(crate) fn has_c(&self) -> bool {
        !is_zero(&self.c)
    }
}

/// The objective `numerator / denominator`; without a denominator it is the numerator alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub numerator: LinearExpression,
    pub denominator: Option<LinearExpression>,
}

/// `nc . x + c . y + logterms <op> rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub nc: Vec<f64>,
    pub c: Vec<f64>,
    pub bound_type: BoundType,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(
        nc: impl Into<Vec<f64>>,
        c: impl Into<Vec<f64>>,
        bound_type: BoundType,
        rhs: f64,
    ) -> Self {
        Self {
            nc: nc.into(),
            c: c.into(),
            bound_type,
            rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogtermSign {
    Plus,
    Minus,
}

impl LogtermSign {
    pub fn value(self) -> f64 {
        match self {
            LogtermSign::Plus => 1.0,
            LogtermSign::Minus => -1.0,
        }
    }
}

/// `sign * (log(numerator) - log(denominator_nc . x + denominator_constant))`, added to the
/// left-hand side of a constraint.
///
/// The denominator may only depend on the non-convex variables, with non-negative coefficients.
/// When it does, the logterm is a difference of two monotone functions and is relaxed over a box
/// by evaluating the denominator at one of its corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Logterm {
    pub sign: LogtermSign,
    pub numerator: LinearExpression,
    pub denominator_nc: Vec<f64>,
    pub denominator_constant: f64,
}

impl Logterm {
    pub fn new(
        sign: LogtermSign,
        numerator: LinearExpression,
        denominator_nc: impl Into<Vec<f64>>,
        denominator_constant: f64,
    ) -> Self {
        Self {
            sign,
            numerator,
            denominator_nc: denominator_nc.into(),
            denominator_constant,
        }
    }

    /// A logterm of the numerator alone.
    pub fn plain(sign: LogtermSign, numerator: LinearExpression) -> Self {
        let dimension = numerator.nc.len();
        Self::new(sign, numerator, vec![0.0; dimension], 1.0)
    }

    /// Whether the denominator depends on the non-convex variables.
    pub fn has_envelope(&self) -> bool {
        !is_zero(&self.denominator_nc)
    }

    pub(crate) fn denominator_at(&self, point: &[f64]) -> f64 {
        dot(&self.denominator_nc, point) + self.denominator_constant
    }
}

pub(crate) fn dot(coefficients: &[f64], values: &[f64]) -> f64 {
    coefficients
        .iter()
        .zip(values)
        .map(|(coefficient, value)| coefficient * value)
        .sum()
}

fn is_zero(values: &[f64]) -> bool {
    values.iter().all(|&value| value == 0.0)
}
