use super::ConvexProgram;
use crate::adapters::BoundType;
use crate::adapters::LogHandle;
use crate::basic_types::ModelError;

#[derive(Debug, Clone)]
pub(super) struct Row {
    pub(super) nc: Vec<f64>,
    pub(super) c: Vec<f64>,
    pub(super) bound_type: BoundType,
    pub(super) rhs: f64,
    pub(super) log_terms: Vec<usize>,
}

impl Row {
    pub(super) fn empty(nc_dimension: usize, c_dimension: usize) -> Self {
        Self {
            nc: vec![0.0; nc_dimension],
            c: vec![0.0; c_dimension],
            bound_type: BoundType::Upper,
            rhs: f64::INFINITY,
            log_terms: vec![],
        }
    }
}

/// `coefficient * log(nc . x + c . y + constant)`
#[derive(Debug, Clone)]
pub(super) struct LogTerm {
    pub(super) coefficient: f64,
    pub(super) nc: Vec<f64>,
    pub(super) c: Vec<f64>,
    pub(super) constant: f64,
}

impl LogTerm {
    pub(super) fn depends_on_c(&self) -> bool {
        self.c.iter().any(|&value| value != 0.0)
    }
}

/// A logarithm of convex variables can only appear where it keeps the row convex: with a
/// negative coefficient in `<=` rows and a positive one in `>=` rows.
pub(super) fn check_convexity(row: usize, bound_type: BoundType, term: &LogTerm) -> Result<(), ModelError> {
    let convex = bound_type
        .orientations()
        .iter()
        .all(|orientation| orientation * term.coefficient < 0.0);
    if term.depends_on_c() && !convex {
        Err(ModelError::NonConvexLogterm(row))
    } else {
        Ok(())
    }
}

/// The smallest value of `coefficient * log(argument)` given the smallest (for a positive
/// coefficient) or largest (for a negative one) attainable argument.
pub(super) fn relaxed_log(coefficient: f64, argument: f64) -> f64 {
    if coefficient == 0.0 {
        0.0
    } else if argument > 0.0 {
        coefficient * argument.ln()
    } else if coefficient > 0.0 {
        f64::NEG_INFINITY
    } else {
        // The argument is never positive, so the logarithm is undefined everywhere.
        f64::INFINITY
    }
}

/// Adds the convex variables of a row with their orientation applied.
pub(super) fn push_c_terms(
    terms: &mut Vec<(usize, f64)>,
    variables: &[usize],
    coefficients: &[f64],
    orientation: f64,
) {
    terms.extend(
        variables
            .iter()
            .zip(coefficients)
            .filter(|&(_, &coefficient)| coefficient != 0.0)
            .map(|(&variable, &coefficient)| (variable, orientation * coefficient)),
    );
}

/// Adds the epigraph of `log(c . y + constant)` to `program`, returning its variable.
pub(super) fn add_log_epigraph(
    program: &mut ConvexProgram,
    variables: &[usize],
    c: &[f64],
    constant: f64,
) -> LogHandle {
    let mut argument = vec![];
    push_c_terms(&mut argument, variables, c, 1.0);
    program.add_logarithm(argument, constant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BackendOptions;

    #[test]
    fn log_epigraph_is_tied_to_the_mapped_variables() {
        // min y1 s.t. log(2 * y1 + 1) >= 1, where y0 is unused
        let mut program = ConvexProgram::minimise();
        let variables = vec![
            program.add_variable(0.0, 0.0, 10.0),
            program.add_variable(1.0, 0.0, 10.0),
        ];
        let handle = add_log_epigraph(&mut program, &variables, &[0.0, 2.0], 1.0);
        let z = program.log_variable(handle);
        program.add_row(vec![(z, 1.0)], BoundType::Lower, 1.0);

        let solution = program.solve(&BackendOptions::default()).unwrap();
        assert!(solution.is_converged());
        let expected = (std::f64::consts::E - 1.0) / 2.0;
        assert!((solution.value(variables[1]) - expected).abs() < 1e-6);
    }

    #[test]
    fn zero_coefficients_are_not_pushed() {
        let mut terms = vec![];
        push_c_terms(&mut terms, &[4, 5, 6], &[1.0, 0.0, -2.0], -1.0);
        assert_eq!(terms, vec![(4, -1.0), (6, 2.0)]);
    }
}
