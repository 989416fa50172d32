use crate::basic_types::ModelError;

/// Records in which direction every non-convex variable moves the logterms it appears in.
///
/// The direction of a variable in a logterm is the sign of its numerator coefficient, times the
/// sign of the logterm, times the direction of the constraint. All logterms have to agree.
#[derive(Debug, Clone, Default)]
pub(crate) struct SignRegistry {
    directions: Vec<Option<f64>>,
}

impl SignRegistry {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            directions: vec![None; dimension],
        }
    }

    /// Checks the numerator coefficients of a new logterm without recording them.
    pub(crate) fn check(
        &self,
        constraint: usize,
        numerator_nc: &[f64],
        orientation: f64,
    ) -> Result<(), ModelError> {
        for (variable, direction) in Self::directions_of(numerator_nc, orientation) {
            if self.directions[variable].is_some_and(|recorded| recorded != direction) {
                return Err(ModelError::InconsistentLogtermSign {
                    constraint,
                    variable,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn record(&mut self, numerator_nc: &[f64], orientation: f64) {
        for (variable, direction) in Self::directions_of(numerator_nc, orientation) {
            self.directions[variable] = Some(direction);
        }
    }

    fn directions_of(
        numerator_nc: &[f64],
        orientation: f64,
    ) -> impl Iterator<Item = (usize, f64)> + '_ {
        numerator_nc
            .iter()
            .enumerate()
            .filter(|&(_, &coefficient)| coefficient != 0.0)
            .map(move |(variable, &coefficient)| (variable, coefficient.signum() * orientation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agreeing_directions_are_accepted() {
        let mut registry = SignRegistry::new(2);
        registry.check(0, &[1.0, 0.0], 1.0).unwrap();
        registry.record(&[1.0, 0.0], 1.0);
        registry.check(1, &[2.0, -1.0], 1.0).unwrap();
        registry.record(&[2.0, -1.0], 1.0);

        // x1 decreases an upper row, which is the same as increasing a lower row
        registry.check(2, &[0.0, 1.0], -1.0).unwrap();
        assert!(registry.check(2, &[0.0, 1.0], 1.0).is_err());
    }

    #[test]
    fn opposite_directions_are_rejected() {
        let mut registry = SignRegistry::new(2);
        registry.record(&[0.0, 3.0], 1.0);

        assert_eq!(
            registry.check(4, &[0.0, 3.0], -1.0),
            Err(ModelError::InconsistentLogtermSign {
                constraint: 4,
                variable: 1
            })
        );
        registry.check(4, &[-1.0, 0.0], -1.0).unwrap();
    }
}
