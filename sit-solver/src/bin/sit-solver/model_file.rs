//! The line-based model format read by the binary.
//!
//! Every non-empty line is one statement; `#` starts a comment. The first statement gives the
//! dimensions, the others may appear in any order as long as a constraint is defined before its
//! logterms:
//! ```text
//! dimensions <nc> <c> <constraints>
//! precision <eta> [<epsilon>]
//! threshold <gamma0>
//! bound nc <idx> <lb> <ub>
//! bound c <idx> <lb> [<ub>]
//! objective numer nc=<v,..> c=<v,..> const=<v>
//! objective denom nc=<v,..> c=<v,..> const=<v>
//! constraint <idx> <le|ge|eq> <rhs> nc=<v,..> c=<v,..>
//! logterm <idx> <plus|minus> nc=<..> c=<..> const=<v> dc=<..> dcconst=<v>
//! ```
//! Omitted coefficient lists are zero, an omitted `dcconst` is one.
use std::collections::HashMap;
use std::str::FromStr;

use sit_solver::BoundType;
use sit_solver::Constraint;
use sit_solver::LinearExpression;
use sit_solver::Logterm;
use sit_solver::LogtermSign;
use sit_solver::ModelError;
use sit_solver::Solver;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub(crate) enum ModelFileError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: {source}")]
    Model { line: usize, source: ModelError },
    #[error("the model does not contain a `dimensions` statement")]
    MissingDimensions,
}

/// A parsed model together with the search settings it asks for.
#[derive(Debug)]
pub(crate) struct ModelFile {
    pub(crate) solver: Solver,
    pub(crate) precision: Option<(f64, Option<f64>)>,
    pub(crate) threshold: Option<f64>,
}

pub(crate) fn parse_model(source: &str) -> Result<ModelFile, ModelFileError> {
    let mut parser: Option<ModelParser> = None;

    for (index, line) in source.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let statement = Statement {
            line: index + 1,
            tokens: content.split_whitespace().collect(),
        };

        match &mut parser {
            Some(parser) => parser.apply(&statement)?,
            None => parser = Some(ModelParser::new(&statement)?),
        }
    }

    parser.ok_or(ModelFileError::MissingDimensions)?.finish()
}

struct Statement<'a> {
    line: usize,
    tokens: Vec<&'a str>,
}

impl<'a> Statement<'a> {
    fn error(&self, message: impl Into<String>) -> ModelFileError {
        ModelFileError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn model(&self, result: Result<(), ModelError>) -> Result<(), ModelFileError> {
        result.map_err(|source| ModelFileError::Model {
            line: self.line,
            source,
        })
    }

    fn expect_arguments(&self, min: usize, max: usize) -> Result<(), ModelFileError> {
        let arguments = self.tokens.len() - 1;
        if arguments < min || arguments > max {
            return Err(self.error(format!(
                "`{}` expects between {min} and {max} arguments, got {arguments}",
                self.tokens[0]
            )));
        }
        Ok(())
    }

    fn token(&self, position: usize, what: &str) -> Result<&'a str, ModelFileError> {
        self.tokens
            .get(position)
            .copied()
            .ok_or_else(|| self.error(format!("missing {what}")))
    }

    fn parse<T: FromStr>(&self, position: usize, what: &str) -> Result<T, ModelFileError> {
        let token = self.token(position, what)?;
        token
            .parse()
            .map_err(|_| self.error(format!("invalid {what} `{token}`")))
    }

    /// Collects the `key=value` arguments from `position` on.
    fn keyed(
        &self,
        position: usize,
        allowed: &[&str],
    ) -> Result<HashMap<&'a str, &'a str>, ModelFileError> {
        let mut arguments = HashMap::new();
        for token in self.tokens.iter().skip(position) {
            let Some((key, value)) = token.split_once('=') else {
                return Err(self.error(format!("expected `key=value`, got `{token}`")));
            };
            if !allowed.contains(&key) {
                return Err(self.error(format!("unknown key `{key}`")));
            }
            if arguments.insert(key, value).is_some() {
                return Err(self.error(format!("key `{key}` is given twice")));
            }
        }
        Ok(arguments)
    }

    fn vector(
        &self,
        arguments: &HashMap<&str, &str>,
        key: &str,
        dimension: usize,
    ) -> Result<Vec<f64>, ModelFileError> {
        match arguments.get(key) {
            None => Ok(vec![0.0; dimension]),
            Some(values) if values.is_empty() => Ok(vec![0.0; dimension]),
            Some(values) => values
                .split(',')
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| self.error(format!("invalid coefficient `{value}` in `{key}`")))
                })
                .collect(),
        }
    }

    fn scalar(
        &self,
        arguments: &HashMap<&str, &str>,
        key: &str,
        default: f64,
    ) -> Result<f64, ModelFileError> {
        match arguments.get(key) {
            None => Ok(default),
            Some(value) => value
                .parse()
                .map_err(|_| self.error(format!("invalid value `{value}` for `{key}`"))),
        }
    }
}

struct ModelParser {
    solver: Solver,
    nc_dimension: usize,
    c_dimension: usize,
    precision: Option<(f64, Option<f64>)>,
    threshold: Option<f64>,
    numerator: Option<(usize, LinearExpression)>,
    denominator: Option<(usize, LinearExpression)>,
}

impl ModelParser {
    fn new(statement: &Statement<'_>) -> Result<Self, ModelFileError> {
        if statement.tokens[0] != "dimensions" {
            return Err(statement.error("the model has to start with `dimensions`"));
        }
        statement.expect_arguments(3, 3)?;
        let nc_dimension = statement.parse(1, "number of non-convex variables")?;
        let c_dimension = statement.parse(2, "number of convex variables")?;
        let num_constraints = statement.parse(3, "number of constraints")?;

        Ok(Self {
            solver: Solver::new(nc_dimension, c_dimension, num_constraints),
            nc_dimension,
            c_dimension,
            precision: None,
            threshold: None,
            numerator: None,
            denominator: None,
        })
    }

    fn apply(&mut self, statement: &Statement<'_>) -> Result<(), ModelFileError> {
        match statement.tokens[0] {
            "dimensions" => Err(statement.error("the dimensions are already given")),
            "precision" => {
                statement.expect_arguments(1, 2)?;
                let eta = statement.parse(1, "eta")?;
                let epsilon = if statement.tokens.len() > 2 {
                    Some(statement.parse(2, "epsilon")?)
                } else {
                    None
                };
                self.precision = Some((eta, epsilon));
                Ok(())
            }
            "threshold" => {
                statement.expect_arguments(1, 1)?;
                self.threshold = Some(statement.parse(1, "threshold")?);
                Ok(())
            }
            "bound" => self.bound(statement),
            "objective" => self.objective(statement),
            "constraint" => self.constraint(statement),
            "logterm" => self.logterm(statement),
            keyword => Err(statement.error(format!("unknown statement `{keyword}`"))),
        }
    }

    fn bound(&mut self, statement: &Statement<'_>) -> Result<(), ModelFileError> {
        let index = statement.parse(2, "variable index")?;
        let lb = statement.parse(3, "lower bound")?;
        match statement.token(1, "variable kind")? {
            "nc" => {
                statement.expect_arguments(4, 4)?;
                let ub = statement.parse(4, "upper bound")?;
                statement.model(self.solver.set_nc_bounds(index, lb, ub))
            }
            "c" => {
                statement.expect_arguments(3, 4)?;
                let ub = if statement.tokens.len() > 4 {
                    Some(statement.parse(4, "upper bound")?)
                } else {
                    None
                };
                statement.model(self.solver.set_c_bounds(index, lb, ub))
            }
            kind => Err(statement.error(format!("unknown variable kind `{kind}`"))),
        }
    }

    fn objective(&mut self, statement: &Statement<'_>) -> Result<(), ModelFileError> {
        let arguments = statement.keyed(2, &["nc", "c", "const"])?;
        let expression = LinearExpression::new(
            statement.vector(&arguments, "nc", self.nc_dimension)?,
            statement.vector(&arguments, "c", self.c_dimension)?,
            statement.scalar(&arguments, "const", 0.0)?,
        );

        let part = match statement.token(1, "objective part")? {
            "numer" => &mut self.numerator,
            "denom" => &mut self.denominator,
            part => return Err(statement.error(format!("unknown objective part `{part}`"))),
        };
        if part.is_some() {
            return Err(statement.error("this part of the objective is already given"));
        }
        *part = Some((statement.line, expression));
        Ok(())
    }

    fn constraint(&mut self, statement: &Statement<'_>) -> Result<(), ModelFileError> {
        let index = statement.parse(1, "constraint index")?;
        let bound_type = match statement.token(2, "comparison")? {
            "le" => BoundType::Upper,
            "ge" => BoundType::Lower,
            "eq" => BoundType::Fixed,
            comparison => {
                return Err(statement.error(format!("unknown comparison `{comparison}`")))
            }
        };
        let rhs = statement.parse(3, "right-hand side")?;
        let arguments = statement.keyed(4, &["nc", "c"])?;

        let constraint = Constraint::new(
            statement.vector(&arguments, "nc", self.nc_dimension)?,
            statement.vector(&arguments, "c", self.c_dimension)?,
            bound_type,
            rhs,
        );
        statement.model(self.solver.set_constraint(index, constraint))
    }

    fn logterm(&mut self, statement: &Statement<'_>) -> Result<(), ModelFileError> {
        let index = statement.parse(1, "constraint index")?;
        let sign = match statement.token(2, "sign")? {
            "plus" => LogtermSign::Plus,
            "minus" => LogtermSign::Minus,
            sign => return Err(statement.error(format!("unknown sign `{sign}`"))),
        };
        let arguments = statement.keyed(3, &["nc", "c", "const", "dc", "dcconst"])?;

        let logterm = Logterm::new(
            sign,
            LinearExpression::new(
                statement.vector(&arguments, "nc", self.nc_dimension)?,
                statement.vector(&arguments, "c", self.c_dimension)?,
                statement.scalar(&arguments, "const", 0.0)?,
            ),
            statement.vector(&arguments, "dc", self.nc_dimension)?,
            statement.scalar(&arguments, "dcconst", 1.0)?,
        );
        statement.model(self.solver.add_logterm(index, logterm))
    }

    fn finish(mut self) -> Result<ModelFile, ModelFileError> {
        match (self.numerator, self.denominator) {
            (Some((line, numerator)), denominator) => self
                .solver
                .set_objective(numerator, denominator.map(|(_, expression)| expression))
                .map_err(|source| ModelFileError::Model { line, source })?,
            (None, Some((line, _))) => {
                return Err(ModelFileError::Syntax {
                    line,
                    message: "the objective has a denominator but no numerator".to_owned(),
                })
            }
            (None, None) => {}
        }

        Ok(ModelFile {
            solver: self.solver,
            precision: self.precision,
            threshold: self.threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use sit_solver::Status;

    use super::*;

    const LOG_MODEL: &str = "
        # max x s.t. log(1 + x) <= 2
        dimensions 1 0 1
        precision 1e-3
        bound nc 0 0 10
        objective numer nc=1
        constraint 0 le 2
        logterm 0 plus nc=1 const=1
    ";

    #[test]
    fn model_is_parsed_and_optimised() {
        let ModelFile {
            mut solver,
            precision,
            threshold,
        } = parse_model(LOG_MODEL).unwrap();
        assert_eq!(precision, Some((1e-3, None)));
        assert_eq!(threshold, None);

        solver.set_precision(1e-3, None).unwrap();
        let result = solver.optimise().unwrap();
        assert_eq!(result.status, Status::Optimal);
        assert!((result.optval - 6.389).abs() <= 1e-3);
    }

    #[test]
    fn model_has_to_start_with_dimensions() {
        assert_eq!(
            parse_model("# nothing\n\n").unwrap_err(),
            ModelFileError::MissingDimensions
        );
        assert!(matches!(
            parse_model("bound nc 0 0 1\ndimensions 1 0 0").unwrap_err(),
            ModelFileError::Syntax { line: 1, .. }
        ));
    }

    #[test]
    fn syntax_errors_carry_the_line() {
        let source = "dimensions 1 0 1\nbound nc 0 zero 1\n";
        assert!(matches!(
            parse_model(source).unwrap_err(),
            ModelFileError::Syntax { line: 2, .. }
        ));

        let source = "dimensions 1 0 1\n\nconstraint 0 lt 1 nc=1\n";
        assert!(matches!(
            parse_model(source).unwrap_err(),
            ModelFileError::Syntax { line: 3, .. }
        ));

        let source = "dimensions 1 0 1\nconstraint 0 le 1 nc=1 nc=2\n";
        assert!(matches!(
            parse_model(source).unwrap_err(),
            ModelFileError::Syntax { line: 2, .. }
        ));
    }

    #[test]
    fn model_errors_carry_the_line() {
        let source = "dimensions 1 0 1\nlogterm 0 plus nc=1 const=1\n";
        assert_eq!(
            parse_model(source).unwrap_err(),
            ModelFileError::Model {
                line: 2,
                source: ModelError::ConstraintUndefined(0)
            }
        );

        let source = "dimensions 1 0 1\nobjective numer nc=1,2\n";
        assert!(matches!(
            parse_model(source).unwrap_err(),
            ModelFileError::Model {
                line: 2,
                source: ModelError::DimensionMismatch { .. }
            }
        ));
    }

    #[test]
    fn denominator_needs_a_numerator() {
        let source = "dimensions 1 0 0\nobjective denom const=2\n";
        assert!(matches!(
            parse_model(source).unwrap_err(),
            ModelFileError::Syntax { line: 2, .. }
        ));
    }
}
