//! The bounding reformulation: the model of objective, constraints and logterms, and its
//! translation into calls on the convex subproblem solvers.
mod bounding_reformulation;
mod model;
mod sign_registry;

pub use bounding_reformulation::Reformulation;
pub use bounding_reformulation::ReformulationStatistics;
pub use model::Constraint;
pub use model::LinearExpression;
pub use model::Logterm;
pub use model::LogtermSign;
pub use model::Objective;
use sign_registry::SignRegistry;
