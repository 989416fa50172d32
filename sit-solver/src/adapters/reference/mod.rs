//! A pure-Rust implementation of the adapter contract.
//!
//! Linear programs are solved with `microlp`; logarithms of convex variables are handled with
//! Kelley's cutting-plane method, and ratios of convex variables with a Dinkelbach iteration.
//! The non-convex variables are relaxed term by term at the corner of the box which is least
//! restrictive for that term.
mod convex_program;
mod corner_bound_solver;
mod fixed_point_objective_solver;
mod rows;

pub use convex_program::ConvexProgram;
pub use convex_program::ProgramError;
pub use convex_program::ProgramSolution;
pub use corner_bound_solver::CornerBoundSolver;
pub use fixed_point_objective_solver::FixedPointObjectiveSolver;
