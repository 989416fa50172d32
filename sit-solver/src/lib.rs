//! # SIT solver
//! A global optimiser for monotone problems based on successive incumbent transcending (SIT)
//! branch and bound.
//!
//! The variables are split into two groups. The non-convex variables live in a box which is
//! searched by branch and bound; the objective and constraints have to be monotone in them. The
//! convex variables are handled by a convex subproblem solver for every box and every candidate
//! point. Constraints are linear in both groups plus a sum of logterms
//! `±(log(numerator) - log(denominator))`, and the objective is linear or a ratio of linear
//! functions.
//!
//! The search does not maximise the objective directly. It repeatedly asks whether a point with
//! an objective of at least `gamma` exists, and raises `gamma` to `optval + eta` after every
//! improvement. When no box can contain such a point, the incumbent is optimal up to `eta`.
//!
//! ```rust
//! # use sit_solver::BoundType;
//! # use sit_solver::Constraint;
//! # use sit_solver::LinearExpression;
//! # use sit_solver::Solver;
//! # use sit_solver::Status;
//! // max x0 + x1 s.t. x0 + 2 x1 <= 4 on [0, 4]^2
//! let mut solver = Solver::new(2, 0, 1);
//! solver.set_nc_bounds(0, 0.0, 4.0).unwrap();
//! solver.set_nc_bounds(1, 0.0, 4.0).unwrap();
//! solver
//!     .set_objective(LinearExpression::new([1.0, 1.0], [], 0.0), None)
//!     .unwrap();
//! solver
//!     .set_constraint(0, Constraint::new([1.0, 2.0], [], BoundType::Upper, 4.0))
//!     .unwrap();
//! solver.set_precision(0.05, None).unwrap();
//!
//! let result = solver.optimise().unwrap();
//! assert_eq!(result.status, Status::Optimal);
//! assert!(result.optval <= 4.0 + 1e-6);
//! assert!(result.optval >= 4.0 - 0.0501);
//! ```
//!
//! Searches can be checkpointed to disk with [`Solver::enable_checkpoint`]; a search started with
//! an existing checkpoint resumes from it.
pub mod adapters;
pub(crate) mod api;
pub mod asserts;
pub(crate) mod basic_types;
pub mod checkpoint;
pub mod containers;
pub mod engine;
pub mod options;
pub mod reformulation;
pub mod statistics;

pub use adapters::BoundType;
pub use api::SolveResult;
pub use api::Solver;
pub use basic_types::ModelError;
pub use basic_types::Status;
pub use convert_case;
pub use reformulation::Constraint;
pub use reformulation::LinearExpression;
pub use reformulation::Logterm;
pub use reformulation::LogtermSign;
