mod solve_result;
mod solver;

pub use solve_result::SolveResult;
pub use solver::Solver;
