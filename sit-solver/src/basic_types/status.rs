use std::fmt::Display;
use std::fmt::Formatter;

/// The state of a search.
///
/// A fresh or reconfigured solver is [`Status::Unsolved`]; a completed search moves it to either
/// [`Status::Optimal`] or [`Status::Infeasible`] exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Unsolved,
    /// The incumbent is optimal within the configured precision.
    Optimal,
    /// No point of the initial box satisfies the constraints.
    Infeasible,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Unsolved => write!(f, "Unsolved"),
            Status::Optimal => write!(f, "Optimal"),
            Status::Infeasible => write!(f, "Infeasible"),
        }
    }
}
