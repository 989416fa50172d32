//! The successive incumbent transcending (SIT) branch-and-bound search.
//!
//! The engine knows nothing about the problem it solves: it bounds, selects and branches boxes
//! of the non-convex variables and asks a [`BoundingProblem`] for bounds and objective values.
mod bounding;
mod boxes;
mod branching;
mod engine_statistics;
mod search_state;
mod sit_engine;

pub use bounding::BoundingProblem;
pub use boxes::PBox;
pub use boxes::Partition;
pub use boxes::ReferenceCorner;
pub use boxes::Region;
pub use branching::split_region;
pub use branching::Split;
pub use engine_statistics::EngineStatistics;
pub use search_state::SearchState;
pub use sit_engine::SitEngine;
