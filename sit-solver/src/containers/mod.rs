//! Storage structures used by the search: an arena for regions, a pool that recycles them, and
//! the frontier ordering them by bound.
mod frontier;
mod keyed_vec;
mod region_pool;

pub use frontier::Frontier;
pub use keyed_vec::KeyedVec;
pub use keyed_vec::StorageKey;
pub use region_pool::RegionId;
pub use region_pool::RegionPool;
