//! Saving and restoring the complete state of a search.
//!
//! A checkpoint holds the incumbent, the counters, the regions awaiting bounding and every region
//! of the frontier. It is written in the native byte order of the machine:
//!
//! ```text
//! [f64 optval][f64; d xopt][f64 runtime][u64 iter][u64 last_update]
//! [f64; d single lb][f64; d single ub]
//! [f64; d pair[0] lb][f64; d pair[0] ub][f64; d pair[1] lb][f64; d pair[1] ub]
//! [u64 partition_len][u64 frontier_len]
//! frontier_len * ([f64 beta][f64; d lb][f64; d ub][f64; d xk][u32 reference_corner])
//! ```
mod checkpoint_error;
mod codec;
mod storage;

pub use checkpoint_error::CheckpointError;
pub use codec::CheckpointState;
pub use codec::FrontierRecord;
pub use storage::backup_path;
pub use storage::read_checkpoint;
pub use storage::remove_checkpoint;
pub use storage::restore_checkpoint;
pub use storage::write_checkpoint;
