use thiserror::Error;

/// Failures while writing or reading a checkpoint.
///
/// These never abort a search: a failed write only loses durability for one interval, and a
/// failed restore starts the search from scratch.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed, more details: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint is truncated: {needed} more bytes expected at offset {offset}")]
    Truncated { offset: usize, needed: usize },
    #[error("checkpoint has {0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("checkpoint contains the invalid reference corner tag {0}")]
    InvalidReferenceCorner(u32),
    #[error("checkpoint contains the invalid runtime {0}")]
    InvalidRuntime(f64),
    #[error("checkpoint contains a partition of {0} regions")]
    InvalidPartition(u64),
}
