use crate::create_statistics_struct;

create_statistics_struct!(
    /// Counters of the branch-and-bound search.
    EngineStatistics {
        /// The number of regions passed to the bounding step
        regions_bounded: u64,
        /// The number of bounded regions which were discarded
        regions_pruned: u64,
        /// The number of times a better incumbent was found
        incumbent_updates: u64,
        /// The largest number of regions waiting in the frontier
        peak_frontier: usize,
        /// The number of distinct region records allocated
        regions_allocated: usize,
        /// The number of times a released region record was reused
        regions_recycled: u64,
        checkpoints_written: u64,
        checkpoint_failures: u64,
        /// Seconds spent searching, excluding checkpoint writes
        runtime: f64,
});
