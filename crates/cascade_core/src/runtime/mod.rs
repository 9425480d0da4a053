pub mod inline;

use std::fmt::Debug;

use cascade_error::Result;

/// How per-partition work gets executed on a single node.
///
/// This will likely only ever have two implementations; one running
/// partitions one after another on the calling thread, and one running
/// partitions on a thread pool.
pub trait PartitionRuntime: Debug + Sync + Send {
    /// Number of partitions that may run at the same time.
    fn parallelism(&self) -> usize;

    /// Run `work` once for every partition index in `0..count`.
    ///
    /// Blocks until every invocation has returned. Invocations may happen in
    /// any order and concurrently. `work` reports its own failures, an error
    /// returned here means partitions could not be scheduled at all.
    fn run_partitions(&self, count: usize, work: &(dyn Fn(usize) + Sync)) -> Result<()>;
}
