use std::fmt;

use cascade_core::runtime::PartitionRuntime;
use cascade_error::{CascadeError, ErrorKind, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Work-stealing runtime running partitions on a thread pool.
///
/// Every partition is a separate rayon task. The calling thread blocks until
/// all partitions have completed.
pub struct ThreadedRuntime {
    pool: ThreadPool,
}

impl fmt::Debug for ThreadedRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedRuntime")
            .field("num_threads", &self.pool.current_num_threads())
            .finish_non_exhaustive()
    }
}

impl ThreadedRuntime {
    /// Create a runtime with one thread per cpu.
    pub fn try_new() -> Result<Self> {
        Self::try_new_with_num_threads(num_cpus::get())
    }

    pub fn try_new_with_num_threads(num_threads: usize) -> Result<Self> {
        // Rayon would pick its own default for zero.
        if num_threads == 0 {
            return Err(CascadeError::with_kind(
                ErrorKind::Scheduling,
                "Thread pool requires at least one thread",
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .thread_name(|idx| format!("cascade_compute_{idx}"))
            .num_threads(num_threads)
            .build()
            .map_err(|e| {
                CascadeError::with_kind(ErrorKind::Scheduling, "Failed to build thread pool")
                    .caused_by(e)
            })?;

        debug!(%num_threads, "created threaded runtime");

        Ok(ThreadedRuntime { pool })
    }
}

impl PartitionRuntime for ThreadedRuntime {
    fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn run_partitions(&self, count: usize, work: &(dyn Fn(usize) + Sync)) -> Result<()> {
        debug!(%count, threads = self.pool.current_num_threads(), "running partitions");
        self.pool
            .install(|| (0..count).into_par_iter().for_each(|partition| work(partition)));
        Ok(())
    }
}
