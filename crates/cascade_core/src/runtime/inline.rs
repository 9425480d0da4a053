use cascade_error::Result;
use tracing::trace;

use super::PartitionRuntime;

/// Runtime executing every partition on the calling thread, in index order.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineRuntime;

impl PartitionRuntime for InlineRuntime {
    fn parallelism(&self) -> usize {
        1
    }

    fn run_partitions(&self, count: usize, work: &(dyn Fn(usize) + Sync)) -> Result<()> {
        trace!(%count, "running partitions inline");
        for partition in 0..count {
            work(partition);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[test]
    fn runs_in_order() {
        let seen = Mutex::new(Vec::new());
        InlineRuntime
            .run_partitions(4, &|idx| seen.lock().push(idx))
            .unwrap();
        assert_eq!(vec![0, 1, 2, 3], *seen.lock());
    }

    #[test]
    fn zero_partitions() {
        let seen = Mutex::new(0);
        InlineRuntime.run_partitions(0, &|_| *seen.lock() += 1).unwrap();
        assert_eq!(0, *seen.lock());
    }
}
