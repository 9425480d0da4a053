//! Formula evaluation over partitioned numeric vectors.
//!
//! Re-exports the core engine and wires it up with the native runtime.

use std::sync::Arc;

pub use cascade_core::{
    ast, config, engine, eval, execution, functions, runtime, values, vectors,
};
pub use cascade_error as error;
pub use cascade_rt_native::ThreadedRuntime;

use cascade_core::config::EngineConfig;
use cascade_core::engine::Engine;
use cascade_core::runtime::PartitionRuntime;
use cascade_core::runtime::inline::InlineRuntime;
use cascade_error::Result;
use tracing::debug;

/// Create an engine for this machine.
///
/// Chunks are processed on a thread pool with `config.threads` threads when
/// `config.parallel` is set, and on the calling thread otherwise.
pub fn native_engine(config: EngineConfig) -> Result<Engine> {
    let runtime: Arc<dyn PartitionRuntime> = if config.parallel {
        Arc::new(ThreadedRuntime::try_new_with_num_threads(config.threads)?)
    } else {
        Arc::new(InlineRuntime)
    };
    debug!(?config, "creating native engine");

    Engine::try_new(config, runtime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_engine() {
        let config = EngineConfig {
            threads: 2,
            ..Default::default()
        };
        let engine = native_engine(config).unwrap();
        assert_eq!(2, engine.context().runtime().parallelism());
    }

    #[test]
    fn inline_engine() {
        let config = EngineConfig {
            parallel: false,
            ..Default::default()
        };
        let engine = native_engine(config).unwrap();
        assert_eq!(1, engine.context().runtime().parallelism());
    }

    #[test]
    fn zero_threads_rejected() {
        let config = EngineConfig {
            threads: 0,
            ..Default::default()
        };
        let err = native_engine(config).unwrap_err();
        assert_eq!(error::ErrorKind::Scheduling, err.kind());
    }
}
