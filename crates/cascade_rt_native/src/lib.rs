//! Native partition runtime backed by a rayon thread pool.

mod threaded;

pub use threaded::ThreadedRuntime;
