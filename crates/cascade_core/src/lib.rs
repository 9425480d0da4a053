//! Formula evaluation over partitioned numeric vectors.
//!
//! Expressions (`ast`) are evaluated by a small tree-walking evaluator
//! (`eval`) whose only source of computation are functions (`functions`).
//! Vectors (`vectors`) are split into chunks; derived vectors re-run a formula
//! against their source's chunks on demand, and chunk-parallel map tasks
//! (`execution`) visit every chunk of a set of conformed vectors on a
//! partition runtime (`runtime`).

pub mod ast;
pub mod config;
pub mod engine;
pub mod eval;
pub mod execution;
pub mod functions;
pub mod runtime;
pub mod values;
pub mod vectors;
