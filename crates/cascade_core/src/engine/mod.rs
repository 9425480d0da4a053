use std::ops::Range;
use std::sync::Arc;

use cascade_error::{CascadeError, ErrorKind, Result};
use tracing::{debug, trace};

use crate::ast::Expr;
use crate::config::EngineConfig;
use crate::eval::env::Env;
use crate::eval::evaluate;
use crate::execution::context::ExecutionContext;
use crate::execution::map_task::{ChunkMapper, MapOutput, MapTask};
use crate::functions::builtin::builtin_env;
use crate::functions::builtin::vector::Materialize;
use crate::runtime::PartitionRuntime;
use crate::runtime::inline::InlineRuntime;
use crate::values::Value;
use crate::vectors::VectorRef;
use crate::vectors::derived::DerivedVector;
use crate::vectors::store::{MemoryVectorStore, VectorStore};

/// Entry point for evaluating formulas.
///
/// Owns the configuration, the runtime used for map tasks, the vector store,
/// and a root environment with every builtin function bound.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    context: ExecutionContext,
    root: Env,
}

impl Engine {
    pub fn try_new(config: EngineConfig, runtime: Arc<dyn PartitionRuntime>) -> Result<Self> {
        Self::try_new_with_store(config, runtime, Arc::new(MemoryVectorStore::new()))
    }

    pub fn try_new_with_store(
        config: EngineConfig,
        runtime: Arc<dyn PartitionRuntime>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(CascadeError::with_kind(
                ErrorKind::Config,
                "Chunk size must be greater than zero",
            ));
        }

        debug!(
            chunk_size = config.chunk_size,
            parallelism = runtime.parallelism(),
            "creating engine"
        );

        let context = ExecutionContext::new(runtime, store, config.chunk_size);
        let root = builtin_env(context.clone());

        Ok(Engine {
            config,
            context,
            root,
        })
    }

    /// Create an engine running every chunk on the calling thread.
    pub fn new_inline() -> Self {
        let config = EngineConfig {
            parallel: false,
            threads: 1,
            ..Default::default()
        };
        let context = ExecutionContext::new(
            Arc::new(InlineRuntime),
            Arc::new(MemoryVectorStore::new()),
            config.chunk_size,
        );
        let root = builtin_env(context.clone());

        Engine {
            config,
            context,
            root,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Environment with every builtin bound.
    pub fn root_env(&self) -> &Env {
        &self.root
    }

    /// Evaluate an expression in the root environment.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value> {
        self.evaluate_in(expr, &self.root)
    }

    pub fn evaluate_in(&self, expr: &Expr, env: &Env) -> Result<Value> {
        trace!(%expr, "evaluating");
        evaluate(expr, env)
    }

    /// Read or compute the elements of a vector in `range`.
    pub fn materialize(&self, vector: &VectorRef, range: Range<usize>) -> Result<Vec<f64>> {
        vector.materialize(range)
    }

    /// Compute every element of a vector into a new stored vector.
    ///
    /// Stored vectors are returned unchanged.
    pub fn store_vector(&self, vector: VectorRef) -> Result<VectorRef> {
        Materialize::materialize_vector(&self.context, vector)
    }

    /// Store values using the configured chunk size.
    pub fn vector_from_values(&self, values: &[f64]) -> Result<VectorRef> {
        self.context.vector_from_values(values, self.config.chunk_size)
    }

    pub fn vector_from_values_with_chunk_size(
        &self,
        values: &[f64],
        chunk_size: usize,
    ) -> Result<VectorRef> {
        self.context.vector_from_values(values, chunk_size)
    }

    pub fn zeros(&self, len: usize) -> Result<VectorRef> {
        self.context.zeros(len)
    }

    /// Create a derived vector over `source`, closing over the root
    /// environment.
    pub fn derive(
        &self,
        source: VectorRef,
        formula: impl Into<Arc<Expr>>,
        var: impl Into<Arc<str>>,
    ) -> Result<VectorRef> {
        let derived = DerivedVector::try_new(source, formula.into(), var, self.root.clone())?;
        Ok(derived.into())
    }

    /// Run a chunk mapper over conformed vectors.
    pub fn for_each_chunk<M>(
        &self,
        vectors: Vec<VectorRef>,
        mapper: &M,
    ) -> Result<MapOutput<M::Partial>>
    where
        M: ChunkMapper,
    {
        MapTask::try_new(vectors)?.execute(&self.context, mapper)
    }
}
