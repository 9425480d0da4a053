use std::sync::Arc;

use cascade_error::Result;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::runtime::PartitionRuntime;
use crate::runtime::inline::InlineRuntime;
use crate::vectors::VectorRef;
use crate::vectors::partitioned::PartitionedVector;
use crate::vectors::store::{MemoryVectorStore, VectorStore};

/// Everything functions need to create and process vectors.
///
/// Cheap to clone. Every environment reaches one through its root scope.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    runtime: Arc<dyn PartitionRuntime>,
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
}

impl ExecutionContext {
    pub fn new(
        runtime: Arc<dyn PartitionRuntime>,
        store: Arc<dyn VectorStore>,
        chunk_size: usize,
    ) -> Self {
        ExecutionContext {
            runtime,
            store,
            chunk_size,
        }
    }

    /// Context running everything on the calling thread with an in-memory
    /// store.
    pub fn inline() -> Self {
        Self::new(
            Arc::new(InlineRuntime),
            Arc::new(MemoryVectorStore::new()),
            DEFAULT_CHUNK_SIZE,
        )
    }

    pub fn runtime(&self) -> &Arc<dyn PartitionRuntime> {
        &self.runtime
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Default chunk size for new vectors.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Store a vector of values using a specific chunk size.
    pub fn vector_from_values(&self, values: &[f64], chunk_size: usize) -> Result<VectorRef> {
        let vector = PartitionedVector::from_values(self.store.clone(), values, chunk_size)?;
        Ok(vector.into())
    }

    /// Store a vector of zeros using the default chunk size.
    pub fn zeros(&self, len: usize) -> Result<VectorRef> {
        let vector = PartitionedVector::zeros(self.store.clone(), len, self.chunk_size)?;
        Ok(vector.into())
    }
}
