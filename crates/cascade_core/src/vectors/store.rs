use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

use ahash::RandomState;
use cascade_error::{CascadeError, ErrorKind, Result};
use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::trace;
use uuid::Uuid;

use super::layout::ChunkLayout;

/// Identifies a vector held by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorKey(Uuid);

impl VectorKey {
    pub fn new_random() -> Self {
        VectorKey(Uuid::new_v4())
    }
}

impl fmt::Display for VectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage for chunked vector data.
///
/// Chunks are written once and read many times. Implementations may block in
/// `read_chunk` when chunk data lives elsewhere; callers only ever block the
/// worker processing that chunk.
pub trait VectorStore: Debug + Sync + Send {
    /// Allocate a fresh vector with the given layout. No chunks are written.
    fn allocate(&self, layout: &ChunkLayout) -> Result<VectorKey>;

    /// Read the data for a written chunk.
    fn read_chunk(&self, key: &VectorKey, chunk_idx: usize) -> Result<Arc<[f64]>>;

    /// Write the data for a chunk.
    ///
    /// Data length must match the chunk's length in the layout, and each chunk
    /// may only be written once.
    fn write_chunk(&self, key: &VectorKey, chunk_idx: usize, data: Vec<f64>) -> Result<()>;

    /// Remove a vector and all its chunks. Returns false if the vector didn't
    /// exist.
    fn remove(&self, key: &VectorKey) -> bool;

    fn contains(&self, key: &VectorKey) -> bool;

    /// Number of vectors currently held.
    fn num_vectors(&self) -> usize;
}

const STORE_RANDOM_STATE: RandomState = RandomState::with_seeds(0, 0, 0, 0);

/// Vector store holding everything in process memory.
#[derive(Debug)]
pub struct MemoryVectorStore {
    vectors: RwLock<HashMap<VectorKey, StoredVector, RandomState>>,
}

#[derive(Debug)]
struct StoredVector {
    layout: ChunkLayout,
    chunks: Vec<Option<Arc<[f64]>>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        MemoryVectorStore {
            vectors: RwLock::new(HashMap::with_hasher(STORE_RANDOM_STATE)),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_vector(key: &VectorKey) -> CascadeError {
    CascadeError::new("Missing vector in store").with_field("key", key)
}

impl VectorStore for MemoryVectorStore {
    fn allocate(&self, layout: &ChunkLayout) -> Result<VectorKey> {
        let key = VectorKey::new_random();
        let stored = StoredVector {
            layout: layout.clone(),
            chunks: vec![None; layout.chunk_count()],
        };
        self.vectors.write().insert(key, stored);
        trace!(%key, chunks = layout.chunk_count(), "allocated vector");

        Ok(key)
    }

    fn read_chunk(&self, key: &VectorKey, chunk_idx: usize) -> Result<Arc<[f64]>> {
        let vectors = self.vectors.read();
        let stored = vectors.get(key).ok_or_else(|| missing_vector(key))?;

        match stored.chunks.get(chunk_idx) {
            Some(Some(data)) => Ok(data.clone()),
            Some(None) => Err(CascadeError::new("Chunk not yet written")
                .with_field("key", key)
                .with_field("chunk", chunk_idx)),
            None => Err(
                CascadeError::with_kind(ErrorKind::OutOfRange, "Chunk index out of bounds")
                    .with_field("key", key)
                    .with_field("chunk", chunk_idx),
            ),
        }
    }

    fn write_chunk(&self, key: &VectorKey, chunk_idx: usize, data: Vec<f64>) -> Result<()> {
        let mut vectors = self.vectors.write();
        let stored = vectors.get_mut(key).ok_or_else(|| missing_vector(key))?;

        let expected_len = stored.layout.chunk_len(chunk_idx)?;
        if data.len() != expected_len {
            return Err(CascadeError::new("Chunk data length does not match layout")
                .with_field("key", key)
                .with_field("chunk", chunk_idx)
                .with_field("expected", expected_len)
                .with_field("got", data.len()));
        }

        let slot = &mut stored.chunks[chunk_idx];
        if slot.is_some() {
            return Err(CascadeError::new("Chunk already written")
                .with_field("key", key)
                .with_field("chunk", chunk_idx));
        }
        *slot = Some(data.into());

        Ok(())
    }

    fn remove(&self, key: &VectorKey) -> bool {
        let removed = self.vectors.write().remove(key).is_some();
        if removed {
            trace!(%key, "removed vector");
        }
        removed
    }

    fn contains(&self, key: &VectorKey) -> bool {
        self.vectors.read().contains_key(key)
    }

    fn num_vectors(&self) -> usize {
        self.vectors.read().len()
    }
}
