use std::ops::Range;
use std::sync::Arc;

use cascade_error::{CascadeError, ErrorKind, Result};

use super::chunk::Chunk;
use super::layout::ChunkLayout;
use super::store::{VectorKey, VectorStore};

/// Handle to a vector whose chunks are held by a vector store.
///
/// The vector is removed from the store when the handle is dropped.
#[derive(Debug)]
pub struct PartitionedVector {
    store: Arc<dyn VectorStore>,
    key: VectorKey,
    layout: ChunkLayout,
}

impl PartitionedVector {
    /// Create a new vector from a slice of values, chunked with a fixed chunk
    /// size.
    pub fn from_values(
        store: Arc<dyn VectorStore>,
        values: &[f64],
        chunk_size: usize,
    ) -> Result<Self> {
        let layout = ChunkLayout::uniform(values.len(), chunk_size)?;
        Self::from_values_with_layout(store, values, layout)
    }

    pub fn from_values_with_layout(
        store: Arc<dyn VectorStore>,
        values: &[f64],
        layout: ChunkLayout,
    ) -> Result<Self> {
        if values.len() != layout.len() {
            return Err(CascadeError::with_kind(
                ErrorKind::Internal,
                "Number of values does not match layout length",
            )
            .with_field("values", values.len())
            .with_field("layout_len", layout.len()));
        }
        let key = store.allocate(&layout)?;
        // Constructed before writing so the allocation is released on error.
        let vector = PartitionedVector { store, key, layout };

        for chunk_idx in 0..vector.layout.chunk_count() {
            let bounds = vector.layout.chunk_bounds(chunk_idx)?;
            vector
                .store
                .write_chunk(&key, chunk_idx, values[bounds].to_vec())?;
        }

        Ok(vector)
    }

    /// Create a vector of zeros.
    pub fn zeros(store: Arc<dyn VectorStore>, len: usize, chunk_size: usize) -> Result<Self> {
        let layout = ChunkLayout::uniform(len, chunk_size)?;
        let key = store.allocate(&layout)?;
        let vector = PartitionedVector { store, key, layout };

        for chunk_idx in 0..vector.layout.chunk_count() {
            let chunk_len = vector.layout.chunk_len(chunk_idx)?;
            vector
                .store
                .write_chunk(&key, chunk_idx, vec![0.0; chunk_len])?;
        }

        Ok(vector)
    }

    /// Wrap a vector whose chunks have all been written.
    pub(crate) fn from_written(
        store: Arc<dyn VectorStore>,
        key: VectorKey,
        layout: ChunkLayout,
    ) -> Self {
        PartitionedVector { store, key, layout }
    }

    pub fn key(&self) -> &VectorKey {
        &self.key
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.layout.chunk_count()
    }

    pub fn chunk_bounds(&self, chunk_idx: usize) -> Result<Range<usize>> {
        self.layout.chunk_bounds(chunk_idx)
    }

    pub fn read_chunk(&self, chunk_idx: usize) -> Result<Chunk> {
        let bounds = self.layout.chunk_bounds(chunk_idx)?;
        let data = self.store.read_chunk(&self.key, chunk_idx)?;
        Ok(Chunk::new(chunk_idx, bounds.start, data))
    }

    /// Read the values in a range.
    pub fn read_range(&self, range: Range<usize>) -> Result<Vec<f64>> {
        self.layout.check_range(&range)?;
        let mut out = Vec::with_capacity(range.len());

        for chunk_idx in self.layout.chunks_overlapping(range.clone()) {
            let chunk = self.read_chunk(chunk_idx)?;
            let start = range.start.max(chunk.offset()) - chunk.offset();
            let end = range.end.min(chunk.global_range().end) - chunk.offset();
            out.extend_from_slice(&chunk.values()[start..end]);
        }

        Ok(out)
    }
}

impl Drop for PartitionedVector {
    fn drop(&mut self) {
        self.store.remove(&self.key);
    }
}
