use std::ops::Range;
use std::sync::Arc;

/// Read-only view over the elements of a single chunk.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Index of this chunk in the vector's layout.
    index: usize,
    /// Global index of the first element in this chunk.
    offset: usize,
    data: Arc<[f64]>,
}

impl Chunk {
    pub fn new(index: usize, offset: usize, data: Arc<[f64]>) -> Self {
        Chunk {
            index,
            offset,
            data,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get an element by its index local to this chunk.
    pub fn get(&self, local_idx: usize) -> Option<f64> {
        self.data.get(local_idx).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Global range covered by this chunk.
    pub fn global_range(&self) -> Range<usize> {
        self.offset..(self.offset + self.data.len())
    }
}
