pub mod chunk;
pub mod derived;
pub mod layout;
pub mod partitioned;
pub mod store;

use std::ops::Range;
use std::sync::Arc;

use cascade_error::Result;
use chunk::Chunk;
use derived::DerivedVector;
use layout::ChunkLayout;
use partitioned::PartitionedVector;

/// Shared reference to either a stored or a derived vector.
#[derive(Debug, Clone)]
pub enum VectorRef {
    Stored(Arc<PartitionedVector>),
    Derived(Arc<DerivedVector>),
}

impl VectorRef {
    pub fn layout(&self) -> &ChunkLayout {
        match self {
            Self::Stored(v) => v.layout(),
            Self::Derived(v) => v.layout(),
        }
    }

    pub fn len(&self) -> usize {
        self.layout().len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout().is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.layout().chunk_count()
    }

    pub fn chunk_bounds(&self, chunk_idx: usize) -> Result<Range<usize>> {
        self.layout().chunk_bounds(chunk_idx)
    }

    /// Returns true if elements of this vector are computed on access.
    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Derived(_))
    }

    /// Read a single chunk, computing it if the vector is derived.
    pub fn read_chunk(&self, chunk_idx: usize) -> Result<Chunk> {
        match self {
            Self::Stored(v) => v.read_chunk(chunk_idx),
            Self::Derived(v) => v.materialize_chunk(chunk_idx),
        }
    }

    /// Read or compute the elements in `range`.
    pub fn materialize(&self, range: Range<usize>) -> Result<Vec<f64>> {
        match self {
            Self::Stored(v) => {
                if range.is_empty() {
                    return Ok(Vec::new());
                }
                v.read_range(range)
            }
            Self::Derived(v) => v.materialize(range),
        }
    }

    pub fn ptr_eq(&self, other: &VectorRef) -> bool {
        match (self, other) {
            (Self::Stored(a), Self::Stored(b)) => Arc::ptr_eq(a, b),
            (Self::Derived(a), Self::Derived(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<PartitionedVector> for VectorRef {
    fn from(value: PartitionedVector) -> Self {
        VectorRef::Stored(Arc::new(value))
    }
}

impl From<DerivedVector> for VectorRef {
    fn from(value: DerivedVector) -> Self {
        VectorRef::Derived(Arc::new(value))
    }
}
