use std::ops::Range;
use std::sync::Arc;

use cascade_error::{CascadeError, ErrorKind, Result};

/// Chunk boundaries of a vector.
///
/// Chunks cover disjoint, contiguous ranges whose union is `0..len`. Two
/// vectors with equal layouts are conformed and may be processed by a single
/// map task.
#[derive(Debug, Clone)]
pub struct ChunkLayout {
    /// Start offset of every chunk.
    starts: Arc<[usize]>,
    /// Total number of elements.
    len: usize,
}

impl ChunkLayout {
    /// Create a layout with fixed size chunks. The last chunk may be shorter.
    pub fn uniform(len: usize, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(CascadeError::with_kind(
                ErrorKind::Config,
                "Chunk size must be greater than zero",
            ));
        }

        let starts: Arc<[usize]> = (0..len).step_by(chunk_size).collect();
        Ok(ChunkLayout { starts, len })
    }

    /// Create a layout from explicit chunk lengths.
    ///
    /// Empty chunks are not allowed.
    pub fn from_chunk_lens(lens: impl IntoIterator<Item = usize>) -> Result<Self> {
        let mut starts = Vec::new();
        let mut len = 0;

        for (idx, chunk_len) in lens.into_iter().enumerate() {
            if chunk_len == 0 {
                return Err(
                    CascadeError::with_kind(ErrorKind::Config, "Chunks must not be empty")
                        .with_field("chunk", idx),
                );
            }
            starts.push(len);
            len += chunk_len;
        }

        Ok(ChunkLayout {
            starts: starts.into(),
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunk_count(&self) -> usize {
        self.starts.len()
    }

    /// Global index range covered by a chunk.
    pub fn chunk_bounds(&self, chunk_idx: usize) -> Result<Range<usize>> {
        let start = *self.starts.get(chunk_idx).ok_or_else(|| {
            CascadeError::with_kind(ErrorKind::OutOfRange, "Chunk index out of bounds")
                .with_field("chunk", chunk_idx)
                .with_field("chunk_count", self.chunk_count())
        })?;
        let end = self.starts.get(chunk_idx + 1).copied().unwrap_or(self.len);

        Ok(start..end)
    }

    pub fn chunk_len(&self, chunk_idx: usize) -> Result<usize> {
        self.chunk_bounds(chunk_idx).map(|r| r.len())
    }

    /// Find the chunk containing a global index.
    pub fn chunk_for_index(&self, idx: usize) -> Option<usize> {
        if idx >= self.len {
            return None;
        }
        // Number of chunks starting at or before idx, minus one.
        Some(self.starts.partition_point(|&start| start <= idx) - 1)
    }

    /// Indices of chunks overlapping a global range.
    ///
    /// The range must be in bounds.
    pub fn chunks_overlapping(&self, range: Range<usize>) -> Range<usize> {
        if range.is_empty() {
            return 0..0;
        }
        match (
            self.chunk_for_index(range.start),
            self.chunk_for_index(range.end - 1),
        ) {
            (Some(first), Some(last)) => first..(last + 1),
            _ => 0..0,
        }
    }

    /// Check that a range lies within `0..len`.
    pub fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end || range.end > self.len {
            return Err(
                CascadeError::with_kind(ErrorKind::OutOfRange, "Range out of bounds")
                    .with_field("start", range.start)
                    .with_field("end", range.end)
                    .with_field("len", self.len),
            );
        }
        Ok(())
    }

    /// Returns true if both layouts have identical lengths and chunk boundaries.
    pub fn conforms(&self, other: &ChunkLayout) -> bool {
        if Arc::ptr_eq(&self.starts, &other.starts) {
            return self.len == other.len;
        }
        self.len == other.len && self.starts == other.starts
    }
}

impl PartialEq for ChunkLayout {
    fn eq(&self, other: &Self) -> bool {
        self.conforms(other)
    }
}

impl Eq for ChunkLayout {}
