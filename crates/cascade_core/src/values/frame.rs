use std::sync::Arc;

use cascade_error::{CascadeError, ErrorKind, Result};
use indexmap::IndexMap;

use crate::vectors::VectorRef;
use crate::vectors::layout::ChunkLayout;

/// Ordered set of named, conformed vectors.
#[derive(Debug, Clone)]
pub struct Frame {
    columns: Arc<IndexMap<Arc<str>, VectorRef>>,
}

impl Frame {
    /// Create a new frame from named columns.
    ///
    /// Column names must be unique, and all columns must share the same chunk
    /// layout.
    pub fn try_new<N>(columns: impl IntoIterator<Item = (N, VectorRef)>) -> Result<Self>
    where
        N: Into<Arc<str>>,
    {
        let mut map: IndexMap<Arc<str>, VectorRef> = IndexMap::new();
        let mut layout: Option<ChunkLayout> = None;

        for (name, vector) in columns {
            let name = name.into();

            let expected = layout.get_or_insert_with(|| vector.layout().clone());
            if !expected.conforms(vector.layout()) {
                return Err(CascadeError::with_kind(
                    ErrorKind::ChunkConformance,
                    "Frame columns must share chunk boundaries",
                )
                .with_field("column", name)
                .with_field("expected_len", expected.len())
                .with_field("len", vector.len()));
            }

            if map.contains_key(&name) {
                return Err(
                    CascadeError::with_kind(ErrorKind::TypeMismatch, "Duplicate frame column")
                        .with_field("column", name),
                );
            }
            map.insert(name, vector);
        }

        Ok(Frame {
            columns: Arc::new(map),
        })
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows, zero for a frame without columns.
    pub fn num_rows(&self) -> usize {
        self.columns.values().next().map(|v| v.len()).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&VectorRef> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| &**k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VectorRef)> {
        self.columns.iter().map(|(k, v)| (&**k, v))
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.columns, &other.columns) {
            return true;
        }
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|((n1, v1), (n2, v2))| n1 == n2 && v1.ptr_eq(v2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::context::ExecutionContext;

    #[test]
    fn frame_of_conformed_columns() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0, 2.0, 3.0], 2).unwrap();
        let b = ctx.vector_from_values(&[4.0, 5.0, 6.0], 2).unwrap();

        let frame = Frame::try_new([("a", a), ("b", b)]).unwrap();
        assert_eq!(2, frame.num_columns());
        assert_eq!(3, frame.num_rows());
        assert_eq!(vec!["a", "b"], frame.column_names().collect::<Vec<_>>());
        assert!(frame.column("c").is_none());
    }

    #[test]
    fn frame_rejects_unconformed_columns() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0, 2.0, 3.0], 2).unwrap();
        let b = ctx.vector_from_values(&[4.0, 5.0, 6.0], 3).unwrap();

        let err = Frame::try_new([("a", a), ("b", b)]).unwrap_err();
        assert_eq!(ErrorKind::ChunkConformance, err.kind());
    }

    #[test]
    fn frame_rejects_duplicate_names() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0], 1).unwrap();

        let err = Frame::try_new([("a", a.clone()), ("a", a)]).unwrap_err();
        assert_eq!(Some("a"), err.field("column"));
    }
}
