use std::ops::Range;
use std::sync::Arc;

use cascade_error::{CascadeError, ErrorKind, Result};

use super::VectorRef;
use super::chunk::Chunk;
use super::layout::ChunkLayout;
use crate::ast::Expr;
use crate::eval::env::Env;
use crate::eval::evaluate;
use crate::functions::closure::Closure;
use crate::values::Value;

/// A vector whose elements are computed on access.
///
/// Each element is produced by evaluating `formula` with `var` bound to the
/// source vector's element at the same index. Layout matches the source.
/// Nothing is computed when the vector is created.
#[derive(Debug)]
pub struct DerivedVector {
    source: VectorRef,
    formula: Arc<Expr>,
    var: Arc<str>,
    /// Environment the formula closes over.
    env: Env,
}

impl DerivedVector {
    /// Create a new derived vector.
    ///
    /// The formula must reference `var`, and every other identifier it
    /// references must be bound in `env`.
    pub fn try_new(
        source: VectorRef,
        formula: Arc<Expr>,
        var: impl Into<Arc<str>>,
        env: Env,
    ) -> Result<Self> {
        let var = var.into();
        let mut references_var = false;

        for name in formula.free_identifiers() {
            if name == var {
                references_var = true;
                continue;
            }
            if !env.is_bound(&name) {
                return Err(CascadeError::with_kind(
                    ErrorKind::UnresolvedIdentifier,
                    "Formula references an unbound identifier",
                )
                .with_field("identifier", name)
                .with_field("formula", &formula));
            }
        }

        if !references_var {
            return Err(CascadeError::with_kind(
                ErrorKind::TypeMismatch,
                "Formula does not reference its variable",
            )
            .with_field("variable", var)
            .with_field("formula", &formula));
        }

        Ok(DerivedVector {
            source,
            formula,
            var,
            env,
        })
    }

    /// Create a derived vector applying a closure's body to each element.
    pub fn from_closure(source: VectorRef, closure: &Closure) -> Result<Self> {
        Self::try_new(
            source,
            closure.body().clone(),
            closure.param().clone(),
            closure.env().clone(),
        )
    }

    pub fn source(&self) -> &VectorRef {
        &self.source
    }

    pub fn formula(&self) -> &Arc<Expr> {
        &self.formula
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn layout(&self) -> &ChunkLayout {
        self.source.layout()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Compute the elements in `range`.
    ///
    /// Only the elements in `range` are requested from the source, so a
    /// derived source computes nothing outside the range either.
    pub fn materialize(&self, range: Range<usize>) -> Result<Vec<f64>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        self.layout().check_range(&range)?;

        let source = self.source.materialize(range.clone())?;
        source
            .into_iter()
            .enumerate()
            .map(|(local_idx, x)| self.eval_element(range.start + local_idx, x))
            .collect()
    }

    /// Compute every element of a single chunk.
    pub fn materialize_chunk(&self, chunk_idx: usize) -> Result<Chunk> {
        let source = self.source.read_chunk(chunk_idx)?;
        let values = source
            .values()
            .iter()
            .enumerate()
            .map(|(local_idx, &x)| self.eval_element(source.offset() + local_idx, x))
            .collect::<Result<Vec<_>>>()?;

        Ok(Chunk::new(chunk_idx, source.offset(), values.into()))
    }

    fn eval_element(&self, idx: usize, x: f64) -> Result<f64> {
        // Fresh scope per element, nothing carries over between elements.
        let env = self.env.bind(self.var.clone(), Value::Number(x));
        let value =
            evaluate(&self.formula, &env).map_err(|e| e.with_field_if_absent("index", idx))?;

        match value {
            Value::Number(v) => Ok(v),
            Value::Missing => Ok(f64::NAN),
            other => Err(CascadeError::with_kind(
                ErrorKind::TypeMismatch,
                "Formula must produce a number",
            )
            .with_field("index", idx)
            .with_field("got", other.variant_name())
            .with_field("formula", &self.formula)),
        }
    }
}
