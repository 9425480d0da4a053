use std::sync::Arc;

use cascade_error::{CascadeError, Result};

use super::BROADCAST_VAR;
use crate::ast::{ApplyExpr, Expr};
use crate::eval::env::Env;
use crate::execution::context::ExecutionContext;
use crate::execution::map_task::{ChunkMapper, ChunkOutput, MapTask};
use crate::functions::{Arity, Function, check_arity};
use crate::values::{Value, type_mismatch};
use crate::vectors::VectorRef;
use crate::vectors::chunk::Chunk;
use crate::vectors::derived::DerivedVector;

/// Apply a single argument function to every element of a vector, lazily.
///
/// `(map { x . (- 1 x) } v)`
#[derive(Debug, Clone, Copy)]
pub struct Map;

impl Function for Map {
    fn name(&self) -> &str {
        "map"
    }

    fn arity(&self) -> Arity {
        Arity::exact(2)
    }

    fn call(&self, ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        let func = args[0].try_as_function()?;
        let source = args[1].try_as_vector()?.clone();

        let derived = match func.as_closure() {
            Some(closure) => DerivedVector::from_closure(source, closure)?,
            None => {
                check_arity(func.as_ref(), 1)?;
                let formula = Expr::Apply(ApplyExpr {
                    head: Arc::new(Expr::Literal(Value::Function(func.clone()))),
                    args: vec![Arc::new(Expr::Identifier(BROADCAST_VAR.into()))],
                });
                DerivedVector::try_new(
                    source,
                    Arc::new(formula),
                    BROADCAST_VAR,
                    Env::new(ctx.clone()),
                )?
            }
        };

        Ok(Value::Vector(derived.into()))
    }
}

/// Compute every element of a vector and store the result.
#[derive(Debug, Clone, Copy)]
pub struct Materialize;

impl Materialize {
    /// Store the elements of `vector`, returning stored vectors unchanged.
    pub fn materialize_vector(ctx: &ExecutionContext, vector: VectorRef) -> Result<VectorRef> {
        if !vector.is_lazy() {
            return Ok(vector);
        }

        let out = MapTask::try_new(vec![vector])?.execute(ctx, &CopyMapper)?;
        out.vector.ok_or_else(|| {
            CascadeError::new("Map task completed without an output vector")
        })
    }
}

impl Function for Materialize {
    fn name(&self) -> &str {
        "materialize"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn call(&self, ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        let vector = args[0].try_as_vector()?.clone();
        Ok(Value::Vector(Self::materialize_vector(ctx, vector)?))
    }
}

/// Writes each input chunk unchanged.
#[derive(Debug)]
struct CopyMapper;

impl ChunkMapper for CopyMapper {
    type Partial = ();

    fn produces_output(&self) -> bool {
        true
    }

    fn map_chunk(&self, _chunk_idx: usize, chunks: &[Chunk]) -> Result<ChunkOutput<()>> {
        Ok(ChunkOutput {
            data: Some(chunks[0].values().to_vec()),
            partial: (),
        })
    }

    fn reduce(&self, _a: (), _b: ()) {}
}

/// Number of elements in a vector, or rows in a frame.
#[derive(Debug, Clone, Copy)]
pub struct Nrow;

impl Function for Nrow {
    fn name(&self) -> &str {
        "nrow"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn call(&self, _ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        let rows = match &args[0] {
            Value::Vector(v) => v.len(),
            Value::Frame(frame) => frame.num_rows(),
            other => return Err(type_mismatch("vector or frame", other)),
        };
        Ok(Value::Number(rows as f64))
    }
}
