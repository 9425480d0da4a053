use cascade_error::{CascadeError, ErrorKind, Result};

use crate::execution::context::ExecutionContext;
use crate::functions::{Arity, Function};
use crate::values::Value;
use crate::values::frame::Frame;

/// Build a frame from alternating names and vectors.
///
/// `(frame "a" v1 "b" v2)`
#[derive(Debug, Clone, Copy)]
pub struct MakeFrame;

impl Function for MakeFrame {
    fn name(&self) -> &str {
        "frame"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(2)
    }

    fn call(&self, _ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        if args.len() % 2 != 0 {
            return Err(CascadeError::with_kind(
                ErrorKind::ArityMismatch,
                "Expected name and vector pairs",
            )
            .with_field("function", self.name())
            .with_field("expected", "an even number")
            .with_field("actual", args.len()));
        }

        let columns = args
            .chunks_exact(2)
            .map(|pair| -> Result<_> {
                let name = pair[0].try_as_text()?;
                let vector = pair[1]
                    .try_as_vector()
                    .map_err(|e| e.with_field("column", name))?;
                Ok((name, vector.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Value::Frame(Frame::try_new(columns)?))
    }
}

/// Get a column from a frame by name.
#[derive(Debug, Clone, Copy)]
pub struct Col;

impl Function for Col {
    fn name(&self) -> &str {
        "col"
    }

    fn arity(&self) -> Arity {
        Arity::exact(2)
    }

    fn call(&self, _ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        let frame = args[0].try_as_frame()?;
        let name = args[1].try_as_text()?;

        let column = frame.column(name).ok_or_else(|| {
            CascadeError::with_kind(ErrorKind::TypeMismatch, "Unknown frame column")
                .with_field("column", name)
        })?;

        Ok(Value::Vector(column.clone()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ncol;

impl Function for Ncol {
    fn name(&self) -> &str {
        "ncol"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn call(&self, _ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        let frame = args[0].try_as_frame()?;
        Ok(Value::Number(frame.num_columns() as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{call, ident, lit};
    use crate::eval::evaluate;
    use crate::functions::builtin::builtin_env;

    #[test]
    fn build_and_read_frame() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0, 2.0, 3.0], 2).unwrap();
        let b = ctx.vector_from_values(&[4.0, 5.0, 6.0], 2).unwrap();
        let env = builtin_env(ctx)
            .bind("a", Value::Vector(a))
            .bind("b", Value::Vector(b.clone()));

        let frame = call("frame", [lit("a"), ident("a"), lit("b"), ident("b")]);
        let env = env.bind("f", evaluate(&frame, &env).unwrap());

        assert_eq!(Value::from(2.0), evaluate(&call("ncol", [ident("f")]), &env).unwrap());
        assert_eq!(Value::from(3.0), evaluate(&call("nrow", [ident("f")]), &env).unwrap());

        let col = evaluate(&call("col", [ident("f"), lit("b")]), &env).unwrap();
        assert_eq!(Value::Vector(b), col);
    }

    #[test]
    fn unknown_column() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0], 1).unwrap();
        let frame = Frame::try_new([("a", a)]).unwrap();

        let err = Col
            .call(&ctx, vec![Value::Frame(frame), Value::from("z")])
            .unwrap_err();
        assert_eq!(ErrorKind::TypeMismatch, err.kind());
        assert_eq!(Some("z"), err.field("column"));
    }

    #[test]
    fn odd_argument_count() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0], 1).unwrap();

        let err = MakeFrame
            .call(&ctx, vec![Value::from("a"), Value::Vector(a), Value::from("b")])
            .unwrap_err();
        assert_eq!(ErrorKind::ArityMismatch, err.kind());
        assert_eq!(Some("an even number"), err.field("expected"));
        assert_eq!(Some("3"), err.field("actual"));
    }

    #[test]
    fn unconformed_columns() {
        let ctx = ExecutionContext::inline();
        let a = ctx.vector_from_values(&[1.0, 2.0], 1).unwrap();
        let b = ctx.vector_from_values(&[1.0, 2.0], 2).unwrap();

        let err = MakeFrame
            .call(
                &ctx,
                vec![Value::from("a"), Value::Vector(a), Value::from("b"), Value::Vector(b)],
            )
            .unwrap_err();
        assert_eq!(ErrorKind::ChunkConformance, err.kind());
    }
}
