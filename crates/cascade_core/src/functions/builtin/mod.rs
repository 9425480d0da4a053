pub mod aggregate;
pub mod binary;
pub mod frame;
pub mod unary;
pub mod vector;

use std::sync::Arc;

use cascade_error::{CascadeError, ErrorKind, Result};

use super::{Function, FunctionRef};
use crate::ast::{ApplyExpr, Expr};
use crate::eval::env::Env;
use crate::execution::context::ExecutionContext;
use crate::values::{Value, type_mismatch};
use crate::vectors::derived::DerivedVector;

/// Name of the variable bound to each element when a scalar function is
/// broadcast over a vector.
const BROADCAST_VAR: &str = "x";

/// All builtin functions.
pub fn builtin_functions() -> Vec<FunctionRef> {
    let mut funcs: Vec<FunctionRef> = Vec::new();

    funcs.extend(binary::BINARY_FUNCTIONS.iter().map(|f| Arc::new(*f) as FunctionRef));
    funcs.extend(unary::UNARY_FUNCTIONS.iter().map(|f| Arc::new(*f) as FunctionRef));
    funcs.push(Arc::new(unary::IsNa));
    funcs.extend(aggregate::AGGREGATE_FUNCTIONS.iter().map(|f| Arc::new(*f) as FunctionRef));
    funcs.push(Arc::new(vector::Map));
    funcs.push(Arc::new(vector::Materialize));
    funcs.push(Arc::new(vector::Nrow));
    funcs.push(Arc::new(frame::MakeFrame));
    funcs.push(Arc::new(frame::Col));
    funcs.push(Arc::new(frame::Ncol));

    funcs
}

/// Create a root environment with every builtin bound by name.
pub fn builtin_env(context: ExecutionContext) -> Env {
    Env::with_bindings(
        context,
        builtin_functions()
            .into_iter()
            .map(|f| (Arc::<str>::from(f.name()), Value::Function(f))),
    )
}

/// Check that every argument is a number, missing, or a vector.
fn check_numeric_operands(func: &str, args: &[Value]) -> Result<()> {
    for (idx, arg) in args.iter().enumerate() {
        match arg {
            Value::Number(_) | Value::Missing | Value::Vector(_) => (),
            other => {
                return Err(type_mismatch("number or vector", other)
                    .with_field("function", func)
                    .with_field("argument", idx));
            }
        }
    }
    Ok(())
}

/// Broadcast a scalar function over the single vector argument in `args`.
///
/// Returns None if no argument is a vector. Otherwise returns a derived vector
/// applying `func` to each element, with every other argument held constant.
/// The function is only moved into a shared reference when broadcasting.
fn try_broadcast<F>(func: &F, args: &[Value], ctx: &ExecutionContext) -> Result<Option<Value>>
where
    F: Function + Copy + 'static,
{
    let mut source = None;
    for (idx, arg) in args.iter().enumerate() {
        if let Value::Vector(v) = arg {
            if source.is_some() {
                return Err(CascadeError::with_kind(
                    ErrorKind::TypeMismatch,
                    "Expected at most one vector operand",
                )
                .with_field("function", func.name()));
            }
            source = Some((idx, v.clone()));
        }
    }

    let Some((vector_idx, source)) = source else {
        return Ok(None);
    };

    let formula_args = args
        .iter()
        .enumerate()
        .map(|(idx, arg)| {
            if idx == vector_idx {
                Arc::new(Expr::Identifier(BROADCAST_VAR.into()))
            } else {
                Arc::new(Expr::Literal(arg.clone()))
            }
        })
        .collect();

    let formula = Expr::Apply(ApplyExpr {
        head: Arc::new(Expr::Literal(Value::Function(Arc::new(*func)))),
        args: formula_args,
    });

    let derived = DerivedVector::try_new(
        source,
        Arc::new(formula),
        BROADCAST_VAR,
        Env::new(ctx.clone()),
    )?;

    Ok(Some(Value::Vector(derived.into())))
}
