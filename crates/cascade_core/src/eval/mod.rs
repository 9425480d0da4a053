pub mod env;

use std::sync::Arc;

use cascade_error::{CascadeError, ErrorKind, Result};
use env::Env;

use crate::ast::{ApplyExpr, Expr};
use crate::functions::closure::Closure;
use crate::functions::{Function, check_arity};
use crate::values::Value;

/// Evaluate an expression in an environment.
///
/// Evaluation is recursive and aborts on the first error. Evaluation itself
/// never mutates the expression or the environment, so the same expression may
/// be evaluated concurrently from many threads.
pub fn evaluate(expr: &Expr, env: &Env) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Identifier(name) => env.lookup(name).cloned().ok_or_else(|| {
            CascadeError::with_kind(ErrorKind::UnresolvedIdentifier, "Unresolved identifier")
                .with_field("identifier", name)
        }),
        Expr::Lambda(lambda) => Ok(Value::Function(Arc::new(Closure::new(
            lambda.param.clone(),
            lambda.body.clone(),
            env.clone(),
        )))),
        Expr::Apply(apply) => evaluate_apply(expr, apply, env),
    }
}

fn evaluate_apply(expr: &Expr, apply: &ApplyExpr, env: &Env) -> Result<Value> {
    let func = match evaluate(&apply.head, env)? {
        Value::Function(func) => func,
        other => {
            return Err(
                CascadeError::with_kind(ErrorKind::NotCallable, "Head is not callable")
                    .with_field("head", &apply.head)
                    .with_field("got", other.variant_name())
                    .with_field("node", expr),
            );
        }
    };

    // Arguments are evaluated strictly left to right, each one completing
    // before the next begins.
    let mut args = Vec::with_capacity(apply.args.len());
    for arg in &apply.args {
        args.push(evaluate(arg, env)?);
    }

    call_function(func.as_ref(), env, args).map_err(|e| e.with_field_if_absent("node", expr))
}

/// Arity check then invoke a function with already evaluated arguments.
pub fn call_function(func: &dyn Function, env: &Env, args: Vec<Value>) -> Result<Value> {
    check_arity(func, args.len())?;
    func.call(env.context(), args)
        .map_err(|e| e.with_field_if_absent("function", func.name()))
}
