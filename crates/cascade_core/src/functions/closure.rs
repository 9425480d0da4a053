use std::sync::Arc;

use cascade_error::{OptionExt, Result};

use super::{Arity, Function};
use crate::ast::Expr;
use crate::eval::env::Env;
use crate::eval::evaluate;
use crate::execution::context::ExecutionContext;
use crate::values::Value;

/// Function produced by evaluating a lambda.
///
/// The body is evaluated in the environment the lambda was defined in, not
/// the environment of the caller.
#[derive(Debug, Clone)]
pub struct Closure {
    param: Arc<str>,
    body: Arc<Expr>,
    env: Env,
}

impl Closure {
    pub fn new(param: Arc<str>, body: Arc<Expr>, env: Env) -> Self {
        Closure { param, body, env }
    }

    pub fn param(&self) -> &Arc<str> {
        &self.param
    }

    pub fn body(&self) -> &Arc<Expr> {
        &self.body
    }

    pub fn env(&self) -> &Env {
        &self.env
    }
}

impl Function for Closure {
    fn name(&self) -> &str {
        "lambda"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn call(&self, _ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        let arg = args.into_iter().next().required("lambda argument")?;
        let env = self.env.bind(self.param.clone(), arg);
        evaluate(&self.body, &env)
    }

    fn as_closure(&self) -> Option<&Closure> {
        Some(self)
    }
}
