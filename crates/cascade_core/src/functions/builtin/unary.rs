use cascade_error::Result;

use super::{check_numeric_operands, try_broadcast};
use crate::execution::context::ExecutionContext;
use crate::functions::{Arity, Function};
use crate::values::Value;

pub const FUNCTION_NEG: UnaryNumeric = UnaryNumeric::new("neg", |v| -v);
pub const FUNCTION_ABS: UnaryNumeric = UnaryNumeric::new("abs", f64::abs);
pub const FUNCTION_SQRT: UnaryNumeric = UnaryNumeric::new("sqrt", f64::sqrt);
pub const FUNCTION_EXP: UnaryNumeric = UnaryNumeric::new("exp", f64::exp);
pub const FUNCTION_LOG: UnaryNumeric = UnaryNumeric::new("log", f64::ln);

pub const UNARY_FUNCTIONS: &[UnaryNumeric] = &[
    FUNCTION_NEG,
    FUNCTION_ABS,
    FUNCTION_SQRT,
    FUNCTION_EXP,
    FUNCTION_LOG,
];

/// Function of one number producing a number.
#[derive(Debug, Clone, Copy)]
pub struct UnaryNumeric {
    name: &'static str,
    op: fn(f64) -> f64,
}

impl UnaryNumeric {
    pub const fn new(name: &'static str, op: fn(f64) -> f64) -> Self {
        UnaryNumeric { name, op }
    }
}

impl Function for UnaryNumeric {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn call(&self, ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        check_numeric_operands(self.name, &args)?;

        if let Some(broadcast) = try_broadcast(self, &args, ctx)? {
            return Ok(broadcast);
        }

        match &args[0] {
            Value::Number(v) => Ok(Value::Number((self.op)(*v))),
            _ => Ok(Value::Missing),
        }
    }
}

/// Returns 1 for missing or NaN values, 0 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct IsNa;

impl Function for IsNa {
    fn name(&self) -> &str {
        "is_na"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn call(&self, ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        check_numeric_operands(self.name(), &args)?;

        if let Some(broadcast) = try_broadcast(self, &args, ctx)? {
            return Ok(broadcast);
        }

        let is_na = match &args[0] {
            Value::Number(v) => v.is_nan(),
            _ => true,
        };
        Ok(Value::Number(if is_na { 1.0 } else { 0.0 }))
    }
}
