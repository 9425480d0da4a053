use cascade_error::Result;

use super::{check_numeric_operands, try_broadcast};
use crate::execution::context::ExecutionContext;
use crate::functions::{Arity, Function};
use crate::values::Value;

pub const FUNCTION_ADD: BinaryNumeric = BinaryNumeric::new("+", |a, b| a + b);
pub const FUNCTION_SUB: BinaryNumeric = BinaryNumeric::new("-", |a, b| a - b);
pub const FUNCTION_MUL: BinaryNumeric = BinaryNumeric::new("*", |a, b| a * b);
pub const FUNCTION_DIV: BinaryNumeric = BinaryNumeric::new("/", |a, b| a / b);

pub const FUNCTION_LT: BinaryNumeric = BinaryNumeric::new("<", |a, b| f64::from(a < b));
pub const FUNCTION_LT_EQ: BinaryNumeric = BinaryNumeric::new("<=", |a, b| f64::from(a <= b));
pub const FUNCTION_GT: BinaryNumeric = BinaryNumeric::new(">", |a, b| f64::from(a > b));
pub const FUNCTION_GT_EQ: BinaryNumeric = BinaryNumeric::new(">=", |a, b| f64::from(a >= b));
pub const FUNCTION_EQ: BinaryNumeric = BinaryNumeric::new("==", |a, b| f64::from(a == b));
pub const FUNCTION_NOT_EQ: BinaryNumeric = BinaryNumeric::new("!=", |a, b| f64::from(a != b));

pub const BINARY_FUNCTIONS: &[BinaryNumeric] = &[
    FUNCTION_ADD,
    FUNCTION_SUB,
    FUNCTION_MUL,
    FUNCTION_DIV,
    FUNCTION_LT,
    FUNCTION_LT_EQ,
    FUNCTION_GT,
    FUNCTION_GT_EQ,
    FUNCTION_EQ,
    FUNCTION_NOT_EQ,
];

/// Function of two numbers producing a number.
///
/// A missing operand produces a missing result. If one operand is a vector,
/// the result is a derived vector applying the function element-wise.
#[derive(Debug, Clone, Copy)]
pub struct BinaryNumeric {
    name: &'static str,
    op: fn(f64, f64) -> f64,
}

impl BinaryNumeric {
    pub const fn new(name: &'static str, op: fn(f64, f64) -> f64) -> Self {
        BinaryNumeric { name, op }
    }
}

impl Function for BinaryNumeric {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        Arity::exact(2)
    }

    fn call(&self, ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value> {
        check_numeric_operands(self.name, &args)?;

        if let Some(broadcast) = try_broadcast(self, &args, ctx)? {
            return Ok(broadcast);
        }

        match (&args[0], &args[1]) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number((self.op)(*a, *b))),
            _ => Ok(Value::Missing),
        }
    }
}
