pub mod builtin;
pub mod closure;

use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

use cascade_error::{CascadeError, ErrorKind, Result};
use closure::Closure;

use crate::execution::context::ExecutionContext;
use crate::values::Value;

pub type FunctionRef = Arc<dyn Function>;

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// Maximum number of arguments, None if unbounded.
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Arity {
            min: n,
            max: Some(n),
        }
    }

    pub const fn at_least(n: usize) -> Self {
        Arity { min: n, max: None }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Arity {
            min,
            max: Some(max),
        }
    }

    pub const fn accepts(&self, num_args: usize) -> bool {
        if num_args < self.min {
            return false;
        }
        match self.max {
            Some(max) => num_args <= max,
            None => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{} to {max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// A callable value.
///
/// Functions are stateless and shared across threads. They must not mutate
/// their arguments.
pub trait Function: Debug + Sync + Send {
    fn name(&self) -> &str;

    fn arity(&self) -> Arity;

    /// Call the function.
    ///
    /// The number of arguments has already been checked against `arity`.
    fn call(&self, ctx: &ExecutionContext, args: Vec<Value>) -> Result<Value>;

    /// Returns the closure if this function was created from a lambda.
    fn as_closure(&self) -> Option<&Closure> {
        None
    }
}

/// Check that a function accepts some number of arguments.
pub fn check_arity(func: &dyn Function, num_args: usize) -> Result<()> {
    let arity = func.arity();
    if !arity.accepts(num_args) {
        return Err(CascadeError::with_kind(
            ErrorKind::ArityMismatch,
            "Wrong number of arguments",
        )
        .with_field("function", func.name())
        .with_field("expected", arity)
        .with_field("actual", num_args));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_accepts() {
        assert!(Arity::exact(2).accepts(2));
        assert!(!Arity::exact(2).accepts(1));
        assert!(!Arity::exact(2).accepts(3));
        assert!(Arity::at_least(2).accepts(100));
        assert!(Arity::between(1, 3).accepts(3));
        assert!(!Arity::between(1, 3).accepts(0));
    }

    #[test]
    fn arity_display() {
        assert_eq!("2", Arity::exact(2).to_string());
        assert_eq!("1 to 3", Arity::between(1, 3).to_string());
        assert_eq!("at least 2", Arity::at_least(2).to_string());
    }
}
