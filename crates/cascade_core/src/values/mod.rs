pub mod frame;

use std::fmt;
use std::sync::Arc;

use cascade_error::{CascadeError, ErrorKind, Result};
use frame::Frame;

use crate::functions::FunctionRef;
use crate::vectors::VectorRef;

/// Result of evaluating any expression.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Text(Arc<str>),
    Function(FunctionRef),
    Vector(VectorRef),
    Frame(Frame),
    /// Absent value. Propagates through arithmetic like NaN.
    Missing,
}

impl Value {
    /// Name of the active variant, used in error messages.
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Function(_) => "function",
            Self::Vector(_) => "vector",
            Self::Frame(_) => "frame",
            Self::Missing => "missing",
        }
    }

    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn try_as_number(&self) -> Result<f64> {
        match self {
            Self::Number(v) => Ok(*v),
            other => Err(type_mismatch("number", other)),
        }
    }

    /// Get the numeric value, mapping `Missing` to NaN.
    pub fn try_as_number_or_nan(&self) -> Result<f64> {
        match self {
            Self::Number(v) => Ok(*v),
            Self::Missing => Ok(f64::NAN),
            other => Err(type_mismatch("number", other)),
        }
    }

    pub fn try_as_text(&self) -> Result<&str> {
        match self {
            Self::Text(s) => Ok(s),
            other => Err(type_mismatch("text", other)),
        }
    }

    pub fn try_as_function(&self) -> Result<&FunctionRef> {
        match self {
            Self::Function(f) => Ok(f),
            other => Err(type_mismatch("function", other)),
        }
    }

    pub fn try_as_vector(&self) -> Result<&VectorRef> {
        match self {
            Self::Vector(v) => Ok(v),
            other => Err(type_mismatch("vector", other)),
        }
    }

    pub fn try_as_frame(&self) -> Result<&Frame> {
        match self {
            Self::Frame(f) => Ok(f),
            other => Err(type_mismatch("frame", other)),
        }
    }
}

pub(crate) fn type_mismatch(expected: &'static str, got: &Value) -> CascadeError {
    CascadeError::with_kind(ErrorKind::TypeMismatch, "Unexpected value variant")
        .with_field("expected", expected)
        .with_field("got", got.variant_name())
}

impl PartialEq for Value {
    /// Numbers compare by value with all NaNs considered equal. Functions and
    /// vectors compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            (Self::Vector(a), Self::Vector(b)) => a.ptr_eq(b),
            (Self::Frame(a), Self::Frame(b)) => a == b,
            (Self::Missing, Self::Missing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Function(func) => write!(f, "{}", func.name()),
            Self::Vector(v) => write!(f, "<vector len={} chunks={}>", v.len(), v.chunk_count()),
            Self::Frame(frame) => {
                write!(f, "<frame cols={} rows={}>", frame.num_columns(), frame.num_rows())
            }
            Self::Missing => write!(f, "NA"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value.into())
    }
}

impl From<FunctionRef> for Value {
    fn from(value: FunctionRef) -> Self {
        Value::Function(value)
    }
}

impl From<VectorRef> for Value {
    fn from(value: VectorRef) -> Self {
        Value::Vector(value)
    }
}

impl From<Frame> for Value {
    fn from(value: Frame) -> Self {
        Value::Frame(value)
    }
}
