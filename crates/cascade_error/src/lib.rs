//! Error type shared by all cascade crates.
//!
//! A single error struct carries a kind, a message, a list of context fields
//! and an optional source. Most errors are built with [`CascadeError::new`] or
//! [`CascadeError::with_kind`] followed by calls to
//! [`CascadeError::with_field`].

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

pub type Result<T, E = CascadeError> = std::result::Result<T, E>;

/// Broad category of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The head of an application did not evaluate to a function.
    NotCallable,
    /// A function received a number of arguments outside its declared range.
    ArityMismatch,
    /// An identifier had no binding in the environment.
    UnresolvedIdentifier,
    /// A value of the wrong variant was received or produced.
    TypeMismatch,
    /// Vectors passed to a single map task had differing lengths or chunk
    /// boundaries.
    ChunkConformance,
    /// A per-chunk computation failed.
    ChunkCompute,
    /// No worker could be assigned to run partitions.
    Scheduling,
    /// A requested index range fell outside a vector.
    OutOfRange,
    /// Invalid configuration value or setting name.
    Config,
    /// Everything else.
    Internal,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotCallable => "NotCallable",
            Self::ArityMismatch => "ArityMismatch",
            Self::UnresolvedIdentifier => "UnresolvedIdentifier",
            Self::TypeMismatch => "TypeMismatch",
            Self::ChunkConformance => "ChunkConformance",
            Self::ChunkCompute => "ChunkCompute",
            Self::Scheduling => "Scheduling",
            Self::OutOfRange => "OutOfRange",
            Self::Config => "Config",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct CascadeError {
    // Boxed to keep `Result<T>` small on the hot evaluation paths.
    inner: Box<CascadeErrorInner>,
}

#[derive(Debug)]
struct CascadeErrorInner {
    kind: ErrorKind,
    msg: Cow<'static, str>,
    fields: Vec<(Cow<'static, str>, String)>,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl CascadeError {
    /// Create a new internal error.
    pub fn new(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::with_kind(ErrorKind::Internal, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<Cow<'static, str>>) -> Self {
        CascadeError {
            inner: Box::new(CascadeErrorInner {
                kind,
                msg: msg.into(),
                fields: Vec::new(),
                source: None,
            }),
        }
    }

    /// Create a new internal error wrapping some source error.
    pub fn with_source(
        msg: impl Into<Cow<'static, str>>,
        source: Box<dyn Error + Send + Sync>,
    ) -> Self {
        Self::new(msg).caused_by(source)
    }

    /// Set the source of this error, replacing any existing source.
    pub fn caused_by(mut self, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        self.inner.source = Some(source.into());
        self
    }

    /// Attach a context field to the error.
    ///
    /// Fields are displayed in insertion order.
    pub fn with_field(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl fmt::Display,
    ) -> Self {
        self.inner.fields.push((key.into(), value.to_string()));
        self
    }

    /// Attach a context field only if a field with the same key isn't already
    /// present.
    pub fn with_field_if_absent(
        self,
        key: impl Into<Cow<'static, str>>,
        value: impl fmt::Display,
    ) -> Self {
        let key = key.into();
        if self.field(&key).is_some() {
            return self;
        }
        self.with_field(key, value)
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn message(&self) -> &str {
        &self.inner.msg
    }

    /// Get the value of a context field.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.inner
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .fields
            .iter()
            .map(|(k, v)| (&**k, v.as_str()))
    }

    /// Get the kind of the innermost cascade error in the source chain.
    ///
    /// Useful when an error has been wrapped, e.g. a type mismatch surfacing
    /// through a failed chunk computation.
    pub fn root_kind(&self) -> ErrorKind {
        let mut kind = self.kind();
        let mut source = self.source();
        while let Some(err) = source {
            if let Some(err) = err.downcast_ref::<CascadeError>() {
                kind = err.kind();
            }
            source = err.source();
        }
        kind
    }
}

impl fmt::Display for CascadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.msg)?;
        for (key, value) in &self.inner.fields {
            write!(f, "\n  {key}: {value}")?;
        }
        if let Some(source) = &self.inner.source {
            write!(f, "\nCaused by: {source}")?;
        }
        Ok(())
    }
}

impl Error for CascadeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// Wrap foreign errors with a message.
pub trait ResultExt<T, E> {
    fn context(self, msg: &'static str) -> Result<T>;

    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| CascadeError::with_source(msg, Box::new(e)))
    }

    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| CascadeError::with_source(f(), Box::new(e)))
    }
}

pub trait OptionExt<T> {
    /// Return an internal error if the option is None.
    fn required(self, what: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, what: &'static str) -> Result<T> {
        self.ok_or_else(|| CascadeError::new(format!("Missing required value: {what}")))
    }
}
