//! Expression trees.
//!
//! Trees are immutable once built. Child nodes are reference counted so
//! sub-trees can be shared between multiple derived vectors.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::values::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Identifier(Arc<str>),
    Apply(ApplyExpr),
    Lambda(LambdaExpr),
}

/// Function application, `(head arg1 arg2 ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyExpr {
    pub head: Arc<Expr>,
    pub args: Vec<Arc<Expr>>,
}

/// Single parameter function, `{ param . body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub param: Arc<str>,
    pub body: Arc<Expr>,
}

impl Expr {
    /// Collect identifiers referenced by this expression that are not bound
    /// by an enclosing lambda within the expression.
    pub fn free_identifiers(&self) -> BTreeSet<Arc<str>> {
        let mut bound = Vec::new();
        let mut free = BTreeSet::new();
        self.collect_free(&mut bound, &mut free);
        free
    }

    fn collect_free(&self, bound: &mut Vec<Arc<str>>, free: &mut BTreeSet<Arc<str>>) {
        match self {
            Self::Literal(_) => (),
            Self::Identifier(name) => {
                if !bound.contains(name) {
                    free.insert(name.clone());
                }
            }
            Self::Apply(apply) => {
                apply.head.collect_free(bound, free);
                for arg in &apply.args {
                    arg.collect_free(bound, free);
                }
            }
            Self::Lambda(lambda) => {
                bound.push(lambda.param.clone());
                lambda.body.collect_free(bound, free);
                bound.pop();
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::Identifier(name) => write!(f, "{name}"),
            Self::Apply(apply) => {
                write!(f, "({}", apply.head)?;
                for arg in &apply.args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            Self::Lambda(lambda) => write!(f, "{{ {} . {} }}", lambda.param, lambda.body),
        }
    }
}

pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

pub fn ident(name: impl Into<Arc<str>>) -> Expr {
    Expr::Identifier(name.into())
}

pub fn apply(head: impl Into<Arc<Expr>>, args: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Apply(ApplyExpr {
        head: head.into(),
        args: args.into_iter().map(Arc::new).collect(),
    })
}

/// Apply the function bound to `name` to the arguments.
pub fn call(name: impl Into<Arc<str>>, args: impl IntoIterator<Item = Expr>) -> Expr {
    apply(ident(name), args)
}

pub fn lambda(param: impl Into<Arc<str>>, body: impl Into<Arc<Expr>>) -> Expr {
    Expr::Lambda(LambdaExpr {
        param: param.into(),
        body: body.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefix_form() {
        let expr = lambda("x", call("-", [lit(1.0), ident("x")]));
        assert_eq!("{ x . (- 1 x) }", expr.to_string());
    }

    #[test]
    fn free_identifiers_exclude_lambda_params() {
        let inner = apply(lambda("x", call("*", [ident("x"), ident("z")])), [lit(2.0)]);
        let expr = call("+", [ident("y"), inner]);

        let free: Vec<_> = expr.free_identifiers().into_iter().collect();
        let expected: Vec<Arc<str>> = vec!["*".into(), "+".into(), "y".into(), "z".into()];
        assert_eq!(expected, free);
    }

    #[test]
    fn shadowed_param_stays_free_outside() {
        let expr = call("f", [ident("x"), lambda("x", ident("x"))]);
        let free = expr.free_identifiers();
        assert!(free.contains("x"));
        assert!(free.contains("f"));
    }
}
