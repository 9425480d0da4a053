use std::sync::Arc;

use ahash::RandomState;
use hashbrown::HashMap;

use crate::execution::context::ExecutionContext;
use crate::values::Value;

const ENV_RANDOM_STATE: RandomState = RandomState::with_seeds(1, 2, 3, 4);

/// Name bindings visible to an expression.
///
/// Environments are persistent: binding a name returns a new environment
/// layered on top of the existing one, which is never modified. Cloning is
/// cheap.
#[derive(Debug, Clone)]
pub struct Env {
    scope: Arc<Scope>,
}

#[derive(Debug)]
enum Scope {
    Root {
        context: ExecutionContext,
        bindings: HashMap<Arc<str>, Value, RandomState>,
    },
    Bind {
        name: Arc<str>,
        value: Value,
        parent: Arc<Scope>,
    },
}

impl Env {
    /// Create an environment with no bindings.
    pub fn new(context: ExecutionContext) -> Self {
        Self::with_bindings(context, std::iter::empty::<(Arc<str>, Value)>())
    }

    pub fn with_bindings<N>(
        context: ExecutionContext,
        bindings: impl IntoIterator<Item = (N, Value)>,
    ) -> Self
    where
        N: Into<Arc<str>>,
    {
        let mut map = HashMap::with_hasher(ENV_RANDOM_STATE);
        map.extend(bindings.into_iter().map(|(name, value)| (name.into(), value)));

        Env {
            scope: Arc::new(Scope::Root {
                context,
                bindings: map,
            }),
        }
    }

    /// Return a new environment with `name` bound to `value`, shadowing any
    /// existing binding.
    pub fn bind(&self, name: impl Into<Arc<str>>, value: Value) -> Env {
        Env {
            scope: Arc::new(Scope::Bind {
                name: name.into(),
                value,
                parent: self.scope.clone(),
            }),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut scope: &Scope = &self.scope;
        loop {
            match scope {
                Scope::Root { bindings, .. } => return bindings.get(name),
                Scope::Bind {
                    name: bound,
                    value,
                    parent,
                } => {
                    if &**bound == name {
                        return Some(value);
                    }
                    scope = parent;
                }
            }
        }
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Context shared by everything evaluated in this environment.
    pub fn context(&self) -> &ExecutionContext {
        let mut scope: &Scope = &self.scope;
        loop {
            match scope {
                Scope::Root { context, .. } => return context,
                Scope::Bind { parent, .. } => scope = parent,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_shadow() {
        let root = Env::with_bindings(ExecutionContext::inline(), [("a", Value::from(1.0))]);
        let child = root.bind("b", Value::from(2.0));
        let shadowed = child.bind("a", Value::from(3.0));

        assert_eq!(Some(&Value::from(1.0)), root.lookup("a"));
        assert_eq!(None, root.lookup("b"));
        assert_eq!(Some(&Value::from(2.0)), child.lookup("b"));
        assert_eq!(Some(&Value::from(3.0)), shadowed.lookup("a"));
        assert_eq!(Some(&Value::from(2.0)), shadowed.lookup("b"));
        assert!(!shadowed.is_bound("c"));
    }

    #[test]
    fn context_reachable_from_child() {
        let root = Env::new(ExecutionContext::inline());
        let child = root.bind("x", Value::Missing).bind("y", Value::Missing);
        assert_eq!(root.context().chunk_size(), child.context().chunk_size());
    }
}
