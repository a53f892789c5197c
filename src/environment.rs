//! Lexical scope chain.
//!
//! Each scope is shared (`Rc<RefCell<_>>`) because closures keep their
//! defining scope alive after the block or call that created it has exited,
//! and one method scope is shared by every bound copy of that method.

use crate::error::RuntimeErrorKind;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type SharedEnv = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<SharedEnv>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: SharedEnv) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_shared(self) -> SharedEnv {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<SharedEnv> {
        self.enclosing.clone()
    }

    /// Bind `name` in this scope only.  Redefinition overwrites.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up here, then outward.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeErrorKind> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(RuntimeErrorKind::UndefinedVariable(name.to_string()))
        }
    }

    /// Overwrite the nearest existing binding of `name`.  Never creates one.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeErrorKind> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeErrorKind::UndefinedVariable(name.to_string()))
        }
    }

    /// The scope exactly `depth` links out from `env`.
    pub fn ancestor(env: &SharedEnv, depth: usize) -> Option<SharedEnv> {
        let mut scope = Rc::clone(env);

        for _ in 0..depth {
            let next = scope.borrow().enclosing()?;
            scope = next;
        }

        Some(scope)
    }

    /// Read `name` from the scope `depth` links out, without searching further.
    ///
    /// The resolver has already proven where the binding lives, so a miss
    /// here means resolver and interpreter disagree about scope layout.
    pub fn get_at(env: &SharedEnv, depth: usize, name: &str) -> Result<Value, RuntimeErrorKind> {
        debug!("get_at depth={} name={}", depth, name);

        let value = Self::ancestor(env, depth).and_then(|scope| {
            let found = scope.borrow().values.get(name).cloned();
            found
        });

        debug_assert!(value.is_some(), "no '{}' at depth {}", name, depth);

        value.ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.to_string()))
    }

    pub fn assign_at(
        env: &SharedEnv,
        depth: usize,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeErrorKind> {
        debug!("assign_at depth={} name={}", depth, name);

        let scope = Self::ancestor(env, depth)
            .ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.to_string()))?;
        let mut scope = scope.borrow_mut();

        debug_assert!(scope.values.contains_key(name), "no '{}' at depth {}", name, depth);

        scope.values.insert(name.to_string(), value);

        Ok(())
    }
}

// Values may point back into the chain (closures), so only names are shown.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_enclosing", &self.enclosing.is_some())
            .finish()
    }
}
