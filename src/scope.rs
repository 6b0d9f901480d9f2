use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{RtResult, RuntimeError};
use crate::value::Value;

pub type Scope = Rc<RefCell<Environment>>;

/// Variable bindings for one lexical scope. Every store goes through
/// `copy_for_binding`, so a binding never aliases a value type.
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Scope) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// A fresh scope nested in `parent`, e.g. for a function body
    pub fn child(parent: &Scope) -> Scope {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(parent))))
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value.copy_for_binding());
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.copy_for_binding());
        }
        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }
        None
    }

    pub fn lookup(&self, name: &str) -> RtResult<Value> {
        self.get(name).ok_or_else(|| RuntimeError::NameNotFound {
            name: name.to_string(),
        })
    }

    /// Rebind an existing name in the nearest scope that holds it.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value.copy_for_binding());
            return true;
        }
        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }
        false
    }

    /// Names bound directly in this scope, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
