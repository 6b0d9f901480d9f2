//! User-defined types and their instances.
//!
//! A `Class` owns the method table and the class-level attribute defaults.
//! An `Instance` owns its own attribute mapping; reads fall back to the class,
//! writes never do.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{RtResult, RuntimeError};
use crate::runtime::Runtime;
use crate::value::{Function, Value};

/// A class definition
#[derive(Debug)]
pub struct Class {
    pub name: String,
    methods: HashMap<String, Rc<Function>>,
    attrs: RefCell<HashMap<String, Value>>,
}

impl Class {
    pub fn builder(name: &str) -> ClassBuilder {
        ClassBuilder {
            name: name.to_string(),
            methods: HashMap::new(),
            attrs: HashMap::new(),
        }
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        self.methods.get(name).cloned()
    }

    pub fn class_attr(&self, name: &str) -> Option<Value> {
        self.attrs.borrow().get(name).map(Value::copy_for_binding)
    }

    pub fn has_class_attr(&self, name: &str) -> bool {
        self.attrs.borrow().contains_key(name)
    }

    /// Class-level write (`Type.name = value`). Visible to every instance
    /// that has not shadowed `name`.
    pub fn set_class_attr(&self, name: &str, value: Value) {
        self.attrs
            .borrow_mut()
            .insert(name.to_string(), value.copy_for_binding());
    }

    /// Attribute read on the class itself: class attributes, then the
    /// unbound method.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.class_attr(name)
            .or_else(|| self.find_method(name).map(Value::Function))
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Assembles a `Class` the way a compiled class body fills its table:
/// attribute defaults and method bodies, in declaration order.
pub struct ClassBuilder {
    name: String,
    methods: HashMap<String, Rc<Function>>,
    attrs: HashMap<String, Value>,
}

impl ClassBuilder {
    pub fn attr(mut self, name: &str, value: Value) -> Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    /// `arity` counts the receiver.
    pub fn method<F>(mut self, name: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&mut Runtime, Vec<Value>) -> RtResult<Value> + 'static,
    {
        self.methods
            .insert(name.to_string(), Rc::new(Function::new(name, arity, func)));
        self
    }

    pub fn build(self) -> Rc<Class> {
        Rc::new(Class {
            name: self.name,
            methods: self.methods,
            attrs: RefCell::new(self.attrs),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Allocated, `__init__` not finished yet
    Uninitialized,
    Initialized,
}

/// An instance of a class
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
    state: InstanceState,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
            state: InstanceState::Uninitialized,
        }
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.state = InstanceState::Initialized;
    }

    /// Instance mapping first, then the class-level defaults.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.fields.get(name) {
            Some(value) => Some(value.copy_for_binding()),
            None => self.class.class_attr(name),
        }
    }

    pub fn own_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Writes always land in the instance mapping. Returns `true` when this
    /// write is the one that starts shadowing a class attribute.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        let shadows = !self.fields.contains_key(name) && self.class.has_class_attr(name);
        self.fields.insert(name.to_string(), value);
        shadows
    }

    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        names.sort();
        names
    }
}

/// A method looked up through an instance, remembering its receiver.
#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Value,
    pub function: Rc<Function>,
}

impl BoundMethod {
    pub fn new(receiver: Value, function: Rc<Function>) -> Self {
        BoundMethod {
            receiver: receiver.copy_for_binding(),
            function,
        }
    }

    /// Arguments for the underlying function: the receiver goes first.
    pub fn bind_args(&self, args: Vec<Value>) -> Vec<Value> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(self.receiver.copy_for_binding());
        full.extend(args);
        full
    }
}

fn not_found(owner: String, attribute: &str) -> RuntimeError {
    RuntimeError::AttributeNotFound {
        owner,
        attribute: attribute.to_string(),
    }
}

/// Attribute read: instance mapping, class attributes, then methods (bound to
/// the instance).
pub fn get_attr(target: &Value, name: &str) -> RtResult<Value> {
    match target {
        Value::Object(inst) => {
            let inst = inst.borrow();
            if let Some(value) = inst.get(name) {
                return Ok(value);
            }
            match inst.class.find_method(name) {
                Some(func) => Ok(Value::Method(Rc::new(BoundMethod::new(
                    target.copy_for_binding(),
                    func,
                )))),
                None => Err(not_found(format!("'{}' object", inst.class.name), name)),
            }
        }
        Value::Type(class) => class
            .lookup(name)
            .ok_or_else(|| not_found(format!("type object '{}'", class.name), name)),
        other => Err(not_found(format!("'{}' object", other.type_name()), name)),
    }
}

/// Attribute write. On an instance it creates or overwrites the instance's
/// own entry; on a type it updates the class-level default. Returns `true`
/// when an instance starts shadowing a class attribute.
pub fn set_attr(target: &Value, name: &str, value: Value) -> RtResult<bool> {
    match target {
        Value::Object(inst) => Ok(inst.borrow_mut().set(name, value.copy_for_binding())),
        Value::Type(class) => {
            class.set_class_attr(name, value);
            Ok(false)
        }
        other => Err(not_found(format!("'{}' object", other.type_name()), name)),
    }
}
