//! The built-in function table.
//!
//! Each built-in is a plain function over `Value`s so the evaluator can call
//! it directly; `define_natives` wraps them as callables in the global scope.

use std::rc::Rc;
use std::sync::OnceLock;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed};
use regex::Regex;

use crate::error::{RtResult, RuntimeError};
use crate::formatter;
use crate::ops::int_to_f64;
use crate::scope::Scope;
use crate::value::{unpack_args, EnumerateValue, Function, Value, VARIADIC};

static INT_LITERAL: OnceLock<Regex> = OnceLock::new();
static FLOAT_LITERAL: OnceLock<Regex> = OnceLock::new();

fn int_literal() -> &'static Regex {
    INT_LITERAL.get_or_init(|| Regex::new(r"^[+-]?[0-9]+$").expect("int literal pattern"))
}

fn float_literal() -> &'static Regex {
    FLOAT_LITERAL.get_or_init(|| {
        Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$")
            .expect("float literal pattern")
    })
}

/// Register every built-in in `globals`.
pub fn define_natives(globals: &Scope) {
    let mut env = globals.borrow_mut();

    env.define(
        "len",
        native("len", 1, |_, args| {
            let [value] = unpack_args("len", args)?;
            len(&value)
        }),
    );
    env.define("min", native("min", VARIADIC, |_, args| min(&args)));
    env.define("max", native("max", VARIADIC, |_, args| max(&args)));
    env.define(
        "int",
        native("int", VARIADIC, |_, args| match optional_arg("int", args)? {
            Some(value) => int(&value),
            None => Ok(Value::int(0)),
        }),
    );
    env.define(
        "float",
        native("float", VARIADIC, |_, args| {
            match optional_arg("float", args)? {
                Some(value) => float(&value),
                None => Ok(Value::Float(0.0)),
            }
        }),
    );
    env.define(
        "str",
        native("str", VARIADIC, |_, args| match optional_arg("str", args)? {
            Some(value) => Ok(Value::Str(formatter::format(&value))),
            None => Ok(Value::str("")),
        }),
    );
    env.define(
        "repr",
        native("repr", 1, |_, args| {
            let [value] = unpack_args("repr", args)?;
            Ok(Value::Str(formatter::repr(&value)))
        }),
    );
    env.define(
        "bool",
        native("bool", VARIADIC, |_, args| {
            Ok(Value::Bool(
                optional_arg("bool", args)?.is_some_and(|v| v.is_truthy()),
            ))
        }),
    );
    env.define(
        "abs",
        native("abs", 1, |_, args| {
            let [value] = unpack_args("abs", args)?;
            abs(&value)
        }),
    );
    env.define(
        "enumerate",
        native("enumerate", VARIADIC, |_, args| match args.len() {
            1 => {
                let [seq] = unpack_args("enumerate", args)?;
                enumerate(&seq, &Value::int(0))
            }
            _ => {
                let [seq, start] = unpack_args("enumerate", args)?;
                enumerate(&seq, &start)
            }
        }),
    );
    env.define(
        "type",
        native("type", 1, |_, args| {
            let [value] = unpack_args("type", args)?;
            Ok(type_of(&value))
        }),
    );
    env.define(
        "print",
        native("print", VARIADIC, |rt, args| {
            rt.print(&args);
            Ok(Value::None)
        }),
    );
}

fn native<F>(name: &str, arity: usize, func: F) -> Value
where
    F: Fn(&mut crate::runtime::Runtime, Vec<Value>) -> RtResult<Value> + 'static,
{
    Value::Function(Rc::new(Function::builtin(name, arity, func)))
}

/// Zero or one argument, for built-ins like `int()` with a default.
fn optional_arg(name: &str, mut args: Vec<Value>) -> RtResult<Option<Value>> {
    if args.len() > 1 {
        return Err(RuntimeError::WrongArity {
            name: name.to_string(),
            expected: "at most 1".to_string(),
            got: args.len(),
        });
    }
    Ok(args.pop())
}

/// Number of characters in a string, or elements in a list or tuple
pub fn len(value: &Value) -> RtResult<Value> {
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        other => {
            return Err(RuntimeError::type_mismatch(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(BigInt::from(n)))
}

/// Either a single iterable or two or more positional values.
fn candidates(operation: &str, args: &[Value]) -> RtResult<Vec<Value>> {
    let items: Vec<Value> = match args {
        [single] => single.iterate()?.collect(),
        many => many.iter().map(Value::copy_for_binding).collect(),
    };
    if items.is_empty() {
        return Err(RuntimeError::EmptyCollection {
            operation: format!("{}()", operation),
        });
    }
    Ok(items)
}

/// First element that nothing later beats under `wanted`.
fn extreme(operation: &str, args: &[Value], wanted: std::cmp::Ordering) -> RtResult<Value> {
    let mut items = candidates(operation, args)?.into_iter();
    let mut best = match items.next() {
        Some(first) => first,
        None => {
            return Err(RuntimeError::EmptyCollection {
                operation: format!("{}()", operation),
            })
        }
    };
    let symbol = if wanted == std::cmp::Ordering::Less {
        "<"
    } else {
        ">"
    };
    for item in items {
        if item.order_for(&best, symbol)? == Some(wanted) {
            best = item;
        }
    }
    Ok(best)
}

/// Smallest value; ties keep the first one seen.
pub fn min(args: &[Value]) -> RtResult<Value> {
    extreme("min", args, std::cmp::Ordering::Less)
}

/// Largest value; ties keep the first one seen.
pub fn max(args: &[Value]) -> RtResult<Value> {
    extreme("max", args, std::cmp::Ordering::Greater)
}

pub fn int(value: &Value) -> RtResult<Value> {
    match value {
        Value::Int(n) => Ok(Value::Int(n.clone())),
        Value::Bool(b) => Ok(Value::int(i64::from(*b))),
        Value::Float(f) => {
            if f.is_nan() {
                return Err(RuntimeError::parse_failure("int", "nan"));
            }
            if f.is_infinite() {
                return Err(RuntimeError::Overflow {
                    message: "cannot convert float infinity to integer".to_string(),
                });
            }
            BigInt::from_f64(f.trunc())
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::parse_failure("int", &formatter::float_repr(*f)))
        }
        Value::Str(s) => {
            let text = s.trim();
            if !int_literal().is_match(text) {
                return Err(RuntimeError::parse_failure("int", s));
            }
            let digits = text.strip_prefix('+').unwrap_or(text);
            digits
                .parse::<BigInt>()
                .map(Value::Int)
                .map_err(|_| RuntimeError::parse_failure("int", s))
        }
        other => Err(RuntimeError::type_mismatch(format!(
            "int() argument must be a string or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

pub fn float(value: &Value) -> RtResult<Value> {
    match value {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(n) => Ok(Value::Float(int_to_f64(n)?)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => {
            let text = s.trim();
            if !float_literal().is_match(text) {
                return Err(RuntimeError::parse_failure("float", s));
            }
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| RuntimeError::parse_failure("float", s))
        }
        other => Err(RuntimeError::type_mismatch(format!(
            "float() argument must be a string or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

pub fn abs(value: &Value) -> RtResult<Value> {
    match value {
        Value::Int(n) => Ok(Value::Int(n.abs())),
        Value::Bool(b) => Ok(Value::int(i64::from(*b))),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(RuntimeError::type_mismatch(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

/// Lazy `(index, element)` pairs over `seq`, counting from `start`
pub fn enumerate(seq: &Value, start: &Value) -> RtResult<Value> {
    // fail now rather than on first iteration
    seq.iterate()?;
    let start = start.as_bigint().ok_or_else(|| {
        RuntimeError::type_mismatch(format!(
            "'{}' object cannot be interpreted as an integer",
            start.type_name()
        ))
    })?;
    Ok(Value::Enumerate(Rc::new(EnumerateValue::new(
        seq.copy_for_binding(),
        start,
    ))))
}

/// The class of an instance, or the kind name of a built-in value
pub fn type_of(value: &Value) -> Value {
    match value {
        Value::Object(inst) => Value::Type(Rc::clone(&inst.borrow().class)),
        other => Value::Str(other.type_name()),
    }
}
