use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use crate::error::{RtResult, RuntimeError};
use crate::formatter;
use crate::object::{BoundMethod, Class, Instance};
use crate::runtime::Runtime;

/// Arity marker for callables that validate their own argument count
pub const VARIADIC: usize = usize::MAX;

pub type NativeFn = dyn Fn(&mut Runtime, Vec<Value>) -> RtResult<Value>;

/// Runtime values
#[derive(Debug, Clone)]
pub enum Value {
    /// The `None` singleton
    None,
    Bool(bool),
    /// Arbitrary precision integer
    Int(BigInt),
    Float(f64),
    Str(String),
    /// Immutable sequence. The payload is never mutated, so sharing it is
    /// indistinguishable from copying it.
    Tuple(Rc<[Value]>),
    /// Mutable sequence, shared by every binding that holds it
    List(Rc<RefCell<Vec<Value>>>),
    /// Instance of a user-defined type, shared by every binding that holds it
    Object(Rc<RefCell<Instance>>),
    /// A class descriptor
    Type(Rc<Class>),
    /// Host callable: built-ins, methods and plain functions
    Function(Rc<Function>),
    /// A function bound to its receiver
    Method(Rc<BoundMethod>),
    /// Lazy `(index, element)` pairs
    Enumerate(Rc<EnumerateValue>),
}

/// Numeric view of a value after `Bool -> Int` promotion
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(BigInt),
    Float(f64),
}

impl Value {
    pub fn int(n: i64) -> Self {
        Value::Int(BigInt::from(n))
    }

    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    pub fn str(s: &str) -> Self {
        Value::Str(s.to_string())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::from(items))
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Object(inst) => inst.borrow().class.name.clone(),
            Value::Type(_) => "type".to_string(),
            Value::Function(func) if func.is_builtin() => {
                "builtin_function_or_method".to_string()
            }
            Value::Function(_) => "function".to_string(),
            Value::Method(_) => "method".to_string(),
            Value::Enumerate(_) => "enumerate".to_string(),
        }
    }

    /// `List` and `Object` are the kinds whose bindings share one mutable
    /// instance.
    pub fn is_reference_type(&self) -> bool {
        matches!(self, Value::List(_) | Value::Object(_))
    }

    /// The value a new binding receives on assignment, parameter pass or
    /// field store. Reference types hand out the same shared handle; every
    /// other kind hands out an independent copy.
    pub fn copy_for_binding(&self) -> Value {
        match self {
            Value::List(list) => Value::List(Rc::clone(list)),
            Value::Object(inst) => Value::Object(Rc::clone(inst)),
            other => other.clone(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => !n.is_zero(),
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            _ => true,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(BigInt::from(u8::from(*b)))),
            Value::Int(n) => Some(Number::Int(n.clone())),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Integer view, accepting `Bool` as Python does for indices and offsets
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Value::Bool(b) => Some(BigInt::from(u8::from(*b))),
            Value::Int(n) => Some(n.clone()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Structural equality: numbers after promotion, containers element-wise,
    /// objects and callables by identity. A comparison that nests too deep
    /// (self-containing lists) counts as unequal; `try_equals` reports it.
    pub fn equals(&self, other: &Value) -> bool {
        self.try_equals(other).unwrap_or(false)
    }

    /// `==` as the operator evaluates it: too deep a nesting is a
    /// `RecursionLimit` error instead of a stack overflow.
    pub fn try_equals(&self, other: &Value) -> RtResult<bool> {
        self.equals_at(other, 0)
    }

    fn equals_at(&self, other: &Value, depth: usize) -> RtResult<bool> {
        if depth > MAX_COMPARE_DEPTH {
            return Err(comparison_too_deep());
        }
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Ok(number_order(&a, &b) == Some(Ordering::Equal));
        }
        Ok(match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => sequence_equals(a, b, depth)?,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || sequence_equals(&a.borrow(), &b.borrow(), depth)?
            }
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Method(a), Value::Method(b)) => {
                Rc::ptr_eq(&a.function, &b.function) && a.receiver.is_same(&b.receiver)
            }
            (Value::Enumerate(a), Value::Enumerate(b)) => Rc::ptr_eq(a, b),
            _ => false,
        })
    }

    /// Identity (`is`). Shared kinds compare handles; plain values have no
    /// identity of their own, so equal values of the same kind are the same.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Method(a), Value::Method(b)) => Rc::ptr_eq(a, b),
            (Value::Enumerate(a), Value::Enumerate(b)) => Rc::ptr_eq(a, b),
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }

    /// Natural ordering. `Ok(None)` means the pair is unordered (a NaN is
    /// involved); comparing incompatible kinds is a `TypeMismatch`.
    pub fn order(&self, other: &Value) -> RtResult<Option<Ordering>> {
        self.order_for(other, "<")
    }

    pub(crate) fn order_for(&self, other: &Value, symbol: &str) -> RtResult<Option<Ordering>> {
        self.order_at(other, symbol, 0)
    }

    fn order_at(&self, other: &Value, symbol: &str, depth: usize) -> RtResult<Option<Ordering>> {
        if depth > MAX_COMPARE_DEPTH {
            return Err(comparison_too_deep());
        }
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Ok(number_order(&a, &b));
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.as_str().cmp(b.as_str()))),
            (Value::Tuple(a), Value::Tuple(b)) => sequence_order(a, b, symbol, depth),
            (Value::List(a), Value::List(b)) => {
                sequence_order(&a.borrow(), &b.borrow(), symbol, depth)
            }
            _ => Err(RuntimeError::type_mismatch(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                symbol,
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// `needle in self`
    pub fn contains(&self, needle: &Value) -> RtResult<bool> {
        match self {
            Value::Str(haystack) => match needle {
                Value::Str(n) => Ok(haystack.contains(n.as_str())),
                other => Err(RuntimeError::type_mismatch(format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ))),
            },
            Value::List(items) => contains_item(items.borrow().iter(), needle),
            Value::Tuple(items) => contains_item(items.iter(), needle),
            Value::Enumerate(_) => {
                let items: Vec<Value> = self.iterate()?.collect();
                contains_item(items.iter(), needle)
            }
            other => Err(RuntimeError::type_mismatch(format!(
                "argument of type '{}' is not iterable",
                other.type_name()
            ))),
        }
    }

    pub fn iterate(&self) -> RtResult<ValueIter> {
        match self {
            Value::List(list) => Ok(ValueIter::List {
                list: Rc::clone(list),
                pos: 0,
            }),
            Value::Tuple(items) => Ok(ValueIter::Tuple {
                items: Rc::clone(items),
                pos: 0,
            }),
            Value::Str(s) => Ok(ValueIter::Chars(
                s.chars().collect::<Vec<_>>().into_iter(),
            )),
            Value::Enumerate(pairs) => pairs.iter(),
            other => Err(RuntimeError::type_mismatch(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Destructure an iterable into exactly `N` values (`x, y = pair`).
    pub fn unpack<const N: usize>(&self) -> RtResult<[Value; N]> {
        let items: Vec<Value> = self.iterate()?.collect();
        let got = items.len();
        items
            .try_into()
            .map_err(|_| RuntimeError::UnpackMismatch { expected: N, got })
    }

    pub fn get_item(&self, index: &Value) -> RtResult<Value> {
        match self {
            Value::List(items) => {
                let items = items.borrow();
                let pos = resolve_index("list", index, items.len())?;
                Ok(items[pos].copy_for_binding())
            }
            Value::Tuple(items) => {
                let pos = resolve_index("tuple", index, items.len())?;
                Ok(items[pos].copy_for_binding())
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let pos = resolve_index("string", index, chars.len())?;
                Ok(Value::Str(chars[pos].to_string()))
            }
            other => Err(RuntimeError::type_mismatch(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }

    pub fn set_item(&self, index: &Value, value: Value) -> RtResult<()> {
        match self {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let pos = resolve_index("list assignment", index, items.len())?;
                items[pos] = value.copy_for_binding();
                Ok(())
            }
            other => Err(RuntimeError::type_mismatch(format!(
                "'{}' object does not support item assignment",
                other.type_name()
            ))),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&formatter::format(self))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Int(n)
    }
}

/// Exact comparison between an integer and a float, without rounding the
/// integer through `f64`.
fn int_float_order(i: &BigInt, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f.is_infinite() {
        return Some(if f > 0.0 {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }
    let whole = f.trunc();
    let whole_int = BigInt::from_f64(whole)?;
    match i.cmp(&whole_int) {
        Ordering::Equal => {
            let frac = f - whole;
            Some(if frac > 0.0 {
                Ordering::Less
            } else if frac < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            })
        }
        ord => Some(ord),
    }
}

pub fn number_order(a: &Number, b: &Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Some(x.cmp(y)),
        (Number::Float(x), Number::Float(y)) => x.partial_cmp(y),
        (Number::Int(x), Number::Float(y)) => int_float_order(x, *y),
        (Number::Float(x), Number::Int(y)) => int_float_order(y, *x).map(Ordering::reverse),
    }
}

/// Nesting limit for element-wise `==` and ordering
const MAX_COMPARE_DEPTH: usize = 256;

fn comparison_too_deep() -> RuntimeError {
    RuntimeError::RecursionLimit {
        message: "maximum recursion depth exceeded in comparison".to_string(),
    }
}

/// Element comparison checks identity first, so `x == x` holds for the same
/// element even when it contains itself.
fn same_element(x: &Value, y: &Value, depth: usize) -> RtResult<bool> {
    Ok(x.is_same(y) || x.equals_at(y, depth + 1)?)
}

fn sequence_equals(a: &[Value], b: &[Value], depth: usize) -> RtResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b) {
        if !same_element(x, y, depth)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sequence_order(
    a: &[Value],
    b: &[Value],
    symbol: &str,
    depth: usize,
) -> RtResult<Option<Ordering>> {
    for (x, y) in a.iter().zip(b) {
        if !same_element(x, y, depth)? {
            return x.order_at(y, symbol, depth + 1);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

fn contains_item<'a>(items: impl Iterator<Item = &'a Value>, needle: &Value) -> RtResult<bool> {
    for item in items {
        if item.is_same(needle) || item.try_equals(needle)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn resolve_index(kind: &str, index: &Value, len: usize) -> RtResult<usize> {
    let raw = index.as_bigint().ok_or_else(|| {
        RuntimeError::type_mismatch(format!(
            "{} indices must be integers, not {}",
            kind,
            index.type_name()
        ))
    })?;
    let out_of_range = || RuntimeError::IndexOutOfRange {
        kind: kind.to_string(),
        index: raw.to_string(),
        len,
    };
    let signed = raw.to_i64().ok_or_else(out_of_range)?;
    let pos = if signed < 0 {
        signed + len as i64
    } else {
        signed
    };
    if pos < 0 || pos >= len as i64 {
        return Err(out_of_range());
    }
    Ok(pos as usize)
}

/// Iterator over the elements of an iterable value. List iteration reads the
/// shared list by position, so it observes mutations made while iterating.
pub enum ValueIter {
    List {
        list: Rc<RefCell<Vec<Value>>>,
        pos: usize,
    },
    Tuple {
        items: Rc<[Value]>,
        pos: usize,
    },
    Chars(std::vec::IntoIter<char>),
    Enumerate {
        inner: Box<ValueIter>,
        index: BigInt,
    },
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::List { list, pos } => {
                let item = list.borrow().get(*pos).map(Value::copy_for_binding);
                *pos += 1;
                item
            }
            ValueIter::Tuple { items, pos } => {
                let item = items.get(*pos).map(Value::copy_for_binding);
                *pos += 1;
                item
            }
            ValueIter::Chars(chars) => chars.next().map(|c| Value::Str(c.to_string())),
            ValueIter::Enumerate { inner, index } => {
                let item = inner.next()?;
                let pair = Value::tuple(vec![Value::Int(index.clone()), item]);
                *index += 1u32;
                Some(pair)
            }
        }
    }
}

/// The value produced by `enumerate(seq, start)`. It keeps a binding of the
/// source rather than a snapshot, and every call to `iter` starts over.
#[derive(Debug)]
pub struct EnumerateValue {
    pub source: Value,
    pub start: BigInt,
}

impl EnumerateValue {
    pub fn new(source: Value, start: BigInt) -> Self {
        EnumerateValue {
            source: source.copy_for_binding(),
            start,
        }
    }

    pub fn iter(&self) -> RtResult<ValueIter> {
        Ok(ValueIter::Enumerate {
            inner: Box::new(self.source.iterate()?),
            index: self.start.clone(),
        })
    }
}

/// A callable provided by the host: a built-in, a method body or a plain
/// function. Methods receive their receiver as the first argument.
pub struct Function {
    pub name: String,
    pub arity: usize,
    builtin: bool,
    func: Box<NativeFn>,
}

impl Function {
    pub fn new<F>(name: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&mut Runtime, Vec<Value>) -> RtResult<Value> + 'static,
    {
        Function {
            name: name.to_string(),
            arity,
            builtin: false,
            func: Box::new(func),
        }
    }

    pub fn builtin<F>(name: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&mut Runtime, Vec<Value>) -> RtResult<Value> + 'static,
    {
        Function {
            builtin: true,
            ..Function::new(name, arity, func)
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn invoke(&self, rt: &mut Runtime, args: Vec<Value>) -> RtResult<Value> {
        if self.arity != VARIADIC && args.len() != self.arity {
            return Err(RuntimeError::WrongArity {
                name: self.name.clone(),
                expected: self.arity.to_string(),
                got: args.len(),
            });
        }
        (self.func)(rt, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

/// Split an argument vector into a fixed-size array, for callables whose
/// arity was already checked.
pub fn unpack_args<const N: usize>(name: &str, args: Vec<Value>) -> RtResult<[Value; N]> {
    let got = args.len();
    args.try_into().map_err(|_| RuntimeError::WrongArity {
        name: name.to_string(),
        expected: N.to_string(),
        got,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Class;

    fn sample_list() -> Value {
        Value::list(vec![Value::int(1), Value::str("nice"), Value::Bool(true)])
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::None.type_name(), "NoneType");
        assert_eq!(Value::Bool(true).type_name(), "bool");
        assert_eq!(Value::int(1).type_name(), "int");
        assert_eq!(Value::float(1.5).type_name(), "float");
        assert_eq!(Value::str("a").type_name(), "str");
        assert_eq!(Value::tuple(vec![]).type_name(), "tuple");
        assert_eq!(Value::list(vec![]).type_name(), "list");

        let class = Class::builder("Point").build();
        let obj = Value::Object(Rc::new(RefCell::new(Instance::new(class.clone()))));
        assert_eq!(obj.type_name(), "Point");
        assert_eq!(Value::Type(class).type_name(), "type");
    }

    #[test]
    fn test_copy_for_binding_shares_lists() {
        let v = Value::list(vec![Value::int(1)]);
        let w = v.copy_for_binding();
        if let Value::List(items) = &w {
            items.borrow_mut().push(Value::int(2));
        }
        assert_eq!(v, Value::list(vec![Value::int(1), Value::int(2)]));
        assert!(v.is_same(&w));
        assert!(v.is_reference_type());
    }

    #[test]
    fn test_copy_for_binding_copies_scalars() {
        let v = Value::str("abc");
        let mut w = v.copy_for_binding();
        assert_eq!(w, v);
        w = Value::int(15);
        assert_eq!(v, Value::str("abc"));
        assert_eq!(w, Value::int(15));
        assert!(!v.is_reference_type());
        assert!(!Value::tuple(vec![Value::int(1)]).is_reference_type());
    }

    #[test]
    fn test_numeric_promotion_equality() {
        assert!(Value::Bool(true).equals(&Value::int(1)));
        assert!(Value::Bool(false).equals(&Value::int(0)));
        assert!(Value::int(1).equals(&Value::float(1.0)));
        assert!(Value::Bool(true).equals(&Value::float(1.0)));
        assert!(!Value::int(1).equals(&Value::float(1.5)));
        assert!(!Value::str("1").equals(&Value::int(1)));
        assert!(!Value::float(f64::NAN).equals(&Value::float(f64::NAN)));
    }

    #[test]
    fn test_big_int_float_equality_is_exact() {
        let big = Value::Int(BigInt::from(2u64.pow(53)) + 1u32);
        assert!(!big.equals(&Value::float(2f64.powi(53))));
        let exact = Value::Int(BigInt::from(2u64.pow(53)));
        assert!(exact.equals(&Value::float(2f64.powi(53))));
    }

    #[test]
    fn test_deep_equality() {
        assert_eq!(sample_list(), sample_list());
        let other = Value::list(vec![Value::int(3), Value::str("nice"), Value::Bool(true)]);
        assert_ne!(sample_list(), other);

        let as_tuple = Value::tuple(vec![Value::int(1), Value::str("nice"), Value::Bool(true)]);
        assert_ne!(sample_list(), as_tuple);

        let nested_a = Value::list(vec![Value::tuple(vec![Value::int(1), Value::int(2)])]);
        let nested_b = Value::list(vec![Value::tuple(vec![Value::Bool(true), Value::float(2.0)])]);
        assert_eq!(nested_a, nested_b);
    }

    #[test]
    fn test_object_equality_is_identity() {
        let class = Class::builder("Test").build();
        let a = Value::Object(Rc::new(RefCell::new(Instance::new(class.clone()))));
        let b = Value::Object(Rc::new(RefCell::new(Instance::new(class))));
        assert_eq!(a, a.copy_for_binding());
        assert_ne!(a, b);
    }

    #[test]
    fn test_ordering() {
        assert_eq!(
            Value::int(1).order(&Value::int(2)).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::float(52.0).order(&Value::int(1)).unwrap(),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::int(-2).order(&Value::float(-1.5)).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::str("abc").order(&Value::str("abd")).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(Value::float(f64::NAN).order(&Value::int(1)).unwrap(), None);
    }

    #[test]
    fn test_sequence_ordering() {
        let a = Value::list(vec![Value::int(1), Value::int(2)]);
        let b = Value::list(vec![Value::int(1), Value::int(3)]);
        let c = Value::list(vec![Value::int(1)]);
        assert_eq!(a.order(&b).unwrap(), Some(Ordering::Less));
        assert_eq!(a.order(&c).unwrap(), Some(Ordering::Greater));

        let t1 = Value::tuple(vec![Value::int(6), Value::str("a")]);
        let t2 = Value::tuple(vec![Value::int(6), Value::str("b")]);
        assert_eq!(t1.order(&t2).unwrap(), Some(Ordering::Less));
    }

    #[test]
    fn test_ordering_incompatible_kinds() {
        let err = Value::str("a").order(&Value::int(1)).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::type_mismatch("'<' not supported between instances of 'str' and 'int'")
        );
        let list = Value::list(vec![]);
        let tuple = Value::tuple(vec![]);
        assert!(list.order(&tuple).is_err());
    }

    #[test]
    fn test_membership() {
        let haystack = Value::list(vec![
            Value::int(1),
            Value::int(2),
            Value::int(3),
            Value::str("True"),
            Value::Bool(true),
            Value::Bool(false),
            Value::int(-5),
            Value::tuple(vec![Value::int(1), Value::int(2)]),
        ]);
        let needle = Value::tuple(vec![Value::int(1), Value::int(2)]);
        assert!(haystack.contains(&needle).unwrap());
        assert!(haystack.contains(&Value::str("True")).unwrap());
        assert!(!haystack.contains(&Value::str("jon")).unwrap());

        let s = Value::str("this string has a substring woa");
        assert!(s.contains(&Value::str("substring")).unwrap());
        assert!(s.contains(&Value::str("")).unwrap());
        assert!(s.contains(&Value::int(1)).is_err());
        assert!(Value::int(5).contains(&Value::int(5)).is_err());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::int(0).is_truthy());
        assert!(Value::int(-1).is_truthy());
        assert!(!Value::float(0.0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(Value::tuple(vec![Value::None]).is_truthy());
    }

    #[test]
    fn test_indexing() {
        let list = Value::list(vec![Value::int(10), Value::int(20), Value::int(30)]);
        assert_eq!(list.get_item(&Value::int(0)).unwrap(), Value::int(10));
        assert_eq!(list.get_item(&Value::int(-1)).unwrap(), Value::int(30));
        assert!(matches!(
            list.get_item(&Value::int(3)),
            Err(RuntimeError::IndexOutOfRange { .. })
        ));
        assert!(list.get_item(&Value::str("0")).is_err());

        list.set_item(&Value::int(1), Value::str("x")).unwrap();
        assert_eq!(list.get_item(&Value::int(1)).unwrap(), Value::str("x"));

        let tuple = Value::tuple(vec![Value::int(500), Value::int(600)]);
        assert_eq!(tuple.get_item(&Value::int(1)).unwrap(), Value::int(600));
        assert!(tuple.set_item(&Value::int(0), Value::None).is_err());

        let s = Value::str("héllo");
        assert_eq!(s.get_item(&Value::int(1)).unwrap(), Value::str("é"));
    }

    #[test]
    fn test_iterate_and_unpack() {
        let s: Vec<Value> = Value::str("ab").iterate().unwrap().collect();
        assert_eq!(s, vec![Value::str("a"), Value::str("b")]);

        let [x, y] = Value::tuple(vec![Value::int(1), Value::int(2)])
            .unpack::<2>()
            .unwrap();
        assert_eq!(x, Value::int(1));
        assert_eq!(y, Value::int(2));

        let err = Value::tuple(vec![Value::int(1)]).unpack::<2>().unwrap_err();
        assert_eq!(err, RuntimeError::UnpackMismatch { expected: 2, got: 1 });
        assert!(Value::int(3).iterate().is_err());
    }

    #[test]
    fn test_list_iteration_sees_appends() {
        let list = Value::list(vec![Value::int(1)]);
        let mut iter = list.iterate().unwrap();
        assert_eq!(iter.next(), Some(Value::int(1)));
        if let Value::List(items) = &list {
            items.borrow_mut().push(Value::int(2));
        }
        assert_eq!(iter.next(), Some(Value::int(2)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_enumerate_is_restartable() {
        let source = Value::list(vec![Value::str("a"), Value::str("b")]);
        let pairs = EnumerateValue::new(source, BigInt::from(-5));
        let first: Vec<Value> = pairs.iter().unwrap().collect();
        let second: Vec<Value> = pairs.iter().unwrap().collect();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                Value::tuple(vec![Value::int(-5), Value::str("a")]),
                Value::tuple(vec![Value::int(-4), Value::str("b")]),
            ]
        );
    }

    #[test]
    fn test_unpack_args() {
        let [a, b] = unpack_args::<2>("f", vec![Value::int(1), Value::int(2)]).unwrap();
        assert_eq!((a, b), (Value::int(1), Value::int(2)));
        assert!(unpack_args::<2>("f", vec![Value::int(1)]).is_err());
    }

    fn self_containing_list() -> Value {
        let list = Value::list(vec![Value::int(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.copy_for_binding());
        }
        list
    }

    fn break_cycle(list: &Value) {
        if let Value::List(items) = list {
            items.borrow_mut().clear();
        }
    }

    #[test]
    fn test_comparing_self_containing_lists_is_recoverable() {
        let a = self_containing_list();
        let b = self_containing_list();

        assert!(matches!(
            a.try_equals(&b),
            Err(RuntimeError::RecursionLimit { .. })
        ));
        assert!(!a.equals(&b));
        assert!(a.order(&b).is_err());
        assert!(Value::list(vec![a.copy_for_binding()]).contains(&b).is_err());

        assert!(a.try_equals(&a.copy_for_binding()).unwrap());
        assert!(Value::list(vec![a.copy_for_binding()]).contains(&a).unwrap());

        break_cycle(&a);
        break_cycle(&b);
    }

    #[test]
    fn test_identical_elements_compare_equal_without_recursing() {
        let a = self_containing_list();
        let x = Value::list(vec![a.copy_for_binding(), a.copy_for_binding()]);
        let y = Value::list(vec![a.copy_for_binding(), a.copy_for_binding()]);
        assert!(x.try_equals(&y).unwrap());
        assert_eq!(x.order(&y).unwrap(), Some(Ordering::Equal));
        break_cycle(&a);
    }
}
