//! Operators: comparisons (including chains), arithmetic and exponentiation.

use std::cmp::Ordering;
use std::rc::Rc;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{RtResult, RuntimeError};
use crate::value::{Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtE => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtE => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Is => "is",
            CompareOp::IsNot => "is not",
        }
    }
}

/// `a <op> b`
pub fn compare(a: &Value, op: CompareOp, b: &Value) -> RtResult<bool> {
    match op {
        CompareOp::Eq => a.try_equals(b),
        CompareOp::NotEq => Ok(!a.try_equals(b)?),
        CompareOp::In => membership(a, b),
        CompareOp::NotIn => Ok(!membership(a, b)?),
        CompareOp::Is => Ok(a.is_same(b)),
        CompareOp::IsNot => Ok(!a.is_same(b)),
        CompareOp::Lt | CompareOp::LtE | CompareOp::Gt | CompareOp::GtE => {
            // Unordered pairs (NaN) are false for every ordering operator
            let Some(ord) = a.order_for(b, op.symbol())? else {
                return Ok(false);
            };
            Ok(match op {
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::LtE => ord != Ordering::Greater,
                CompareOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            })
        }
    }
}

/// `needle in haystack`
pub fn membership(needle: &Value, haystack: &Value) -> RtResult<bool> {
    haystack.contains(needle)
}

/// `x0 op0 x1 op1 x2 ...`, evaluated left to right. Links after the first
/// false one are never compared, so they cannot raise.
pub fn compare_chain(operands: &[Value], ops: &[CompareOp]) -> RtResult<bool> {
    if operands.len() != ops.len() + 1 {
        return Err(RuntimeError::type_mismatch(format!(
            "comparison chain of {} operators needs {} operands, got {}",
            ops.len(),
            ops.len() + 1,
            operands.len()
        )));
    }
    for (pair, op) in operands.windows(2).zip(ops) {
        if !compare(&pair[0], *op, &pair[1])? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    TrueDiv,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::TrueDiv => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

pub fn binary(a: &Value, op: BinaryOp, b: &Value) -> RtResult<Value> {
    match op {
        BinaryOp::Add => add(a, b),
        BinaryOp::Sub => sub(a, b),
        BinaryOp::Mul => mul(a, b),
        BinaryOp::TrueDiv => true_div(a, b),
        BinaryOp::FloorDiv => floor_div(a, b),
        BinaryOp::Mod => modulo(a, b),
        BinaryOp::Pow => pow(a, b),
    }
}

fn unsupported(op: BinaryOp, a: &Value, b: &Value) -> RuntimeError {
    RuntimeError::type_mismatch(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        a.type_name(),
        b.type_name()
    ))
}

fn zero_division(message: &str) -> RuntimeError {
    RuntimeError::DivisionByZero {
        message: message.to_string(),
    }
}

/// Exact conversion is not required, but a finite result is.
pub fn int_to_f64(n: &BigInt) -> RtResult<f64> {
    match n.to_f64() {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(RuntimeError::Overflow {
            message: "int too large to convert to float".to_string(),
        }),
    }
}

fn to_f64(n: &Number) -> RtResult<f64> {
    match n {
        Number::Int(i) => int_to_f64(i),
        Number::Float(f) => Ok(*f),
    }
}

/// Both operands as numbers, or `None` when either is not numeric
fn numbers(a: &Value, b: &Value) -> Option<(Number, Number)> {
    Some((a.as_number()?, b.as_number()?))
}

fn float_pair(x: &Number, y: &Number) -> RtResult<(f64, f64)> {
    Ok((to_f64(x)?, to_f64(y)?))
}

pub fn add(a: &Value, b: &Value) -> RtResult<Value> {
    if let Some((x, y)) = numbers(a, b) {
        return match (&x, &y) {
            (Number::Int(i), Number::Int(j)) => Ok(Value::Int(i + j)),
            _ => {
                let (f, g) = float_pair(&x, &y)?;
                Ok(Value::Float(f + g))
            }
        };
    }
    match (a, b) {
        (Value::Str(s), Value::Str(t)) => Ok(Value::Str(format!("{}{}", s, t))),
        (Value::List(l), Value::List(r)) => {
            let mut items: Vec<Value> = l.borrow().iter().map(Value::copy_for_binding).collect();
            items.extend(r.borrow().iter().map(Value::copy_for_binding));
            Ok(Value::list(items))
        }
        (Value::Tuple(l), Value::Tuple(r)) => {
            Ok(Value::Tuple(l.iter().chain(r.iter()).cloned().collect::<Rc<[Value]>>()))
        }
        _ => Err(unsupported(BinaryOp::Add, a, b)),
    }
}

pub fn sub(a: &Value, b: &Value) -> RtResult<Value> {
    let (x, y) = numbers(a, b).ok_or_else(|| unsupported(BinaryOp::Sub, a, b))?;
    match (&x, &y) {
        (Number::Int(i), Number::Int(j)) => Ok(Value::Int(i - j)),
        _ => {
            let (f, g) = float_pair(&x, &y)?;
            Ok(Value::Float(f - g))
        }
    }
}

fn repeat_count(n: &BigInt) -> RtResult<usize> {
    if n.is_negative() {
        return Ok(0);
    }
    n.to_usize().ok_or_else(|| RuntimeError::Overflow {
        message: "cannot fit 'int' into an index-sized integer".to_string(),
    })
}

/// Element count of `len` repeated `count` times, refusing anything that
/// cannot be allocated.
fn repeated_len(len: usize, count: usize) -> RtResult<usize> {
    len.checked_mul(count)
        .filter(|total| *total <= isize::MAX as usize)
        .ok_or_else(|| RuntimeError::Overflow {
            message: "repeated sequence is too large".to_string(),
        })
}

fn repeat(seq: &Value, n: &BigInt) -> RtResult<Option<Value>> {
    let count = repeat_count(n)?;
    Ok(match seq {
        Value::Str(s) => {
            repeated_len(s.len(), count)?;
            Some(Value::Str(s.repeat(count)))
        }
        Value::List(items) => {
            let items = items.borrow();
            let mut out = Vec::with_capacity(repeated_len(items.len(), count)?);
            for _ in 0..count {
                out.extend(items.iter().map(Value::copy_for_binding));
            }
            Some(Value::list(out))
        }
        Value::Tuple(items) => {
            let mut out = Vec::with_capacity(repeated_len(items.len(), count)?);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Some(Value::tuple(out))
        }
        _ => None,
    })
}

pub fn mul(a: &Value, b: &Value) -> RtResult<Value> {
    if let Some((x, y)) = numbers(a, b) {
        return match (&x, &y) {
            (Number::Int(i), Number::Int(j)) => Ok(Value::Int(i * j)),
            _ => {
                let (f, g) = float_pair(&x, &y)?;
                Ok(Value::Float(f * g))
            }
        };
    }
    let repeated = match (a.as_bigint(), b.as_bigint()) {
        (_, Some(n)) => repeat(a, &n)?,
        (Some(n), _) => repeat(b, &n)?,
        _ => None,
    };
    repeated.ok_or_else(|| unsupported(BinaryOp::Mul, a, b))
}

pub fn true_div(a: &Value, b: &Value) -> RtResult<Value> {
    let (x, y) = numbers(a, b).ok_or_else(|| unsupported(BinaryOp::TrueDiv, a, b))?;
    let (f, g) = float_pair(&x, &y)?;
    if g == 0.0 {
        return Err(zero_division(match (&x, &y) {
            (Number::Int(_), Number::Int(_)) => "division by zero",
            _ => "float division by zero",
        }));
    }
    Ok(Value::Float(f / g))
}

/// Python's float `divmod`: the remainder takes the sign of the divisor.
fn float_divmod(a: f64, b: f64) -> (f64, f64) {
    let mut m = a % b;
    if m != 0.0 {
        if (b < 0.0) != (m < 0.0) {
            m += b;
        }
    } else {
        m = 0.0f64.copysign(b);
    }
    let div = (a - m) / b;
    let mut floor = div.floor();
    if div - floor > 0.5 {
        floor += 1.0;
    }
    (floor, m)
}

pub fn floor_div(a: &Value, b: &Value) -> RtResult<Value> {
    let (x, y) = numbers(a, b).ok_or_else(|| unsupported(BinaryOp::FloorDiv, a, b))?;
    match (&x, &y) {
        (Number::Int(i), Number::Int(j)) => {
            if j.is_zero() {
                return Err(zero_division("integer division or modulo by zero"));
            }
            Ok(Value::Int(i.div_floor(j)))
        }
        _ => {
            let (f, g) = float_pair(&x, &y)?;
            if g == 0.0 {
                return Err(zero_division("float floor division by zero"));
            }
            Ok(Value::Float(float_divmod(f, g).0))
        }
    }
}

pub fn modulo(a: &Value, b: &Value) -> RtResult<Value> {
    let (x, y) = numbers(a, b).ok_or_else(|| unsupported(BinaryOp::Mod, a, b))?;
    match (&x, &y) {
        (Number::Int(i), Number::Int(j)) => {
            if j.is_zero() {
                return Err(zero_division("integer division or modulo by zero"));
            }
            Ok(Value::Int(i.mod_floor(j)))
        }
        _ => {
            let (f, g) = float_pair(&x, &y)?;
            if g == 0.0 {
                return Err(zero_division("float modulo"));
            }
            Ok(Value::Float(float_divmod(f, g).1))
        }
    }
}

/// `a ** b`
///
/// Integer results stay exact. A negative integer exponent or any float
/// operand produces a float.
pub fn pow(a: &Value, b: &Value) -> RtResult<Value> {
    let (x, y) = numbers(a, b).ok_or_else(|| unsupported(BinaryOp::Pow, a, b))?;
    match (&x, &y) {
        (Number::Int(base), Number::Int(exp)) if !exp.is_negative() => int_pow(base, exp),
        (Number::Int(base), Number::Int(exp)) => {
            if base.is_zero() {
                return Err(zero_division(
                    "0.0 cannot be raised to a negative power",
                ));
            }
            let f = int_to_f64(base)?;
            let result = match exp.to_i32() {
                Some(e) => f.powi(e),
                None => f.powf(int_to_f64(exp).unwrap_or(f64::NEG_INFINITY)),
            };
            Ok(Value::Float(result))
        }
        _ => {
            let (base, exp) = float_pair(&x, &y)?;
            float_pow(base, exp)
        }
    }
}

fn int_pow(base: &BigInt, exp: &BigInt) -> RtResult<Value> {
    // Bases whose powers never grow are answered for any exponent
    if base.is_zero() {
        return Ok(Value::Int(if exp.is_zero() {
            BigInt::one()
        } else {
            BigInt::zero()
        }));
    }
    if base.is_one() {
        return Ok(Value::Int(BigInt::one()));
    }
    if *base == BigInt::from(-1) {
        return Ok(Value::Int(if exp.is_even() {
            BigInt::one()
        } else {
            BigInt::from(-1)
        }));
    }
    let e = exp.to_u32().ok_or_else(|| RuntimeError::Overflow {
        message: format!("exponent {} is too large", exp),
    })?;
    Ok(Value::Int(base.pow(e)))
}

fn float_pow(base: f64, exp: f64) -> RtResult<Value> {
    if base == 0.0 && exp < 0.0 {
        return Err(zero_division("0.0 cannot be raised to a negative power"));
    }
    if base < 0.0 && exp.is_finite() && exp.fract() != 0.0 {
        return Err(RuntimeError::type_mismatch(
            "negative number cannot be raised to a fractional power (complex results are not supported)",
        ));
    }
    let result = base.powf(exp);
    if result.is_infinite() && base.is_finite() && exp.is_finite() {
        return Err(RuntimeError::Overflow {
            message: "numerical result out of range".to_string(),
        });
    }
    Ok(Value::Float(result))
}

pub fn neg(a: &Value) -> RtResult<Value> {
    match a.as_number() {
        Some(Number::Int(i)) => Ok(Value::Int(-i)),
        Some(Number::Float(f)) => Ok(Value::Float(-f)),
        None => Err(RuntimeError::type_mismatch(format!(
            "bad operand type for unary -: '{}'",
            a.type_name()
        ))),
    }
}

pub fn pos(a: &Value) -> RtResult<Value> {
    match a.as_number() {
        Some(Number::Int(i)) => Ok(Value::Int(i)),
        Some(Number::Float(f)) => Ok(Value::Float(f)),
        None => Err(RuntimeError::type_mismatch(format!(
            "bad operand type for unary +: '{}'",
            a.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::int(n)
    }

    #[test]
    fn test_equality_operators() {
        assert!(compare(&int(1), CompareOp::Eq, &Value::Bool(true)).unwrap());
        assert!(compare(&Value::str("jon"), CompareOp::NotEq, &Value::str("test")).unwrap());
        assert!(!compare(&int(1), CompareOp::Eq, &Value::str("1")).unwrap());
    }

    #[test]
    fn test_ordering_operators() {
        assert!(compare(&int(1), CompareOp::Lt, &Value::float(1.5)).unwrap());
        assert!(compare(&int(2), CompareOp::LtE, &int(2)).unwrap());
        assert!(compare(&Value::str("b"), CompareOp::Gt, &Value::str("a")).unwrap());
        assert!(!compare(&int(2), CompareOp::GtE, &int(3)).unwrap());

        let nan = Value::float(f64::NAN);
        assert!(!compare(&nan, CompareOp::Lt, &int(1)).unwrap());
        assert!(!compare(&nan, CompareOp::GtE, &int(1)).unwrap());

        let err = compare(&int(1), CompareOp::GtE, &Value::str("a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'>=' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn test_membership_operators() {
        let list = Value::list(vec![int(1), Value::str("a")]);
        assert!(compare(&Value::str("a"), CompareOp::In, &list).unwrap());
        assert!(compare(&Value::str("b"), CompareOp::NotIn, &list).unwrap());
        assert!(compare(&Value::str(""), CompareOp::In, &Value::str("abc")).unwrap());
        assert!(compare(&int(1), CompareOp::In, &int(1)).is_err());
        assert!(membership(&Value::tuple(vec![]), &Value::tuple(vec![Value::tuple(vec![])])).unwrap());
    }

    #[test]
    fn test_identity_operators() {
        let a = Value::list(vec![]);
        let b = Value::list(vec![]);
        assert!(compare(&a, CompareOp::Is, &a.copy_for_binding()).unwrap());
        assert!(compare(&a, CompareOp::IsNot, &b).unwrap());
        assert!(compare(&Value::None, CompareOp::Is, &Value::None).unwrap());
    }

    #[test]
    fn test_chain_short_circuits() {
        let operands = [int(1), int(2), int(3)];
        assert!(compare_chain(&operands, &[CompareOp::Lt, CompareOp::Lt]).unwrap());
        assert!(!compare_chain(&operands, &[CompareOp::Gt, CompareOp::Lt]).unwrap());

        // the second link would be a type error, but the first is already false
        let operands = [int(3), int(2), Value::str("x")];
        assert!(!compare_chain(&operands, &[CompareOp::Lt, CompareOp::Lt]).unwrap());
        let operands = [int(1), int(2), Value::str("x")];
        assert!(compare_chain(&operands, &[CompareOp::Lt, CompareOp::Lt]).is_err());

        assert!(compare_chain(&[int(1)], &[CompareOp::Lt]).is_err());
    }

    #[test]
    fn test_chained_membership() {
        let inner = Value::list(vec![int(1)]);
        let outer = Value::list(vec![inner.copy_for_binding()]);
        assert!(compare_chain(&[int(1), inner, outer], &[CompareOp::In, CompareOp::In]).unwrap());
    }

    #[test]
    fn test_add_and_concat() {
        assert_eq!(add(&int(2), &int(3)).unwrap(), int(5));
        assert_eq!(add(&int(2), &Value::float(0.5)).unwrap(), Value::float(2.5));
        assert_eq!(add(&Value::Bool(true), &int(1)).unwrap(), int(2));
        assert_eq!(
            add(&Value::str("ab"), &Value::str("c")).unwrap(),
            Value::str("abc")
        );

        let l = Value::list(vec![int(1)]);
        let joined = add(&l, &Value::list(vec![int(2)])).unwrap();
        assert_eq!(joined, Value::list(vec![int(1), int(2)]));
        assert!(!joined.is_same(&l));

        let t = add(&Value::tuple(vec![int(1)]), &Value::tuple(vec![int(2)])).unwrap();
        assert_eq!(t, Value::tuple(vec![int(1), int(2)]));

        let err = add(&int(1), &Value::str("a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported operand type(s) for +: 'int' and 'str'"
        );
    }

    #[test]
    fn test_repetition() {
        assert_eq!(mul(&Value::str("ab"), &int(3)).unwrap(), Value::str("ababab"));
        assert_eq!(mul(&int(2), &Value::str("x")).unwrap(), Value::str("xx"));
        assert_eq!(mul(&Value::str("x"), &int(-1)).unwrap(), Value::str(""));
        assert_eq!(
            mul(&Value::list(vec![int(0)]), &int(2)).unwrap(),
            Value::list(vec![int(0), int(0)])
        );
        assert!(mul(&Value::str("x"), &Value::str("y")).is_err());
    }

    #[test]
    fn test_self_containing_lists_raise_on_equality() {
        let a = Value::list(vec![int(1)]);
        let b = Value::list(vec![int(1)]);
        for list in [&a, &b] {
            if let Value::List(items) = list {
                items.borrow_mut().push(list.copy_for_binding());
            }
        }

        for op in [CompareOp::Eq, CompareOp::NotEq, CompareOp::Lt] {
            assert!(matches!(
                compare(&a, op, &b),
                Err(RuntimeError::RecursionLimit { .. })
            ));
        }
        assert!(compare(&a, CompareOp::Eq, &a).unwrap());

        for list in [&a, &b] {
            if let Value::List(items) = list {
                items.borrow_mut().clear();
            }
        }
    }

    #[test]
    fn test_huge_repetition_is_an_overflow() {
        let count = Value::Int(BigInt::from(u64::MAX / 2));
        assert!(matches!(
            mul(&Value::str("ab"), &count),
            Err(RuntimeError::Overflow { .. })
        ));
        assert!(matches!(
            mul(&Value::list(vec![int(1), int(2)]), &count),
            Err(RuntimeError::Overflow { .. })
        ));
        assert!(matches!(
            mul(&count, &Value::tuple(vec![int(1), int(2)])),
            Err(RuntimeError::Overflow { .. })
        ));
        assert_eq!(
            mul(&Value::list(vec![]), &count).unwrap(),
            Value::list(vec![])
        );
    }

    #[test]
    fn test_division() {
        assert_eq!(true_div(&int(1), &int(4)).unwrap(), Value::float(0.25));
        assert_eq!(floor_div(&int(-7), &int(2)).unwrap(), int(-4));
        assert_eq!(modulo(&int(-7), &int(2)).unwrap(), int(1));
        assert_eq!(modulo(&int(7), &int(-2)).unwrap(), int(-1));
        assert_eq!(floor_div(&Value::float(-7.0), &int(2)).unwrap(), Value::float(-4.0));
        assert_eq!(modulo(&Value::float(-7.5), &int(2)).unwrap(), Value::float(0.5));

        let err = true_div(&int(1), &int(0)).unwrap_err();
        assert_eq!(err.report(), "ZeroDivisionError: division by zero");
        assert!(floor_div(&int(1), &int(0)).is_err());
        assert!(modulo(&Value::float(1.0), &Value::float(0.0)).is_err());
    }

    #[test]
    fn test_int_pow() {
        assert_eq!(pow(&int(2), &int(10)).unwrap(), int(1024));
        assert_eq!(pow(&int(3), &int(0)).unwrap(), int(1));
        assert_eq!(pow(&int(0), &int(0)).unwrap(), int(1));
        let big = pow(&int(2), &int(100)).unwrap();
        assert_eq!(big.to_string(), "1267650600228229401496703205376");
        assert_eq!(pow(&int(-1), &Value::Int(BigInt::from(u64::MAX))).unwrap(), int(-1));
    }

    #[test]
    fn test_negative_and_float_pow() {
        assert_eq!(pow(&int(2), &int(-1)).unwrap(), Value::float(0.5));
        assert_eq!(pow(&int(4), &Value::float(0.5)).unwrap(), Value::float(2.0));
        assert_eq!(pow(&Value::float(2.0), &int(3)).unwrap(), Value::float(8.0));

        let err = pow(&int(0), &int(-1)).unwrap_err();
        assert_eq!(err.python_name(), "ZeroDivisionError");
        assert!(matches!(
            pow(&Value::float(-8.0), &Value::float(0.5)),
            Err(RuntimeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            pow(&Value::float(10.0), &int(400)),
            Err(RuntimeError::Overflow { .. })
        ));
        assert!(matches!(
            pow(&int(2), &Value::Int(BigInt::from(u64::MAX))),
            Err(RuntimeError::Overflow { .. })
        ));
    }

    #[test]
    fn test_unary() {
        assert_eq!(neg(&int(5)).unwrap(), int(-5));
        assert_eq!(neg(&Value::Bool(true)).unwrap(), int(-1));
        assert_eq!(pos(&Value::float(1.5)).unwrap(), Value::float(1.5));
        assert!(neg(&Value::str("a")).is_err());
    }
}
