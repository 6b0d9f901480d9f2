//! Canonical text for runtime values.
//!
//! `format` is what `print` and `str()` produce; `repr` is the quoted form
//! used for elements nested inside containers.

use std::rc::Rc;

use crate::value::Value;

/// `str(value)`: top-level strings verbatim, everything else as `repr`
pub fn format(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => repr(other),
    }
}

pub fn repr(value: &Value) -> String {
    let mut out = String::new();
    let mut active = Vec::new();
    write_repr(value, &mut out, &mut active);
    out
}

/// `active` holds the lists currently being written, so a list that contains
/// itself prints `[...]` instead of recursing forever.
fn write_repr(value: &Value, out: &mut String, active: &mut Vec<usize>) {
    match value {
        Value::None => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Float(f) => out.push_str(&float_repr(*f)),
        Value::Str(s) => out.push_str(&str_repr(s)),
        Value::Tuple(items) => {
            out.push('(');
            write_items(items, out, active);
            if items.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Value::List(list) => {
            let addr = Rc::as_ptr(list) as usize;
            if active.contains(&addr) {
                out.push_str("[...]");
                return;
            }
            active.push(addr);
            out.push('[');
            write_items(&list.borrow(), out, active);
            out.push(']');
            active.pop();
        }
        Value::Object(inst) => {
            let addr = Rc::as_ptr(inst) as usize;
            out.push_str(&format!(
                "<__main__.{} object at {:#x}>",
                inst.borrow().class.name,
                addr
            ));
        }
        Value::Type(class) => out.push_str(&format!("<class '__main__.{}'>", class.name)),
        Value::Function(func) if func.is_builtin() => {
            out.push_str(&format!("<built-in function {}>", func.name))
        }
        Value::Function(func) => {
            let addr = Rc::as_ptr(func) as usize;
            out.push_str(&format!("<function {} at {:#x}>", func.name, addr));
        }
        Value::Method(method) => {
            out.push_str(&format!(
                "<bound method {}.{} of ",
                method.receiver.type_name(),
                method.function.name
            ));
            write_repr(&method.receiver, out, active);
            out.push('>');
        }
        Value::Enumerate(pairs) => {
            let addr = Rc::as_ptr(pairs) as usize;
            out.push_str(&format!("<enumerate object at {:#x}>", addr));
        }
    }
}

fn write_items(items: &[Value], out: &mut String, active: &mut Vec<usize>) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_repr(item, out, active);
    }
}

/// Shortest digits that round-trip, laid out the way Python prints floats.
pub fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // `{:e}` yields the shortest round-trip mantissa, e.g. `1.2345e4`
    let sci = format!("{:e}", f);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if (-4..16).contains(&exp) {
        let plain = format!("{}", f);
        if plain.contains('.') {
            plain
        } else {
            format!("{}.0", plain)
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    }
}

/// Quoted string literal: single quotes unless the text has `'` but no `"`.
pub fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use num_bigint::BigInt;

    use crate::object::{Class, Instance};
    use crate::value::{EnumerateValue, Function};

    #[test]
    fn test_scalars() {
        assert_eq!(format(&Value::None), "None");
        assert_eq!(format(&Value::Bool(true)), "True");
        assert_eq!(format(&Value::Bool(false)), "False");
        assert_eq!(format(&Value::int(-2005)), "-2005");
        assert_eq!(format(&Value::str("jon")), "jon");
        assert_eq!(repr(&Value::str("jon")), "'jon'");
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(1.23), "1.23");
        assert_eq!(float_repr(-12345.1), "-12345.1");
        assert_eq!(float_repr(0.001), "0.001");
        assert_eq!(float_repr(0.25), "0.25");
        assert_eq!(float_repr(5.0), "5.0");
        assert_eq!(float_repr(-54.2), "-54.2");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(0.00001), "1e-05");
        assert_eq!(float_repr(1.5e-7), "1.5e-07");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1.2345e100), "1.2345e+100");
        assert_eq!(float_repr(f64::INFINITY), "inf");
        assert_eq!(float_repr(f64::NEG_INFINITY), "-inf");
        assert_eq!(float_repr(f64::NAN), "nan");
        assert_eq!(float_repr(-0.0), "-0.0");
    }

    #[test]
    fn test_str_repr_quotes() {
        assert_eq!(str_repr("it's"), "\"it's\"");
        assert_eq!(str_repr("say \"hi\""), "'say \"hi\"'");
        assert_eq!(str_repr("both ' and \""), "'both \\' and \"'");
        assert_eq!(str_repr("a\nb\t\\"), "'a\\nb\\t\\\\'");
        assert_eq!(str_repr("\u{1}"), "'\\x01'");
        assert_eq!(str_repr("héllo"), "'héllo'");
    }

    #[test]
    fn test_containers() {
        let list = Value::list(vec![
            Value::int(1),
            Value::str("nice"),
            Value::Bool(true),
            Value::tuple(vec![Value::int(1), Value::int(2)]),
        ]);
        assert_eq!(format(&list), "[1, 'nice', True, (1, 2)]");
        assert_eq!(format(&Value::tuple(vec![])), "()");
        assert_eq!(format(&Value::tuple(vec![Value::int(5)])), "(5,)");
        assert_eq!(format(&Value::list(vec![])), "[]");
    }

    #[test]
    fn test_self_referencing_list() {
        let list = Value::list(vec![Value::int(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.copy_for_binding());
        }
        assert_eq!(format(&list), "[1, [...]]");
        if let Value::List(items) = &list {
            items.borrow_mut().clear();
        }
    }

    #[test]
    fn test_shared_list_twice_is_not_recursion() {
        let inner = Value::list(vec![Value::int(1)]);
        let outer = Value::list(vec![inner.copy_for_binding(), inner]);
        assert_eq!(format(&outer), "[[1], [1]]");
    }

    #[test]
    fn test_objects_and_callables() {
        let class = Class::builder("Test").method("go", 1, |_, _| Ok(Value::None)).build();
        let obj = Value::Object(Rc::new(RefCell::new(Instance::new(class.clone()))));

        let text = format(&obj);
        assert!(text.starts_with("<__main__.Test object at 0x"));
        assert!(text.ends_with('>'));

        assert_eq!(format(&Value::Type(class.clone())), "<class '__main__.Test'>");

        let len = Value::Function(Rc::new(Function::builtin("len", 1, |_, _| {
            Ok(Value::None)
        })));
        assert_eq!(format(&len), "<built-in function len>");

        let plain = Value::Function(Rc::new(Function::new("helper", 0, |_, _| {
            Ok(Value::None)
        })));
        assert!(format(&plain).starts_with("<function helper at 0x"));

        let method = crate::object::get_attr(&obj, "go").unwrap();
        let text = format(&method);
        assert!(text.starts_with("<bound method Test.go of <__main__.Test object at 0x"));

        let pairs = Value::Enumerate(Rc::new(EnumerateValue::new(
            Value::list(vec![]),
            BigInt::from(0),
        )));
        assert!(format(&pairs).starts_with("<enumerate object at 0x"));
    }
}
