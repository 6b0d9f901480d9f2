//! Hosted programs.
//!
//! Each program drives the runtime the way compiled code does: bindings go
//! through a scope, attribute reads and writes through the runtime, calls
//! through `call_value`/`call_method`, output through the `print` built-in.
//! Their printed output is checked against `tests/golden/<name>.expected`.

use std::rc::Rc;

use crate::error::RtResult;
use crate::object::Class;
use crate::ops::{self, CompareOp};
use crate::runtime::{Runtime, RuntimeConfig};
use crate::scope::{Environment, Scope};
use crate::value::{unpack_args, Function, Value};

pub struct Program {
    pub name: &'static str,
    pub summary: &'static str,
    body: fn(&mut Runtime) -> RtResult<()>,
}

impl Program {
    /// Run against `rt`, tagging log records with this program's name.
    pub fn execute(&self, rt: &mut Runtime) -> RtResult<()> {
        rt.set_current_program(Some(self.name));
        let result = (self.body)(rt);
        rt.set_current_program(None);
        result
    }

    /// Run in a fresh capturing runtime and return the printed lines.
    pub fn run_captured(&self) -> RtResult<Vec<String>> {
        let mut rt = Runtime::with_config(RuntimeConfig::capture());
        self.execute(&mut rt)?;
        Ok(rt.take_output())
    }
}

static PROGRAMS: [Program; 9] = [
    Program {
        name: "class_call",
        summary: "instantiate a class and call a method on the instance",
        body: class_call,
    },
    Program {
        name: "object_aliasing",
        summary: "two names for one object; methods mutate the shared instance",
        body: object_aliasing,
    },
    Program {
        name: "builtins",
        summary: "len, min, int, float and enumerate edge cases",
        body: builtins_tour,
    },
    Program {
        name: "operators",
        summary: "membership, chained comparisons, equality and exponentiation",
        body: operators,
    },
    Program {
        name: "print_args",
        summary: "print with several positional arguments",
        body: print_args,
    },
    Program {
        name: "class_attributes",
        summary: "class attributes, __init__ fields and a method called on the type",
        body: class_attributes,
    },
    Program {
        name: "shared_arguments",
        summary: "objects passed to functions are shared, not copied",
        body: shared_arguments,
    },
    Program {
        name: "attribute_shadowing",
        summary: "instance writes shadow class attributes for that instance only",
        body: attribute_shadowing,
    },
    Program {
        name: "value_semantics",
        summary: "list aliasing versus value rebinding, and value formatting",
        body: value_semantics,
    },
];

pub fn all() -> &'static [Program] {
    &PROGRAMS
}

pub fn find(name: &str) -> Option<&'static Program> {
    PROGRAMS.iter().find(|p| p.name == name)
}

fn s(text: &str) -> Value {
    Value::str(text)
}

fn int(n: i64) -> Value {
    Value::int(n)
}

fn get(scope: &Scope, name: &str) -> RtResult<Value> {
    scope.borrow().lookup(name)
}

fn bind(scope: &Scope, name: &str, value: Value) {
    scope.borrow_mut().define(name, value);
}

fn print(rt: &mut Runtime, args: Vec<Value>) -> RtResult<()> {
    rt.call_builtin("print", args)?;
    Ok(())
}

fn str_of(rt: &mut Runtime, value: Value) -> RtResult<Value> {
    rt.call_builtin("str", vec![value])
}

/// `parts[0] + parts[1] + ...`
fn concat(parts: Vec<Value>) -> RtResult<Value> {
    let mut parts = parts.into_iter();
    let mut acc = parts.next().unwrap_or_else(|| s(""));
    for part in parts {
        acc = ops::add(&acc, &part)?;
    }
    Ok(acc)
}

/// `print(label + str(target.attr))`
fn print_attr(rt: &mut Runtime, label: &str, target: &Value, attr: &str) -> RtResult<()> {
    let value = rt.get_attr(target, attr)?;
    let text = str_of(rt, value)?;
    let line = concat(vec![s(label), text])?;
    print(rt, vec![line])
}

fn class_call(rt: &mut Runtime) -> RtResult<()> {
    let globals = rt.globals();
    let some_class = Class::builder("SomeClass")
        .attr("y", int(4))
        .method("func", 2, |rt, args| {
            let [_this, g] = unpack_args("func", args)?;
            print(rt, vec![g])?;
            Ok(Value::None)
        })
        .build();
    bind(&globals, "SomeClass", Value::Type(some_class));

    let class = get(&globals, "SomeClass")?;
    let c = rt.call_value(&class, vec![])?;
    bind(&globals, "c", c);

    let c = get(&globals, "c")?;
    rt.call_method(&c, "func", vec![s("member function call on class")])?;
    Ok(())
}

fn aliasing_test_class() -> Rc<Class> {
    Class::builder("Test")
        .attr("var", int(2))
        .method("__init__", 3, |rt, args| {
            let [this, x, y] = unpack_args("__init__", args)?;
            rt.set_attr(&this, "x", x)?;
            rt.set_attr(&this, "y", y)?;
            Ok(Value::None)
        })
        .method("method", 1, |rt, args| {
            let [this] = unpack_args("method", args)?;
            print_attr(rt, "method: self.x = ", &this, "x")?;
            print_attr(rt, "method: self.y = ", &this, "y")?;
            print(rt, vec![s("Updating self.x")])?;
            rt.set_attr(&this, "x", s("`method` updated my value"))?;
            Ok(Value::None)
        })
        .method("swapxy", 1, |rt, args| {
            let [this] = unpack_args("swapxy", args)?;
            let locals = Environment::child(&rt.globals());
            bind(&locals, "temp", rt.get_attr(&this, "x")?);
            let y = rt.get_attr(&this, "y")?;
            rt.set_attr(&this, "x", y)?;
            let temp = get(&locals, "temp")?;
            rt.set_attr(&this, "y", temp)?;
            Ok(Value::None)
        })
        .build()
}

/// `obj.x: .. obj.y: .. obj.var: ..` for the object bound to `name`
fn print_state(rt: &mut Runtime, scope: &Scope, name: &str) -> RtResult<()> {
    let obj = get(scope, name)?;
    let mut parts = Vec::new();
    for (i, attr) in ["x", "y", "var"].iter().enumerate() {
        let sep = if i == 0 { "" } else { " " };
        parts.push(s(&format!("{}{}.{}: ", sep, name, attr)));
        let value = rt.get_attr(&obj, attr)?;
        parts.push(str_of(rt, value)?);
    }
    let line = concat(parts)?;
    print(rt, vec![line])
}

fn object_aliasing(rt: &mut Runtime) -> RtResult<()> {
    let globals = rt.globals();
    bind(&globals, "Test", Value::Type(aliasing_test_class()));
    bind(&globals, "int_val", int(5));

    let class = get(&globals, "Test")?;
    let obj1 = rt.call_value(&class, vec![s("x value"), s("y value")])?;
    bind(&globals, "obj1", obj1);
    bind(&globals, "obj2", get(&globals, "obj1")?);

    print(rt, vec![s("Updating obj1.var ...")])?;
    rt.set_attr(&get(&globals, "obj1")?, "var", int(4))?;
    print_attr(rt, "obj1.var: ", &get(&globals, "obj1")?, "var")?;
    print_attr(rt, "obj2.var: ", &get(&globals, "obj2")?, "var")?;

    print(rt, vec![s("Updating obj2.x ...")])?;
    print_attr(rt, "PRE obj1.x: ", &get(&globals, "obj1")?, "x")?;
    print_attr(rt, "PRE obj2.x: ", &get(&globals, "obj2")?, "x")?;
    rt.set_attr(&get(&globals, "obj2")?, "x", s("changed string"))?;
    print_attr(rt, "POST obj1.x: ", &get(&globals, "obj1")?, "x")?;
    print_attr(rt, "POST obj2.x: ", &get(&globals, "obj2")?, "x")?;

    print(rt, vec![s("Assign obj2.var to variable 'a'")])?;
    let var = rt.get_attr(&get(&globals, "obj2")?, "var")?;
    bind(&globals, "a", var);
    let a = str_of(rt, get(&globals, "a")?)?;
    print(rt, vec![concat(vec![s("a: "), a])?])?;

    print(rt, vec![s("Modify 'a' to show that obj2.var won't be effected")])?;
    globals.borrow_mut().assign("a", int(15));
    let a = str_of(rt, get(&globals, "a")?)?;
    print(rt, vec![concat(vec![s("a: "), a])?])?;
    print_attr(rt, "obj2.var: ", &get(&globals, "obj2")?, "var")?;

    print(rt, vec![s("Calling obj1.method() ...")])?;
    rt.call_method(&get(&globals, "obj1")?, "method", vec![])?;
    print(rt, vec![s("State of obj1 & obj2 after call")])?;
    print_state(rt, &globals, "obj1")?;
    print_state(rt, &globals, "obj2")?;

    print(rt, vec![s("Calling obj1.swapxy() ...")])?;
    rt.call_method(&get(&globals, "obj1")?, "swapxy", vec![])?;
    print_state(rt, &globals, "obj1")?;
    print_state(rt, &globals, "obj2")?;
    Ok(())
}

fn call_and_print(rt: &mut Runtime, builtin: &str, args: Vec<Value>) -> RtResult<()> {
    let result = rt.call_builtin(builtin, args)?;
    print(rt, vec![result])
}

fn builtins_tour(rt: &mut Runtime) -> RtResult<()> {
    print(rt, vec![s("Built-In Test: len()")])?;
    let len_args = vec![
        s("this is a string"),
        Value::list(vec![
            int(1),
            int(2),
            s("list"),
            s("this"),
            s("self"),
            Value::Bool(true),
            Value::Bool(false),
            Value::list(vec![s("inner"), s("list")]),
        ]),
        Value::tuple(vec![s("tuple"), s("test"), int(1), int(2), int(3)]),
        s(""),
        Value::tuple(vec![]),
        Value::list(vec![]),
    ];
    for arg in len_args {
        call_and_print(rt, "len", vec![arg])?;
    }

    print(rt, vec![s("Built-In Test: min()")])?;
    let ints = |ns: &[i64]| ns.iter().map(|n| int(*n)).collect::<Vec<_>>();
    let mut with_float = ints(&[5, 2, 7, 1, -20, 15, 90]);
    with_float.push(Value::float(-54.2));
    let mut big_negative = ints(&[-2005, 2, 7, 1, -20, 15, 90]);
    big_negative.push(Value::float(-54.2));
    let min_calls = vec![
        vec![Value::list(ints(&[5, 2, 7, 1, -20, 15, 90]))],
        vec![Value::list(with_float)],
        vec![Value::list(big_negative)],
        vec![Value::tuple(ints(&[6, 7, -2]))],
        ints(&[1, 2]),
        ints(&[-21, -2]),
        vec![Value::float(52.0), int(1)],
        vec![int(52), Value::float(1.0), int(-12)],
        vec![
            int(52),
            Value::float(1.0),
            int(12),
            int(3),
            int(5),
            int(7),
            Value::float(21.2),
            int(4),
            int(0),
            int(2),
        ],
    ];
    for args in min_calls {
        call_and_print(rt, "min", args)?;
    }

    print(rt, vec![s("Built-In Test: int()")])?;
    for text in ["       102       \n", "501", "-501", "0"] {
        call_and_print(rt, "int", vec![s(text)])?;
    }

    print(rt, vec![s("Built-In Test: float()")])?;
    for text in ["1.23", "     -12345.1\n", "1e-003", "2.5E-1", ".5     "] {
        call_and_print(rt, "float", vec![s(text)])?;
    }

    print(rt, vec![s("Built-In Test: enumerate()")])?;
    let globals = rt.globals();
    bind(
        &globals,
        "a",
        Value::list(vec![
            s("jon"),
            s("some"),
            int(1),
            int(2),
            int(3),
            Value::Bool(true),
            Value::Bool(false),
        ]),
    );

    let pairs = rt.call_builtin("enumerate", vec![get(&globals, "a")?])?;
    for pair in pairs.iterate()? {
        let [x, y] = pair.unpack::<2>()?;
        print(rt, vec![x, y])?;
    }
    let pairs = rt.call_builtin("enumerate", vec![get(&globals, "a")?, int(-5)])?;
    for pair in pairs.iterate()? {
        let [x, y] = pair.unpack::<2>()?;
        print(rt, vec![x, y])?;
    }

    // [(x, y) for x, y in enumerate(a)]
    let pairs = rt.call_builtin("enumerate", vec![get(&globals, "a")?])?;
    let mut collected = Vec::new();
    for pair in pairs.iterate()? {
        let [x, y] = pair.unpack::<2>()?;
        collected.push(Value::tuple(vec![x, y]));
    }
    print(rt, vec![Value::list(collected)])
}

fn print_compare(rt: &mut Runtime, a: Value, op: CompareOp, b: Value) -> RtResult<()> {
    let result = ops::compare(&a, op, &b)?;
    print(rt, vec![Value::Bool(result)])
}

fn operators(rt: &mut Runtime) -> RtResult<()> {
    let globals = rt.globals();
    bind(
        &globals,
        "a",
        Value::list(vec![
            int(1),
            int(2),
            int(3),
            int(4),
            s("True"),
            Value::Bool(true),
            Value::Bool(false),
            int(-5),
            Value::tuple(vec![int(1), int(2)]),
        ]),
    );
    let a = get(&globals, "a")?;

    // 1 in [1, 2] in [[1, 2], 3, 4]
    let chained = ops::compare_chain(
        &[
            int(1),
            Value::list(vec![int(1), int(2)]),
            Value::list(vec![Value::list(vec![int(1), int(2)]), int(3), int(4)]),
        ],
        &[CompareOp::In, CompareOp::In],
    )?;
    print(rt, vec![Value::Bool(chained)])?;

    print(rt, vec![s("String in list lookup")])?;
    print_compare(rt, s("True"), CompareOp::In, a.copy_for_binding())?;
    print_compare(rt, s("True"), CompareOp::NotIn, a.copy_for_binding())?;
    print_compare(rt, int(-5), CompareOp::In, a.copy_for_binding())?;

    if ops::compare(&Value::tuple(vec![int(1), int(2)]), CompareOp::In, &a)? {
        print(rt, vec![s("Woa nice, it is!")])?;
    }
    if ops::compare(&s("jon"), CompareOp::NotIn, &a)? {
        print(rt, vec![s("jon is not in a")])?;
    }

    print_compare(
        rt,
        Value::list(vec![int(1), int(2), int(3)]),
        CompareOp::In,
        Value::list(vec![
            Value::list(vec![int(1), int(2), int(3)]),
            Value::list(vec![int(4), int(5), int(6)]),
        ]),
    )?;
    let names = || {
        Value::list(vec![
            s("jon"),
            s("cat"),
            int(1),
            int(2),
            s("jon"),
            Value::Bool(true),
            int(0),
            int(-1),
        ])
    };
    print_compare(rt, s("jon"), CompareOp::In, names())?;
    print_compare(rt, s("jon"), CompareOp::NotIn, names())?;

    print_compare(rt, int(1), CompareOp::Gt, int(2))?;
    print_compare(rt, int(1), CompareOp::Lt, int(2))?;
    let nice = |first: i64| Value::list(vec![int(first), s("nice"), Value::Bool(true)]);
    print_compare(rt, nice(1), CompareOp::Eq, nice(1))?;
    print_compare(rt, nice(1), CompareOp::Eq, nice(3))?;
    print(rt, vec![s("!= test")])?;
    print_compare(rt, nice(1), CompareOp::NotEq, nice(3))?;

    print_compare(rt, int(5), CompareOp::GtE, int(3))?;
    print_compare(rt, int(5), CompareOp::LtE, int(3))?;
    print_compare(rt, int(-2), CompareOp::LtE, int(3))?;
    print_compare(rt, int(-2), CompareOp::GtE, int(3))?;

    print_compare(rt, s(""), CompareOp::In, s("some string"))?;
    print_compare(
        rt,
        s("substring"),
        CompareOp::In,
        s("this string has a substring woa"),
    )?;

    let power = ops::pow(&int(1), &int(2))?;
    print(rt, vec![power])?;
    let power = ops::pow(&int(0), &int(5))?;
    print(rt, vec![power])
}

fn print_args(rt: &mut Runtime) -> RtResult<()> {
    let globals = rt.globals();
    bind(&globals, "a", int(3));
    bind(&globals, "b", s("hello"));
    let args = vec![get(&globals, "a")?, get(&globals, "b")?];
    print(rt, args)
}

fn class_attributes(rt: &mut Runtime) -> RtResult<()> {
    let test = Class::builder("Test")
        .attr("x", int(5))
        .attr("y", int(2))
        .method("__init__", 3, |rt, args| {
            let [this, y, z] = unpack_args("__init__", args)?;
            rt.set_attr(&this, "first", y)?;
            rt.set_attr(&this, "second", z)?;
            if Value::Bool(true).is_truthy() {
                rt.set_attr(&this, "true", Value::Bool(true))?;
            } else {
                rt.set_attr(&this, "true", Value::Bool(false))?;
                rt.set_attr(&this, "false", Value::Bool(true))?;
            }
            let t = Value::tuple(vec![int(500), int(600)]);
            rt.set_attr(&this, "tup1", t.get_item(&int(0))?)?;
            rt.set_attr(&this, "tup2", t.get_item(&int(1))?)?;
            Ok(Value::None)
        })
        .method("some_func", 4, |rt, args| {
            let [_this, a, b, c] = unpack_args("some_func", args)?;
            print(rt, vec![a, b, c])?;
            Ok(Value::None)
        })
        .method("class_func", 1, |rt, args| {
            let [b] = unpack_args("class_func", args)?;
            print(rt, vec![s("Class func"), b])?;
            Ok(Value::None)
        })
        .build();

    let globals = rt.globals();
    bind(&globals, "Test", Value::Type(test));
    let class = get(&globals, "Test")?;
    let a = rt.call_value(&class, vec![s("first"), s("second")])?;
    bind(&globals, "a", a);

    let a = get(&globals, "a")?;
    let mut fields = Vec::new();
    for attr in ["x", "y", "first", "second", "true", "tup1", "tup2"] {
        fields.push(rt.get_attr(&a, attr)?);
    }
    print(rt, fields)?;

    rt.call_method(&a, "some_func", vec![s("a"), s("b"), s("c")])?;
    rt.call_method(&class, "class_func", vec![s("woo")])?;
    Ok(())
}

fn print_xy(rt: &mut Runtime, obj: &Value) -> RtResult<()> {
    let x = rt.get_attr(obj, "x")?;
    let y = rt.get_attr(obj, "y")?;
    print(rt, vec![x, y])
}

fn shared_arguments(rt: &mut Runtime) -> RtResult<()> {
    let test = Class::builder("Test")
        .method("__init__", 2, |rt, args| {
            let [this, x] = unpack_args("__init__", args)?;
            rt.set_attr(&this, "x", x)?;
            rt.set_attr(&this, "y", s("hello"))?;
            Ok(Value::None)
        })
        .method("some_func", 2, |rt, args| {
            let [this, other] = unpack_args("some_func", args)?;
            print_xy(rt, &this)?;
            print_xy(rt, &other)?;
            Ok(Value::None)
        })
        .build();

    // def func(one, two)
    let func = Function::new("func", 2, |rt, args| {
        let locals = Environment::child(&rt.globals());
        let [one, two] = unpack_args("func", args)?;
        bind(&locals, "one", one);
        bind(&locals, "two", two);

        let one = get(&locals, "one")?;
        let two = get(&locals, "two")?;
        let x = rt.get_attr(&two, "x")?;
        rt.set_attr(&one, "x", x)?;
        let y = rt.get_attr(&one, "y")?;
        rt.set_attr(&two, "y", y)?;

        print_xy(rt, &one)?;
        print_xy(rt, &two)?;
        Ok(Value::None)
    });

    let globals = rt.globals();
    bind(&globals, "Test", Value::Type(test));
    bind(&globals, "func", Value::Function(Rc::new(func)));

    let class = get(&globals, "Test")?;
    let a = rt.call_value(&class, vec![int(10)])?;
    bind(&globals, "a", a);
    let b = rt.call_value(&class, vec![int(5)])?;
    bind(&globals, "b", b);
    bind(&globals, "c", get(&globals, "b")?);

    rt.call_method(&get(&globals, "a")?, "some_func", vec![get(&globals, "c")?])?;
    let func = get(&globals, "func")?;
    rt.call_value(&func, vec![get(&globals, "a")?, get(&globals, "c")?])?;

    for name in ["a", "b", "c"] {
        print_xy(rt, &get(&globals, name)?)?;
    }

    rt.set_attr(&get(&globals, "b")?, "x", int(499))?;
    print_xy(rt, &get(&globals, "c")?)
}

fn attribute_shadowing(rt: &mut Runtime) -> RtResult<()> {
    let globals = rt.globals();
    bind(
        &globals,
        "T",
        Value::Type(Class::builder("T").attr("k", int(2)).build()),
    );
    let class = get(&globals, "T")?;
    let i1 = rt.call_value(&class, vec![])?;
    let i2 = rt.call_value(&class, vec![])?;
    bind(&globals, "i1", i1);
    bind(&globals, "i2", i2);

    let i1 = get(&globals, "i1")?;
    let i2 = get(&globals, "i2")?;
    rt.set_attr(&i1, "k", int(4))?;
    let row = vec![
        rt.get_attr(&i1, "k")?,
        rt.get_attr(&i2, "k")?,
        rt.get_attr(&class, "k")?,
    ];
    print(rt, row)?;

    rt.set_attr(&class, "k", int(7))?;
    let row = vec![rt.get_attr(&i1, "k")?, rt.get_attr(&i2, "k")?];
    print(rt, row)
}

fn value_semantics(rt: &mut Runtime) -> RtResult<()> {
    let globals = rt.globals();

    // a = [1, 2]; b = a; b[0] = 99
    bind(&globals, "a", Value::list(vec![int(1), int(2)]));
    bind(&globals, "b", get(&globals, "a")?);
    get(&globals, "b")?.set_item(&int(0), int(99))?;
    print(rt, vec![get(&globals, "a")?])?;

    let a = get(&globals, "a")?;
    let b = get(&globals, "b")?;
    let fresh = Value::list(vec![int(99), int(2)]);
    let row = vec![
        Value::Bool(ops::compare(&a, CompareOp::Is, &b)?),
        Value::Bool(ops::compare(&a, CompareOp::Eq, &fresh)?),
        Value::Bool(ops::compare(&a, CompareOp::Is, &fresh)?),
    ];
    print(rt, row)?;

    // t = (1, 2); u = t; u = u + (3,)
    bind(&globals, "t", Value::tuple(vec![int(1), int(2)]));
    bind(&globals, "u", get(&globals, "t")?);
    let grown = ops::add(&get(&globals, "u")?, &Value::tuple(vec![int(3)]))?;
    globals.borrow_mut().assign("u", grown);
    print(rt, vec![get(&globals, "t")?, get(&globals, "u")?])?;
    print(rt, vec![Value::tuple(vec![int(5)]), Value::tuple(vec![])])?;

    // s = "abc"; r = s; r = r + "d"
    bind(&globals, "s", s("abc"));
    bind(&globals, "r", get(&globals, "s")?);
    let longer = ops::add(&get(&globals, "r")?, &s("d"))?;
    globals.borrow_mut().assign("r", longer);
    print(rt, vec![get(&globals, "s")?, get(&globals, "r")?])?;

    let quoted = rt.call_builtin("repr", vec![s("it's")])?;
    print(rt, vec![quoted, Value::list(vec![s("a"), s("q\"")])])?;

    let sum = ops::add(&Value::float(0.1), &Value::float(0.2))?;
    print(
        rt,
        vec![Value::float(1e16), Value::float(1e-05), sum, Value::float(2.0)],
    )?;
    let big = ops::pow(&int(2), &int(100))?;
    print(rt, vec![big])?;
    let row = vec![
        ops::floor_div(&int(7), &int(-2))?,
        ops::modulo(&int(7), &int(-2))?,
        ops::true_div(&int(-7), &int(2))?,
    ];
    print(rt, row)?;
    let row = vec![
        ops::add(&Value::Bool(true), &int(1))?,
        ops::mul(&int(3), &s("ab"))?,
    ];
    print(rt, row)
}
