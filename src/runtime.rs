//! The runtime façade an evaluator drives: global scope with the built-in
//! table, call dispatch, instance construction, attribute access, output
//! capture and logging.

use std::cell::RefCell;
use std::rc::Rc;

use crate::builtins;
use crate::error::{RtResult, RuntimeError};
use crate::formatter;
use crate::logging::{parse_filter, LogFilter, LogFormat, LogLevel, LogRecord, LogSink, LoggerCore};
use crate::object::{self, Class, Instance};
use crate::scope::{Environment, Scope};
use crate::value::Value;

pub const OBJECT_TARGET: &str = "pyrt::object";
pub const BUILTINS_TARGET: &str = "pyrt::builtins";

/// How a `Runtime` reports output and logs.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Echo every printed line to stdout as well as capturing it
    pub echo: bool,
    pub log_filter: LogFilter,
    pub log_format: LogFormat,
    /// Keep log lines in memory instead of writing them to stderr
    pub log_to_memory: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            echo: true,
            log_filter: LogFilter::default(),
            log_format: LogFormat::Text,
            log_to_memory: false,
        }
    }
}

impl RuntimeConfig {
    /// Settings from `PYRT_LOG`, `PYRT_LOG_LEVEL` and `PYRT_LOG_FORMAT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`. Invalid values
    /// print a warning and leave the default in place.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = RuntimeConfig::default();

        if let Some(spec) = lookup("PYRT_LOG") {
            match parse_filter(&spec) {
                Ok(filter) => config.log_filter = filter,
                Err(err) => eprintln!("Warning: Invalid PYRT_LOG filter '{}': {}", spec, err),
            }
        } else if let Some(level_str) = lookup("PYRT_LOG_LEVEL") {
            match LogLevel::parse_level(&level_str) {
                Some(level) => config.log_filter = LogFilter::new(level),
                None => eprintln!("Warning: Invalid PYRT_LOG_LEVEL '{}'", level_str),
            }
        }

        if let Some(format) = lookup("PYRT_LOG_FORMAT") {
            match LogFormat::parse(&format) {
                Some(format) => config.log_format = format,
                None => eprintln!("Warning: Invalid PYRT_LOG_FORMAT '{}'", format),
            }
        }

        config
    }

    /// Output is captured only; logs go to memory.
    pub fn capture() -> Self {
        RuntimeConfig {
            echo: false,
            log_to_memory: true,
            ..RuntimeConfig::default()
        }
    }

    pub fn with_filter(mut self, spec: &str) -> Result<Self, String> {
        self.log_filter = parse_filter(spec)?;
        Ok(self)
    }
}

pub struct Runtime {
    globals: Scope,
    output: Vec<String>,
    echo: bool,
    logger: LoggerCore,
    current_program: Option<String>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::from_env())
    }

    /// A runtime whose output is only captured, for tests and `pyrt check`
    pub fn capturing() -> Self {
        Self::with_config(RuntimeConfig::capture())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let globals: Scope = Rc::new(RefCell::new(Environment::new()));
        builtins::define_natives(&globals);
        globals
            .borrow_mut()
            .define("__name__", Value::str("__main__"));

        let mut logger = LoggerCore::new();
        logger.filter = config.log_filter;
        logger.format = config.log_format;
        if config.log_to_memory {
            logger.sinks = vec![LogSink::memory(1000)];
        }

        Runtime {
            globals,
            output: Vec::new(),
            echo: config.echo,
            logger,
            current_program: None,
        }
    }

    pub fn globals(&self) -> Scope {
        Rc::clone(&self.globals)
    }

    pub fn define_global(&self, name: &str, value: Value) {
        self.globals.borrow_mut().define(name, value);
    }

    pub fn lookup(&self, name: &str) -> RtResult<Value> {
        self.globals.borrow().lookup(name)
    }

    /// The built-in bound to `name` in the global scope
    pub fn builtin(&self, name: &str) -> RtResult<Value> {
        self.lookup(name)
    }

    pub fn call_builtin(&mut self, name: &str, args: Vec<Value>) -> RtResult<Value> {
        let func = self.builtin(name)?;
        self.call_value(&func, args)
    }

    /// Call anything callable: functions, bound methods and types (which
    /// construct an instance).
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> RtResult<Value> {
        match callee {
            Value::Function(func) => {
                if func.is_builtin() && self.logger.enabled(LogLevel::Trace, BUILTINS_TARGET) {
                    let record = LogRecord::new(LogLevel::Trace, BUILTINS_TARGET, "builtin call")
                        .field("name", Value::str(&func.name))
                        .field("args", Value::tuple(args.clone()));
                    self.log(record);
                }
                let func = Rc::clone(func);
                func.invoke(self, args)
            }
            Value::Method(method) => {
                if self.logger.enabled(LogLevel::Debug, OBJECT_TARGET) {
                    let record = LogRecord::new(LogLevel::Debug, OBJECT_TARGET, "method dispatch")
                        .field("type", Value::Str(method.receiver.type_name()))
                        .field("method", Value::str(&method.function.name));
                    self.log(record);
                }
                let method = Rc::clone(method);
                method.function.invoke(self, method.bind_args(args))
            }
            Value::Type(class) => self.new_instance(class, args),
            other => Err(RuntimeError::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    /// Allocate an instance of `class` and run `__init__` on it exactly once.
    pub fn new_instance(&mut self, class: &Rc<Class>, args: Vec<Value>) -> RtResult<Value> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(class))));
        let obj = Value::Object(Rc::clone(&instance));

        match class.find_method("__init__") {
            Some(init) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(obj.copy_for_binding());
                full.extend(args);
                let returned = init.invoke(self, full)?;
                if !matches!(returned, Value::None) {
                    return Err(RuntimeError::type_mismatch(format!(
                        "__init__() should return None, not '{}'",
                        returned.type_name()
                    )));
                }
            }
            None if !args.is_empty() => {
                return Err(RuntimeError::WrongArity {
                    name: class.name.clone(),
                    expected: "0".to_string(),
                    got: args.len(),
                });
            }
            None => {}
        }
        instance.borrow_mut().mark_initialized();

        if self.logger.enabled(LogLevel::Debug, OBJECT_TARGET) {
            let record = LogRecord::new(LogLevel::Debug, OBJECT_TARGET, "instance created")
                .field("type", Value::str(&class.name));
            self.log(record);
        }
        Ok(obj)
    }

    pub fn get_attr(&self, target: &Value, name: &str) -> RtResult<Value> {
        object::get_attr(target, name)
    }

    pub fn set_attr(&mut self, target: &Value, name: &str, value: Value) -> RtResult<()> {
        let shadows = object::set_attr(target, name, value)?;
        if shadows && self.logger.enabled(LogLevel::Debug, OBJECT_TARGET) {
            let record = LogRecord::new(LogLevel::Debug, OBJECT_TARGET, "class attribute shadowed")
                .field("type", Value::Str(target.type_name()))
                .field("name", Value::str(name));
            self.log(record);
        }
        Ok(())
    }

    /// `target.name(*args)`
    pub fn call_method(&mut self, target: &Value, name: &str, args: Vec<Value>) -> RtResult<Value> {
        let callee = self.get_attr(target, name)?;
        self.call_value(&callee, args)
    }

    /// `print(*args)`: space-separated `str` of each argument
    pub fn print(&mut self, args: &[Value]) {
        let line = args
            .iter()
            .map(formatter::format)
            .collect::<Vec<_>>()
            .join(" ");
        self.write_line(line);
    }

    pub fn write_line(&mut self, line: String) {
        if self.echo {
            println!("{}", line);
        }
        self.output.push(line);
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub fn logger(&self) -> &LoggerCore {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut LoggerCore {
        &mut self.logger
    }

    pub fn log(&mut self, mut record: LogRecord) {
        if record.source.is_none() {
            record.source = self.current_program.clone();
        }
        self.logger.log(&record);
    }

    /// Name of the hosted program being run, attached to log records
    pub fn set_current_program(&mut self, name: Option<&str>) {
        self.current_program = name.map(str::to_string);
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
