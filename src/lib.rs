//! pyrt - the value, object and built-in core of a Python-like runtime
//!
//! Compiled programs call into this crate for everything observable: value
//! bindings with Python's copy-or-share rules, attribute lookup on
//! user-defined classes, the built-in function table and the exact text that
//! `print` produces.

pub mod builtins;
pub mod error;
pub mod formatter;
pub mod logging;
pub mod object;
pub mod ops;
pub mod programs;
pub mod runtime;
pub mod scope;
pub mod value;

// Re-export commonly used types
pub use error::{RtResult, RuntimeError};
pub use object::{Class, ClassBuilder, Instance};
pub use ops::{compare, compare_chain, membership, CompareOp};
pub use runtime::{Runtime, RuntimeConfig};
pub use value::Value;

/// Run a hosted program by name and capture what it prints
///
/// # Example
/// ```
/// let lines = pyrt::run_program("print_args").unwrap();
/// assert_eq!(lines, vec!["3 hello".to_string()]);
/// ```
pub fn run_program(name: &str) -> RtResult<Vec<String>> {
    let program = programs::find(name).ok_or_else(|| RuntimeError::NameNotFound {
        name: name.to_string(),
    })?;
    program.run_captured()
}
