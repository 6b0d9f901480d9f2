use thiserror::Error;

/// Errors raised by the runtime core. All of them are recoverable: the
/// embedding evaluator decides whether to surface them to the program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("{message}")]
    TypeMismatch { message: String },

    #[error("{owner} has no attribute '{attribute}'")]
    AttributeNotFound { owner: String, attribute: String },

    #[error("invalid literal for {}(): {}", .target, crate::formatter::str_repr(.input))]
    ParseFailure { target: String, input: String },

    #[error("{operation} arg is an empty sequence")]
    EmptyCollection { operation: String },

    #[error("{kind} index {index} out of range (length {len})")]
    IndexOutOfRange {
        kind: String,
        index: String,
        len: usize,
    },

    #[error("expected {expected} values to unpack, got {got}")]
    UnpackMismatch { expected: usize, got: usize },

    #[error("name '{name}' is not defined")]
    NameNotFound { name: String },

    #[error("{name}() takes {expected} arguments but {got} were given")]
    WrongArity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("'{type_name}' object is not callable")]
    NotCallable { type_name: String },

    #[error("{message}")]
    DivisionByZero { message: String },

    #[error("{message}")]
    Overflow { message: String },

    #[error("{message}")]
    RecursionLimit { message: String },
}

impl RuntimeError {
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        RuntimeError::TypeMismatch {
            message: message.into(),
        }
    }

    pub fn parse_failure(target: &str, input: &str) -> Self {
        RuntimeError::ParseFailure {
            target: target.to_string(),
            input: input.to_string(),
        }
    }

    /// Name of the Python exception class this error surfaces as.
    pub fn python_name(&self) -> &'static str {
        match self {
            RuntimeError::TypeMismatch { .. } => "TypeError",
            RuntimeError::AttributeNotFound { .. } => "AttributeError",
            RuntimeError::ParseFailure { .. } => "ValueError",
            RuntimeError::EmptyCollection { .. } => "ValueError",
            RuntimeError::IndexOutOfRange { .. } => "IndexError",
            RuntimeError::UnpackMismatch { .. } => "ValueError",
            RuntimeError::NameNotFound { .. } => "NameError",
            RuntimeError::WrongArity { .. } => "TypeError",
            RuntimeError::NotCallable { .. } => "TypeError",
            RuntimeError::DivisionByZero { .. } => "ZeroDivisionError",
            RuntimeError::Overflow { .. } => "OverflowError",
            RuntimeError::RecursionLimit { .. } => "RecursionError",
        }
    }

    /// `ExcName: message`, the way a traceback's last line reads.
    pub fn report(&self) -> String {
        format!("{}: {}", self.python_name(), self)
    }
}

pub type RtResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_names() {
        assert_eq!(RuntimeError::type_mismatch("x").python_name(), "TypeError");
        assert_eq!(
            RuntimeError::parse_failure("int", "abc").python_name(),
            "ValueError"
        );
        assert_eq!(
            RuntimeError::NameNotFound {
                name: "x".to_string()
            }
            .python_name(),
            "NameError"
        );
        assert_eq!(
            RuntimeError::DivisionByZero {
                message: "division by zero".to_string()
            }
            .python_name(),
            "ZeroDivisionError"
        );
    }

    #[test]
    fn test_messages() {
        let err = RuntimeError::AttributeNotFound {
            owner: "'Test' object".to_string(),
            attribute: "z".to_string(),
        };
        assert_eq!(
            err.report(),
            "AttributeError: 'Test' object has no attribute 'z'"
        );

        let err = RuntimeError::parse_failure("int", "abc");
        assert_eq!(err.to_string(), "invalid literal for int(): 'abc'");

        let err = RuntimeError::parse_failure("float", "it's\n");
        assert_eq!(err.to_string(), "invalid literal for float(): \"it's\\n\"");

        let err = RuntimeError::RecursionLimit {
            message: "maximum recursion depth exceeded in comparison".to_string(),
        };
        assert_eq!(
            err.report(),
            "RecursionError: maximum recursion depth exceeded in comparison"
        );

        let err = RuntimeError::EmptyCollection {
            operation: "min()".to_string(),
        };
        assert_eq!(err.to_string(), "min() arg is an empty sequence");

        let err = RuntimeError::WrongArity {
            name: "len".to_string(),
            expected: "1".to_string(),
            got: 2,
        };
        assert_eq!(err.to_string(), "len() takes 1 arguments but 2 were given");
    }
}
