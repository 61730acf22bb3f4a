// ABOUTME: Error types raised while reading and evaluating expressions

use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_TWO_OR_THREE: &str = "2-3";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_AT_MOST_MAX: &str = "at most 64";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("name error: {0}")]
    Name(String),

    /// Type mismatch with the offending function, expected type, actual
    /// type, and 1-based argument position
    #[error("type error: {function}: expected {expected}, got {actual} at argument {position}")]
    Type {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    #[error("arity error: {function}: expected {expected} argument{}, got {actual}", if *.expected == "1" { "" } else { "s" })]
    Arity {
        function: String,
        expected: String, // "2", "2-3", "at least 1"
        actual: usize,
    },

    #[error("io error: {0}")]
    Io(String),

    /// Runtime condition with function context (division by zero etc.)
    #[error("{function}: {message}")]
    Runtime { function: String, message: String },
}

impl EvalError {
    /// Create a type mismatch error with full context
    pub fn type_error(function: &str, expected: &str, actual: &str, position: usize) -> Self {
        EvalError::Type {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            position,
        }
    }

    /// Create an arity error with expected and actual counts
    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::Arity {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    /// Create a runtime error with function context
    pub fn runtime_error(function: &str, message: impl Into<String>) -> Self {
        EvalError::Runtime {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_error_display() {
        let one = EvalError::arity_error("quote", ARITY_ONE, 2);
        assert_eq!(
            one.to_string(),
            "arity error: quote: expected 1 argument, got 2"
        );

        let two = EvalError::arity_error("cons", ARITY_TWO, 1);
        assert_eq!(
            two.to_string(),
            "arity error: cons: expected 2 arguments, got 1"
        );
    }

    #[test]
    fn test_type_error_display() {
        let err = EvalError::type_error("+", "number", "string", 2);
        assert_eq!(
            err.to_string(),
            "type error: +: expected number, got string at argument 2"
        );
    }

    #[test]
    fn test_name_error_display() {
        let err = EvalError::Name("function 'foo' is undefined".to_string());
        assert_eq!(err.to_string(), "name error: function 'foo' is undefined");
    }
}
