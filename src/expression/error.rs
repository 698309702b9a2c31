//! Error types for expression evaluation.

use crate::access::DataType;
use thiserror::Error;

/// Errors that can occur during expression evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Runtime operand types not accepted by the operator
    #[error("Invalid operand types for operator {operator}: left={left}, right={right}")]
    InvalidOperandTypes {
        operator: String,
        left: &'static str,
        right: &'static str,
    },

    /// Operand of a logical operator is not boolean
    #[error("{operator} {side} value type not bool: got {actual}")]
    NotBooleanOperand {
        operator: String,
        side: &'static str,
        actual: &'static str,
    },

    /// List element declared type differs from the left operand
    #[error("Type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: DataType,
        actual: DataType,
        context: String,
    },

    /// Right operand of `in`/`between` is not a list literal
    #[error("Operator {operator} right expression is not list")]
    ExpectedList { operator: String },

    /// `between` needs exactly a lower and an upper boundary
    #[error("Operator between expects 2 boundaries, got {actual}")]
    BetweenBoundaryCount { actual: usize },

    #[error("Operator between lower boundary is greater than upper boundary")]
    InvertedBounds,

    /// Field access on a value that is neither the container nor empty
    #[error("Invalid {kind} access on {actual} value")]
    InvalidAccess {
        kind: &'static str,
        actual: &'static str,
    },

    /// Field accessor is neither a string nor a number literal
    #[error("Invalid field accessor: {accessor}")]
    InvalidAccessor { accessor: String },

    #[error("Invalid regular expression: {message}")]
    InvalidRegex { message: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Function {function} expects {expected} arguments, got {actual}")]
    FunctionArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// Function produced a value outside its declared return type
    #[error("Function {function} declared {expected} result but returned {actual}")]
    ReturnTypeMismatch {
        function: String,
        expected: DataType,
        actual: &'static str,
    },

    #[error("Expression result is not boolean")]
    NotBoolean,

    /// Generic evaluation error
    #[error("Expression evaluation error: {message}")]
    EvaluationError { message: String },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
