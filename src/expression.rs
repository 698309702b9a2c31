//! Expression evaluation framework for query execution.
//!
//! This module provides:
//! - Expression AST representation (closed sum type of node kinds)
//! - Declared return types driving operator dispatch
//! - Row-at-a-time and batch evaluation against key-value rows
//! - The scalar function registry

pub mod batch;
pub mod error;
pub mod eval;
pub mod expr;
pub mod function;
pub mod operator;

pub use batch::{evaluate_batch, BatchEvaluator};
pub use error::{ExpressionError, ExpressionResult};
pub use eval::{evaluate_expression, ExpressionEvaluator};
pub use expr::{Expression, FieldKeyword, FunctionCall};
pub use function::{Function, FunctionBody, FunctionRegistry};
pub use operator::BinaryOperator;
