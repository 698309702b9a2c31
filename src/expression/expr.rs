//! Expression AST definitions.

use crate::access::{DataType, Value};
use crate::expression::function::FunctionRegistry;
use crate::expression::operator::BinaryOperator;
use std::fmt;

/// Row field addressed by the `key` / `value` keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKeyword {
    Key,
    Value,
}

impl FieldKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKeyword::Key => "key",
            FieldKeyword::Value => "value",
        }
    }
}

/// Call of a registered scalar function.
///
/// `result` is a memoized constant. This crate never fills it in; when a
/// caller has folded the call ahead of execution, evaluation returns the
/// cached value without invoking the function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
    pub result: Option<Value>,
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// String literal
    String(String),

    /// `key` or `value` of the current row
    Field(FieldKeyword),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Logical negation
    Not(Box<Expression>),

    /// Scalar function call
    FunctionCall(FunctionCall),

    /// Bare name literal
    Name(String),

    /// Integer literal
    Number(i64),

    /// Float literal
    Float(f64),

    /// Boolean literal
    Bool(bool),

    /// List literal, only legal as the right operand of `in` / `between`
    List(Vec<Expression>),

    /// Nested map key or list index access on a JSON-like value
    FieldAccess {
        base: Box<Expression>,
        accessor: Box<Expression>,
    },
}

impl Expression {
    /// Create a string literal expression
    pub fn string(val: impl Into<String>) -> Self {
        Expression::String(val.into())
    }

    /// Create a name literal expression
    pub fn name(val: impl Into<String>) -> Self {
        Expression::Name(val.into())
    }

    /// Reference the row key
    pub fn key() -> Self {
        Expression::Field(FieldKeyword::Key)
    }

    /// Reference the row value
    pub fn value() -> Self {
        Expression::Field(FieldKeyword::Value)
    }

    pub fn number(val: i64) -> Self {
        Expression::Number(val)
    }

    pub fn float(val: f64) -> Self {
        Expression::Float(val)
    }

    pub fn boolean(val: bool) -> Self {
        Expression::Bool(val)
    }

    pub fn list(items: Vec<Expression>) -> Self {
        Expression::List(items)
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create an AND expression
    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    /// Create an OR expression
    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    /// Create a NOT expression
    pub fn not_expr(operand: Expression) -> Self {
        Expression::Not(Box::new(operand))
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ne, left, right)
    }

    /// Create a prefix match expression (`left ^= right`)
    pub fn prefix_match(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::PrefixMatch, left, right)
    }

    /// Create a regex match expression (`left ~= pattern`)
    pub fn regex_match(left: Expression, pattern: Expression) -> Self {
        Self::binary_op(BinaryOperator::RegexMatch, left, pattern)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    pub fn sub_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Sub, left, right)
    }

    pub fn mul_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mul, left, right)
    }

    pub fn div_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Div, left, right)
    }

    /// Create a membership test against a list literal
    pub fn in_list(left: Expression, items: Vec<Expression>) -> Self {
        Self::binary_op(BinaryOperator::In, left, Expression::List(items))
    }

    /// Create an inclusive range test
    pub fn between(left: Expression, low: Expression, high: Expression) -> Self {
        Self::binary_op(BinaryOperator::Between, left, Expression::List(vec![low, high]))
    }

    /// Create a function call expression
    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall(FunctionCall {
            name: name.into(),
            args,
            result: None,
        })
    }

    /// Access a named key of a map value
    pub fn get(base: Expression, field: impl Into<String>) -> Self {
        Expression::FieldAccess {
            base: Box::new(base),
            accessor: Box::new(Expression::String(field.into())),
        }
    }

    /// Access a position of a list value
    pub fn index(base: Expression, idx: i64) -> Self {
        Expression::FieldAccess {
            base: Box::new(base),
            accessor: Box::new(Expression::Number(idx)),
        }
    }

    /// Declared return type, resolving calls against the builtin registry
    pub fn return_type(&self) -> DataType {
        self.return_type_in(&FunctionRegistry::builtin())
    }

    /// Declared return type, resolving calls against `registry`
    pub fn return_type_in(&self, registry: &FunctionRegistry) -> DataType {
        match self {
            Expression::String(_)
            | Expression::Field(_)
            | Expression::Name(_)
            | Expression::FieldAccess { .. } => DataType::String,
            Expression::Number(_) | Expression::Float(_) => DataType::Number,
            Expression::Bool(_) | Expression::Not(_) => DataType::Boolean,
            Expression::BinaryOp { op, left, .. } => {
                op.output_type(left.return_type_in(registry))
            }
            Expression::FunctionCall(call) => registry
                .get(&call.name)
                .map(|f| f.return_type)
                .unwrap_or(DataType::String),
            Expression::List(items) => items
                .first()
                .map(|item| item.return_type_in(registry))
                .unwrap_or(DataType::String),
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::BinaryOp { .. } => write!(f, "({})", self),
            _ => write!(f, "{}", self),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::String(s) => write!(f, "'{}'", s),
            Expression::Field(kw) => f.write_str(kw.as_str()),
            Expression::BinaryOp { op, left, right } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op.as_str())?;
                right.fmt_operand(f)
            }
            Expression::Not(operand) => {
                f.write_str("!")?;
                operand.fmt_operand(f)
            }
            Expression::FunctionCall(call) => {
                write!(f, "{}(", call.name)?;
                write_list(f, &call.args)?;
                f.write_str(")")
            }
            Expression::Name(name) => f.write_str(name),
            Expression::Number(n) => write!(f, "{}", n),
            Expression::Float(v) => write!(f, "{}", v),
            Expression::Bool(b) => write!(f, "{}", b),
            Expression::List(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Expression::FieldAccess { base, accessor } => {
                base.fmt_operand(f)?;
                write!(f, "[{}]", accessor)
            }
        }
    }
}
