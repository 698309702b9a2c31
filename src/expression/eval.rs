//! Expression evaluation implementation.
//!
//! Operators dispatch on the *declared* type of their left operand, never on
//! runtime reflection. The one dynamic path is field access, which navigates
//! whatever map or list the base expression produced.

use crate::access::{DataType, KvPair, Value};
use crate::expression::{
    BinaryOperator, Expression, ExpressionError, ExpressionResult, FieldKeyword, FunctionCall,
    FunctionRegistry,
};
use std::cmp::Ordering;

/// Evaluator for expressions against a single row
pub struct ExpressionEvaluator<'a> {
    row: &'a KvPair,
    registry: &'a FunctionRegistry,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(row: &'a KvPair, registry: &'a FunctionRegistry) -> Self {
        Self { row, registry }
    }

    pub fn row(&self) -> &KvPair {
        self.row
    }

    pub fn registry(&self) -> &FunctionRegistry {
        self.registry
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::String(s) => Ok(Value::string(s.as_str())),
            Expression::Name(name) => Ok(Value::string(name.as_str())),
            Expression::Field(FieldKeyword::Key) => Ok(Value::Bytes(self.row.key.clone())),
            Expression::Field(FieldKeyword::Value) => Ok(Value::Bytes(self.row.value.clone())),
            Expression::Number(n) => Ok(Value::Int(*n)),
            Expression::Float(v) => Ok(Value::Float(*v)),
            Expression::Bool(b) => Ok(Value::Bool(*b)),

            Expression::List(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<ExpressionResult<Vec<_>>>()
                .map(Value::List),

            Expression::Not(operand) => negate(self.evaluate(operand)?),

            Expression::BinaryOp { op, left, right } => self.evaluate_binary_op(*op, left, right),

            Expression::FunctionCall(call) => self.evaluate_call(call),

            Expression::FieldAccess { base, accessor } => {
                access_field(self.evaluate(base)?, accessor)
            }
        }
    }

    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> ExpressionResult<Value> {
        match op {
            BinaryOperator::And => {
                if !logical_operand(op, "left", self.evaluate(left)?)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(logical_operand(op, "right", self.evaluate(right)?)?))
            }
            BinaryOperator::Or => {
                if logical_operand(op, "left", self.evaluate(left)?)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(logical_operand(op, "right", self.evaluate(right)?)?))
            }
            BinaryOperator::In => self.evaluate_in(left, right),
            BinaryOperator::Between => self.evaluate_between(left, right),
            _ => {
                let left_type = left.return_type_in(self.registry);
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                apply_binary(op, left_type, left_val, right_val)
            }
        }
    }

    /// `left in [a, b, ...]`; stops at the first equal element
    fn evaluate_in(&self, left: &Expression, right: &Expression) -> ExpressionResult<Value> {
        let left_type = left.return_type_in(self.registry);
        let value = self.evaluate(left)?;
        let items = list_operand(BinaryOperator::In, right)?;
        let expected = element_type(left_type);

        for item in items {
            self.check_element_type(item, expected, "in")?;
            let candidate = self.evaluate(item)?;
            if compare_typed(left_type, &value, &candidate, "in")? == Ordering::Equal {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }

    /// `left between [lower, upper]`, inclusive on both ends
    fn evaluate_between(&self, left: &Expression, right: &Expression) -> ExpressionResult<Value> {
        let left_type = left.return_type_in(self.registry);
        let value = self.evaluate(left)?;
        let bounds = list_operand(BinaryOperator::Between, right)?;
        if bounds.len() != 2 {
            return Err(ExpressionError::BetweenBoundaryCount {
                actual: bounds.len(),
            });
        }

        let expected = element_type(left_type);
        self.check_element_type(&bounds[0], expected, "between lower boundary")?;
        self.check_element_type(&bounds[1], expected, "between upper boundary")?;

        let lower = self.evaluate(&bounds[0])?;
        let upper = self.evaluate(&bounds[1])?;
        if compare_typed(left_type, &lower, &upper, "between")? == Ordering::Greater {
            return Err(ExpressionError::InvertedBounds);
        }

        let above_lower = compare_typed(left_type, &lower, &value, "between")? != Ordering::Greater;
        let below_upper = compare_typed(left_type, &value, &upper, "between")? != Ordering::Greater;
        Ok(Value::Bool(above_lower && below_upper))
    }

    fn check_element_type(
        &self,
        item: &Expression,
        expected: DataType,
        context: &str,
    ) -> ExpressionResult<()> {
        let actual = item.return_type_in(self.registry);
        if actual != expected {
            return Err(ExpressionError::TypeMismatch {
                expected,
                actual,
                context: context.to_string(),
            });
        }
        Ok(())
    }

    fn evaluate_call(&self, call: &FunctionCall) -> ExpressionResult<Value> {
        if let Some(result) = &call.result {
            return Ok(result.clone());
        }

        let function =
            self.registry
                .get(&call.name)
                .ok_or_else(|| ExpressionError::UnknownFunction {
                    name: call.name.clone(),
                })?;

        if !function.var_args && call.args.len() != function.num_args {
            return Err(ExpressionError::FunctionArgumentCount {
                function: function.name.clone(),
                expected: function.num_args,
                actual: call.args.len(),
            });
        }

        let result = (function.body)(self, &call.args)?;

        // Lists and maps have no declared type and may come out of any call.
        if let Some(actual) = result.data_type() {
            if actual != function.return_type {
                return Err(ExpressionError::ReturnTypeMismatch {
                    function: function.name.clone(),
                    expected: function.return_type,
                    actual: result.type_name(),
                });
            }
        }
        Ok(result)
    }
}

/// Helper function to evaluate an expression against a row with the builtin
/// function registry
pub fn evaluate_expression(expr: &Expression, row: &KvPair) -> ExpressionResult<Value> {
    let registry = FunctionRegistry::builtin();
    ExpressionEvaluator::new(row, &registry).evaluate(expr)
}

/// Combine two already evaluated operands.
///
/// `in` and `between` need the unevaluated list literal and are handled by
/// the evaluator itself.
pub(crate) fn apply_binary(
    op: BinaryOperator,
    left_type: DataType,
    left: Value,
    right: Value,
) -> ExpressionResult<Value> {
    match op {
        BinaryOperator::Eq => values_equal(&left, &right).map(Value::Bool),
        BinaryOperator::Ne => values_equal(&left, &right).map(|eq| Value::Bool(!eq)),

        BinaryOperator::PrefixMatch => match (left.as_bytes(), right.as_bytes()) {
            (Some(l), Some(r)) => Ok(Value::Bool(l.starts_with(r))),
            _ => Err(invalid_operands(op, &left, &right)),
        },

        BinaryOperator::RegexMatch => match (left.as_bytes(), right.as_bytes()) {
            (Some(l), Some(r)) => {
                let pattern = String::from_utf8_lossy(r);
                let re = regex::bytes::Regex::new(&pattern).map_err(|e| {
                    ExpressionError::InvalidRegex {
                        message: e.to_string(),
                    }
                })?;
                Ok(Value::Bool(re.is_match(l)))
            }
            _ => Err(invalid_operands(op, &left, &right)),
        },

        BinaryOperator::And => {
            let l = logical_operand(op, "left", left)?;
            let r = logical_operand(op, "right", right)?;
            Ok(Value::Bool(l && r))
        }
        BinaryOperator::Or => {
            let l = logical_operand(op, "left", left)?;
            let r = logical_operand(op, "right", right)?;
            Ok(Value::Bool(l || r))
        }

        BinaryOperator::Add if left_type == DataType::String => {
            Ok(Value::string(format!("{}{}", left, right)))
        }
        BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div => {
            arithmetic(op, &left, &right)
        }

        BinaryOperator::Gt => compare_typed(left_type, &left, &right, op.as_str())
            .map(|cmp| Value::Bool(cmp == Ordering::Greater)),
        BinaryOperator::Ge => compare_typed(left_type, &left, &right, op.as_str())
            .map(|cmp| Value::Bool(cmp != Ordering::Less)),
        BinaryOperator::Lt => compare_typed(left_type, &left, &right, op.as_str())
            .map(|cmp| Value::Bool(cmp == Ordering::Less)),
        BinaryOperator::Le => compare_typed(left_type, &left, &right, op.as_str())
            .map(|cmp| Value::Bool(cmp != Ordering::Greater)),

        BinaryOperator::In | BinaryOperator::Between => Err(ExpressionError::ExpectedList {
            operator: op.as_str().to_string(),
        }),
    }
}

pub(crate) fn negate(operand: Value) -> ExpressionResult<Value> {
    match operand {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(ExpressionError::NotBooleanOperand {
            operator: "!".to_string(),
            side: "right",
            actual: other.type_name(),
        }),
    }
}

pub(crate) fn logical_operand(
    op: BinaryOperator,
    side: &'static str,
    value: Value,
) -> ExpressionResult<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(ExpressionError::NotBooleanOperand {
            operator: op.as_str().to_string(),
            side,
            actual: other.type_name(),
        }),
    }
}

/// Navigate into a map (string accessor) or list (number accessor).
///
/// An empty-bytes base and a missing key or index both yield the
/// empty-bytes sentinel so optional nested fields never fail.
pub(crate) fn access_field(base: Value, accessor: &Expression) -> ExpressionResult<Value> {
    match accessor {
        Expression::String(name) => match base {
            Value::Map(mut map) => Ok(map.remove(name).unwrap_or_else(Value::empty)),
            Value::Bytes(b) if b.is_empty() => Ok(Value::empty()),
            other => Err(ExpressionError::InvalidAccess {
                kind: "field",
                actual: other.type_name(),
            }),
        },
        Expression::Number(idx) => match base {
            Value::List(items) => Ok(usize::try_from(*idx)
                .ok()
                .and_then(|i| items.into_iter().nth(i))
                .unwrap_or_else(Value::empty)),
            Value::Bytes(b) if b.is_empty() => Ok(Value::empty()),
            other => Err(ExpressionError::InvalidAccess {
                kind: "index",
                actual: other.type_name(),
            }),
        },
        other => Err(ExpressionError::InvalidAccessor {
            accessor: other.to_string(),
        }),
    }
}

fn list_operand(op: BinaryOperator, right: &Expression) -> ExpressionResult<&[Expression]> {
    match right {
        Expression::List(items) => Ok(items),
        _ => Err(ExpressionError::ExpectedList {
            operator: op.as_str().to_string(),
        }),
    }
}

/// List elements must be strings for a string left operand, numbers otherwise
fn element_type(left_type: DataType) -> DataType {
    match left_type {
        DataType::String => DataType::String,
        _ => DataType::Number,
    }
}

fn invalid_operands(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::InvalidOperandTypes {
        operator: op.as_str().to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

/// Equality dispatched on the runtime tag of the left value
fn values_equal(left: &Value, right: &Value) -> ExpressionResult<bool> {
    let eq = match left {
        Value::Bytes(l) => right.as_bytes().map(|r| l.as_ref() == r),
        Value::Int(l) => right.as_int().map(|r| *l == r),
        Value::Bool(l) => right.as_bool().map(|r| *l == r),
        _ => None,
    };
    eq.ok_or_else(|| invalid_operands(BinaryOperator::Eq, left, right))
}

/// Byte-wise comparison for string-typed operands, numeric otherwise
fn compare_typed(
    left_type: DataType,
    left: &Value,
    right: &Value,
    operator: &str,
) -> ExpressionResult<Ordering> {
    match left_type {
        DataType::String => compare_strings(left, right, operator),
        _ => compare_numbers(left, right, operator),
    }
}

fn compare_strings(left: &Value, right: &Value, operator: &str) -> ExpressionResult<Ordering> {
    match (left.as_bytes(), right.as_bytes()) {
        (Some(l), Some(r)) => Ok(l.cmp(r)),
        _ => Err(ExpressionError::InvalidOperandTypes {
            operator: operator.to_string(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn compare_numbers(left: &Value, right: &Value, operator: &str) -> ExpressionResult<Ordering> {
    if let (Value::Int(l), Value::Int(r)) = (left, right) {
        return Ok(l.cmp(r));
    }
    match (left.as_float(), right.as_float()) {
        (Some(l), Some(r)) => Ok(l.total_cmp(&r)),
        _ => Err(ExpressionError::InvalidOperandTypes {
            operator: operator.to_string(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionResult<Value> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return match op {
            BinaryOperator::Add => Ok(Value::Int(a.wrapping_add(*b))),
            BinaryOperator::Sub => Ok(Value::Int(a.wrapping_sub(*b))),
            BinaryOperator::Mul => Ok(Value::Int(a.wrapping_mul(*b))),
            _ if *b == 0 => Err(ExpressionError::DivisionByZero),
            _ => Ok(Value::Int(a.wrapping_div(*b))),
        };
    }

    let (a, b) = match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(invalid_operands(op, left, right)),
    };
    match op {
        BinaryOperator::Add => Ok(Value::Float(a + b)),
        BinaryOperator::Sub => Ok(Value::Float(a - b)),
        BinaryOperator::Mul => Ok(Value::Float(a * b)),
        _ if b == 0.0 => Err(ExpressionError::DivisionByZero),
        _ => Ok(Value::Float(a / b)),
    }
}
