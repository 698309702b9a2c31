//! Batch expression evaluation.
//!
//! Evaluates one expression over a chunk of rows, one node at a time. Logical
//! operators narrow the selection before evaluating their right operand so a
//! row only sees the sub-expressions the row-at-a-time path would evaluate.
//! Nodes that need per-row control flow (`in`, `between`, function calls)
//! fall back to the row evaluator.

use crate::access::{KvPair, Value};
use crate::expression::eval::{access_field, apply_binary, logical_operand, negate};
use crate::expression::{
    BinaryOperator, Expression, ExpressionEvaluator, ExpressionResult, FieldKeyword,
    FunctionRegistry,
};

pub struct BatchEvaluator<'a> {
    rows: &'a [KvPair],
    registry: &'a FunctionRegistry,
}

impl<'a> BatchEvaluator<'a> {
    pub fn new(rows: &'a [KvPair], registry: &'a FunctionRegistry) -> Self {
        Self { rows, registry }
    }

    /// Evaluate `expr` for every row, results aligned with the input
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Vec<Value>> {
        let selection: Vec<usize> = (0..self.rows.len()).collect();
        self.evaluate_selected(expr, &selection)
    }

    /// Evaluate `expr` for the rows at `selection`, results aligned with it
    fn evaluate_selected(
        &self,
        expr: &Expression,
        selection: &[usize],
    ) -> ExpressionResult<Vec<Value>> {
        match expr {
            Expression::String(s) => Ok(vec![Value::string(s.as_str()); selection.len()]),
            Expression::Name(name) => Ok(vec![Value::string(name.as_str()); selection.len()]),
            Expression::Number(n) => Ok(vec![Value::Int(*n); selection.len()]),
            Expression::Float(v) => Ok(vec![Value::Float(*v); selection.len()]),
            Expression::Bool(b) => Ok(vec![Value::Bool(*b); selection.len()]),

            Expression::Field(FieldKeyword::Key) => Ok(selection
                .iter()
                .map(|&i| Value::Bytes(self.rows[i].key.clone()))
                .collect()),
            Expression::Field(FieldKeyword::Value) => Ok(selection
                .iter()
                .map(|&i| Value::Bytes(self.rows[i].value.clone()))
                .collect()),

            Expression::Not(operand) => self
                .evaluate_selected(operand, selection)?
                .into_iter()
                .map(negate)
                .collect(),

            Expression::BinaryOp {
                op: op @ (BinaryOperator::And | BinaryOperator::Or),
                left,
                right,
            } => self.evaluate_logical(*op, left, right, selection),

            Expression::BinaryOp { op, left, right } if !op.takes_list() => {
                let left_type = left.return_type_in(self.registry);
                let left_vals = self.evaluate_selected(left, selection)?;
                let right_vals = self.evaluate_selected(right, selection)?;
                left_vals
                    .into_iter()
                    .zip(right_vals)
                    .map(|(l, r)| apply_binary(*op, left_type, l, r))
                    .collect()
            }

            Expression::FieldAccess { base, accessor } => self
                .evaluate_selected(base, selection)?
                .into_iter()
                .map(|value| access_field(value, accessor))
                .collect(),

            _ => selection
                .iter()
                .map(|&i| ExpressionEvaluator::new(&self.rows[i], self.registry).evaluate(expr))
                .collect(),
        }
    }

    fn evaluate_logical(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        selection: &[usize],
    ) -> ExpressionResult<Vec<Value>> {
        // AND is decided by a false left side, OR by a true one
        let decisive = op == BinaryOperator::Or;

        let mut out = Vec::with_capacity(selection.len());
        let mut pending = Vec::new();
        for (pos, value) in self
            .evaluate_selected(left, selection)?
            .into_iter()
            .enumerate()
        {
            let b = logical_operand(op, "left", value)?;
            if b != decisive {
                pending.push(pos);
            }
            out.push(Value::Bool(b));
        }

        if pending.is_empty() {
            return Ok(out);
        }

        let narrowed: Vec<usize> = pending.iter().map(|&pos| selection[pos]).collect();
        let right_vals = self.evaluate_selected(right, &narrowed)?;
        for (pos, value) in pending.into_iter().zip(right_vals) {
            out[pos] = Value::Bool(logical_operand(op, "right", value)?);
        }
        Ok(out)
    }
}

/// Helper function to evaluate an expression over rows with the builtin
/// function registry
pub fn evaluate_batch(expr: &Expression, rows: &[KvPair]) -> ExpressionResult<Vec<Value>> {
    let registry = FunctionRegistry::builtin();
    BatchEvaluator::new(rows, &registry).evaluate(expr)
}
