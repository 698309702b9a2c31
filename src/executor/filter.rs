//! Row predicate shared by the scan plans.
//!
//! A `FilterExec` holds a boolean expression and the function registry it is
//! evaluated against. It has a row-at-a-time path and a batch path; both
//! accept and reject exactly the same rows.

use crate::access::{KvPair, Value};
use crate::expression::{
    BatchEvaluator, Expression, ExpressionError, ExpressionEvaluator, ExpressionResult,
    FunctionRegistry,
};
use std::sync::Arc;

/// Predicate evaluated against key/value rows
#[derive(Debug, Clone)]
pub struct FilterExec {
    /// Boolean expression
    expr: Expression,
    /// Functions available to `expr`
    registry: Arc<FunctionRegistry>,
}

impl FilterExec {
    /// Create a filter using the builtin function registry
    pub fn new(expr: Expression) -> Self {
        Self::with_registry(expr, FunctionRegistry::builtin())
    }

    /// Create a filter using a custom function registry
    pub fn with_registry(expr: Expression, registry: Arc<FunctionRegistry>) -> Self {
        Self { expr, registry }
    }

    /// Filter that accepts every row
    pub fn always() -> Self {
        Self::new(Expression::boolean(true))
    }

    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    /// Text form of the predicate, as shown in plan explanations
    pub fn explain(&self) -> String {
        self.expr.to_string()
    }

    /// Decide a single row
    pub fn filter(&self, row: &KvPair) -> ExpressionResult<bool> {
        let value = ExpressionEvaluator::new(row, &self.registry).evaluate(&self.expr)?;
        expect_bool(value)
    }

    /// Decide a chunk of rows, results aligned with the input
    pub fn filter_batch(&self, rows: &[KvPair]) -> ExpressionResult<Vec<bool>> {
        BatchEvaluator::new(rows, &self.registry)
            .evaluate(&self.expr)?
            .into_iter()
            .map(expect_bool)
            .collect()
    }
}

fn expect_bool(value: Value) -> ExpressionResult<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        _ => Err(ExpressionError::NotBoolean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DataType;
    use crate::expression::Function;

    fn rows() -> Vec<KvPair> {
        vec![
            KvPair::new("a", "1"),
            KvPair::new("ab", ""),
            KvPair::new("b", "hello"),
        ]
    }

    #[test]
    fn test_filter_row() -> anyhow::Result<()> {
        let filter = FilterExec::new(Expression::prefix_match(
            Expression::key(),
            Expression::string("a"),
        ));
        let decisions: Vec<bool> = rows()
            .iter()
            .map(|row| filter.filter(row))
            .collect::<ExpressionResult<_>>()?;
        assert_eq!(decisions, vec![true, true, false]);
        Ok(())
    }

    #[test]
    fn test_filter_batch_matches_row_path() -> anyhow::Result<()> {
        let filter = FilterExec::new(Expression::and(
            Expression::ne(Expression::value(), Expression::string("")),
            Expression::lt(
                Expression::call("strlen", vec![Expression::value()]),
                Expression::number(3),
            ),
        ));
        let rows = rows();
        let by_row: Vec<bool> = rows
            .iter()
            .map(|row| filter.filter(row))
            .collect::<ExpressionResult<_>>()?;
        assert_eq!(filter.filter_batch(&rows)?, by_row);
        assert_eq!(by_row, vec![true, false, false]);
        Ok(())
    }

    #[test]
    fn test_non_boolean_predicate() {
        let filter = FilterExec::new(Expression::key());
        let row = KvPair::new("a", "1");
        assert_eq!(filter.filter(&row), Err(ExpressionError::NotBoolean));
        assert_eq!(
            filter.filter_batch(std::slice::from_ref(&row)),
            Err(ExpressionError::NotBoolean)
        );
    }

    #[test]
    fn test_always() -> anyhow::Result<()> {
        let filter = FilterExec::always();
        assert_eq!(filter.explain(), "true");
        assert_eq!(filter.filter_batch(&rows())?, vec![true, true, true]);
        Ok(())
    }

    #[test]
    fn test_custom_registry() -> anyhow::Result<()> {
        fn is_short(
            eval: &ExpressionEvaluator<'_>,
            _args: &[Expression],
        ) -> ExpressionResult<Value> {
            Ok(Value::Bool(eval.row().key.len() < 2))
        }

        let registry = Arc::new(FunctionRegistry::new().register(Function::new(
            "short",
            0,
            DataType::Boolean,
            is_short,
        )));
        let filter = FilterExec::with_registry(Expression::call("short", vec![]), registry);
        assert_eq!(filter.filter_batch(&rows())?, vec![true, false, true]);
        assert_eq!(filter.explain(), "short()");
        Ok(())
    }
}
