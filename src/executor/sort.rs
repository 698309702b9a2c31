//! Order plan implementation.
//!
//! Drains the child on the first `next()`, evaluating every ordering key per
//! row, and then yields rows from a heap. Rows with equal keys come out in
//! the order the child produced them.
//!
//! Keys are compared by the runtime type of the left-hand value:
//! - int: numeric, the other side coerced to int (0 when it is not one)
//! - float: numeric, the other side widened to float (0.0 when not numeric)
//! - bytes: byte-wise, the other side treated as empty when it is not bytes
//! - bool: `false < true`
//!
//! A list or map key makes the two rows compare equal.

use crate::access::{KvPair, Value};
use crate::executor::heap::{Comparator, SortHeap};
use crate::executor::{join_fields, OrderField, Plan, SortOrder, NOT_INITIALIZED};
use crate::expression::{ExpressionEvaluator, FunctionRegistry};
use anyhow::{bail, Result};
use log::debug;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type SortRow = (Vec<Value>, KvPair);

/// Plan that sorts rows by one or more ordering keys
pub struct OrderPlan<'a> {
    /// Child plan that produces rows
    child: Box<dyn Plan + 'a>,
    /// Ordering keys, in order of precedence
    orders: Vec<OrderField>,
    registry: Arc<FunctionRegistry>,
    /// Materialized rows, filled on the first next()
    heap: Option<SortHeap<SortRow>>,
    initialized: bool,
}

impl<'a> OrderPlan<'a> {
    pub fn new(child: Box<dyn Plan + 'a>, orders: Vec<OrderField>) -> Self {
        Self::with_registry(child, orders, FunctionRegistry::builtin())
    }

    pub fn with_registry(
        child: Box<dyn Plan + 'a>,
        orders: Vec<OrderField>,
        registry: Arc<FunctionRegistry>,
    ) -> Self {
        Self {
            child,
            orders,
            registry,
            heap: None,
            initialized: false,
        }
    }

    /// Pull every row from the child and load the heap
    fn materialize(&mut self) -> Result<SortHeap<SortRow>> {
        let directions: Vec<SortOrder> = self.orders.iter().map(|o| o.order).collect();
        let compare: Comparator<SortRow> =
            Arc::new(move |a: &SortRow, b: &SortRow| compare_keys(&a.0, &b.0, &directions));
        let mut heap = SortHeap::new(compare);

        while let Some(row) = self.child.next()? {
            let evaluator = ExpressionEvaluator::new(&row, &self.registry);
            let keys = self
                .orders
                .iter()
                .map(|o| evaluator.evaluate(&o.expr))
                .collect::<Result<Vec<_>, _>>()?;
            heap.push((keys, row));
        }

        debug!("OrderPlan materialized {} rows", heap.len());
        Ok(heap)
    }
}

impl Plan for OrderPlan<'_> {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.child.init()?;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<KvPair>> {
        if !self.initialized {
            bail!(NOT_INITIALIZED);
        }
        if self.heap.is_none() {
            let heap = self.materialize()?;
            self.heap = Some(heap);
        }
        Ok(self
            .heap
            .as_mut()
            .and_then(|heap| heap.pop())
            .map(|(_, row)| row))
    }

    fn explain(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        lines.extend(self.child.explain());
        lines
    }
}

impl fmt::Display for OrderPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderPlan{{Fields = <{}>}}", join_fields(&self.orders))
    }
}

/// Compare two rows' evaluated keys, first non-equal key wins
fn compare_keys(left: &[Value], right: &[Value], directions: &[SortOrder]) -> Ordering {
    for ((l, r), direction) in left.iter().zip(right).zip(directions) {
        let Some(ord) = compare_values(l, r) else {
            return Ordering::Equal;
        };
        let ord = match direction {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// None when the left value has no ordering
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    let ord = match left {
        Value::Int(l) => l.cmp(&right.as_int().unwrap_or(0)),
        Value::Float(l) => l.total_cmp(&right.as_float().unwrap_or(0.0)),
        Value::Bytes(l) => l.as_ref().cmp(right.as_bytes().unwrap_or(&[])),
        Value::Bool(l) => l.cmp(&right.as_bool().unwrap_or(false)),
        Value::List(_) | Value::Map(_) => return None,
    };
    Some(ord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::{collect_keys, MockPlan};
    use crate::expression::{Expression, ExpressionError};

    fn rows(pairs: &[(&str, &str)]) -> Vec<KvPair> {
        pairs
            .iter()
            .map(|(k, v)| KvPair::new(k.to_string(), v.to_string()))
            .collect()
    }

    fn sorted_keys(input: Vec<KvPair>, orders: Vec<OrderField>) -> Result<Vec<String>> {
        let mut plan = OrderPlan::new(Box::new(MockPlan::new(input)), orders);
        plan.init()?;
        collect_keys(&mut plan)
    }

    #[test]
    fn test_sort_by_key() -> Result<()> {
        let input = rows(&[("c", ""), ("a", ""), ("b", "")]);
        assert_eq!(
            sorted_keys(input.clone(), vec![OrderField::new(Expression::key(), SortOrder::Asc)])?,
            vec!["a", "b", "c"]
        );
        assert_eq!(
            sorted_keys(input, vec![OrderField::new(Expression::key(), SortOrder::Desc)])?,
            vec!["c", "b", "a"]
        );
        Ok(())
    }

    #[test]
    fn test_sort_numeric_key() -> Result<()> {
        let input = rows(&[("a", "100"), ("b", "9"), ("c", "25")]);
        let strlen = Expression::call("strlen", vec![Expression::value()]);
        assert_eq!(
            sorted_keys(input, vec![OrderField::new(strlen, SortOrder::Asc)])?,
            vec!["b", "c", "a"]
        );
        Ok(())
    }

    #[test]
    fn test_multi_key_sort() -> Result<()> {
        let input = rows(&[("a", "x"), ("b", "y"), ("c", "x"), ("d", "y")]);
        let orders = vec![
            OrderField::new(Expression::value(), SortOrder::Asc),
            OrderField::new(Expression::key(), SortOrder::Desc),
        ];
        assert_eq!(sorted_keys(input, orders)?, vec!["c", "a", "d", "b"]);
        Ok(())
    }

    #[test]
    fn test_equal_keys_keep_child_order() -> Result<()> {
        let input = rows(&[("k3", "same"), ("k1", "same"), ("k2", "same")]);
        assert_eq!(
            sorted_keys(input, vec![OrderField::new(Expression::value(), SortOrder::Desc)])?,
            vec!["k3", "k1", "k2"]
        );
        Ok(())
    }

    #[test]
    fn test_json_field_sort() -> Result<()> {
        let input = rows(&[
            ("a", r#"{"age": 40}"#),
            ("b", r#"{"age": 3}"#),
            ("c", r#"{"age": 17}"#),
        ]);
        let age = Expression::get(Expression::call("json", vec![Expression::value()]), "age");
        assert_eq!(
            sorted_keys(input, vec![OrderField::new(age, SortOrder::Asc)])?,
            vec!["b", "c", "a"]
        );
        Ok(())
    }

    #[test]
    fn test_unorderable_values_compare_equal() -> Result<()> {
        let input = rows(&[("b", r#"[2]"#), ("a", r#"[1]"#)]);
        let doc = Expression::call("json", vec![Expression::value()]);
        assert_eq!(
            sorted_keys(input, vec![OrderField::new(doc, SortOrder::Asc)])?,
            vec!["b", "a"]
        );
        Ok(())
    }

    #[test]
    fn test_evaluation_error_propagates() -> Result<()> {
        let input = rows(&[("a", "not json")]);
        let doc = Expression::call("json", vec![Expression::value()]);
        let mut plan = OrderPlan::new(
            Box::new(MockPlan::new(input)),
            vec![OrderField::new(doc, SortOrder::Asc)],
        );
        plan.init()?;
        let err = plan.next().unwrap_err();
        assert!(err.downcast_ref::<ExpressionError>().is_some());
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        assert!(sorted_keys(vec![], vec![OrderField::new(Expression::key(), SortOrder::Asc)])?
            .is_empty());
        Ok(())
    }

    #[test]
    fn test_materializes_once() -> Result<()> {
        let child = MockPlan::numbered(3);
        let pulls = child.pulls.clone();
        let mut plan = OrderPlan::new(
            Box::new(child),
            vec![OrderField::new(Expression::key(), SortOrder::Desc)],
        );
        plan.init()?;
        assert_eq!(collect_keys(&mut plan)?, vec!["k3", "k2", "k1"]);
        assert!(plan.next()?.is_none());
        assert_eq!(pulls.get(), 4);
        Ok(())
    }

    #[test]
    fn test_compare_values_mixed_types() {
        assert_eq!(
            compare_values(&Value::Int(1), &Value::string("x")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&Value::Float(1.5), &Value::Int(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::Bool(false), &Value::Bool(true)),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&Value::List(vec![]), &Value::Int(1)), None);
    }

    #[test]
    fn test_order_explain() {
        let plan = OrderPlan::new(
            Box::new(MockPlan::numbered(1)),
            vec![
                OrderField::new(Expression::key(), SortOrder::Asc),
                OrderField::new(Expression::value(), SortOrder::Desc),
            ],
        );
        assert_eq!(
            plan.explain(),
            vec!["OrderPlan{Fields = <key ASC, value DESC>}", "MockPlan{Rows = 1}"]
        );
    }
}
