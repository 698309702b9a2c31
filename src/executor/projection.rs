//! Projection plan implementation.
//!
//! Turns key/value rows into named column tuples by evaluating one
//! expression per output column. Non-bytes results are rendered as text
//! (JSON for lists and maps).

use crate::access::{Column, Value};
use crate::executor::{FinalPlan, Plan, NOT_INITIALIZED};
use crate::expression::{Expression, ExpressionEvaluator, FunctionRegistry};
use anyhow::{bail, Result};
use std::fmt;
use std::sync::Arc;

/// Plan that projects rows into column tuples
pub struct ProjectionPlan<'a> {
    /// Child plan that produces rows
    child: Box<dyn Plan + 'a>,
    /// Expression for each output column
    exprs: Vec<Expression>,
    /// Output column names, aligned with `exprs`
    field_names: Vec<String>,
    registry: Arc<FunctionRegistry>,
    exhausted: bool,
    initialized: bool,
}

impl<'a> ProjectionPlan<'a> {
    /// Create a new projection plan
    ///
    /// # Arguments
    /// * `child` - The child plan that produces rows
    /// * `fields` - Output column name and expression pairs, in output order
    pub fn new(child: Box<dyn Plan + 'a>, fields: Vec<(String, Expression)>) -> Self {
        let (field_names, exprs) = fields.into_iter().unzip();
        Self {
            child,
            exprs,
            field_names,
            registry: FunctionRegistry::builtin(),
            exhausted: false,
            initialized: false,
        }
    }

    /// Project `key` and `value` as-is
    pub fn key_value(child: Box<dyn Plan + 'a>) -> Self {
        Self::new(
            child,
            vec![
                ("key".to_string(), Expression::key()),
                ("value".to_string(), Expression::value()),
            ],
        )
    }
}

impl FinalPlan for ProjectionPlan<'_> {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.child.init()?;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Vec<Column>>> {
        if !self.initialized {
            bail!(NOT_INITIALIZED);
        }
        if self.exhausted {
            return Ok(None);
        }
        let Some(row) = self.child.next()? else {
            self.exhausted = true;
            return Ok(None);
        };

        let evaluator = ExpressionEvaluator::new(&row, &self.registry);
        let tuple = self
            .exprs
            .iter()
            .map(|expr| evaluator.evaluate(expr).map(|v: Value| v.to_column()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(tuple))
    }

    fn explain(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        lines.extend(self.child.explain());
        lines
    }

    fn field_names(&self) -> &[String] {
        &self.field_names
    }
}

impl fmt::Display for ProjectionPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectionPlan{{Fields = <{}>}}", self.field_names.join(", "))
    }
}
