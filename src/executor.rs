//! Executor layer for query execution.
//!
//! This module implements the pull-based iterator model for executing query
//! plans. A plan tree is built once, `init()`-ed once, then polled with
//! `next()` until it yields `Ok(None)`, the end-of-stream sentinel.
//!
//! Two stream shapes exist:
//! - [`Plan`] yields raw key/value rows (scans, point lookups, limit, order)
//! - [`FinalPlan`] yields named column tuples (projection and the limit /
//!   order stages stacked on top of it)
//!
//! Once a plan returns `Ok(None)` every further call returns `Ok(None)`.
//! A plan tree is not meant to be polled from several threads at once.

use crate::access::{Column, DataType, KvPair};
use crate::expression::Expression;
use anyhow::Result;
use std::fmt;

pub mod empty;
pub mod filter;
pub mod final_limit;
pub mod final_sort;
pub mod full_scan;
mod heap;
pub mod limit;
pub mod multi_get;
pub mod prefix_scan;
pub mod projection;
pub mod range_scan;
pub mod sort;

// Re-export plans
pub use empty::EmptyResultPlan;
pub use filter::FilterExec;
pub use final_limit::FinalLimitPlan;
pub use final_sort::FinalOrderPlan;
pub use full_scan::FullScanPlan;
pub use limit::LimitPlan;
pub use multi_get::MultiGetPlan;
pub use prefix_scan::PrefixScanPlan;
pub use projection::ProjectionPlan;
pub use range_scan::RangeScanPlan;
pub use sort::OrderPlan;

pub(crate) const NOT_INITIALIZED: &str = "Plan not initialized. Call init() first.";

/// Pull iterator over key/value rows
pub trait Plan: fmt::Display {
    /// Prepare the plan: open cursors, seek, init children.
    /// Calling it again is a no-op.
    fn init(&mut self) -> Result<()>;

    /// Get the next row. Returns None when the stream is exhausted.
    fn next(&mut self) -> Result<Option<KvPair>>;

    /// One line per operator, this plan first, then its children
    fn explain(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

/// Pull iterator over projected column tuples
pub trait FinalPlan: fmt::Display {
    fn init(&mut self) -> Result<()>;

    /// Get the next tuple. Returns None when the stream is exhausted.
    fn next(&mut self) -> Result<Option<Vec<Column>>>;

    fn explain(&self) -> Vec<String> {
        vec![self.to_string()]
    }

    /// Output column names, positionally aligned with every tuple
    fn field_names(&self) -> &[String];
}

/// Sort order for an ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// An ordering key.
///
/// Row ordering evaluates `expr` against each row. Column ordering looks up
/// the output column called `name` and compares it according to the
/// declared return type of `expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderField {
    pub name: String,
    pub expr: Expression,
    pub order: SortOrder,
}

impl OrderField {
    /// Order by an expression, named after its display form
    pub fn new(expr: Expression, order: SortOrder) -> Self {
        Self {
            name: expr.to_string(),
            expr,
            order,
        }
    }

    /// Order by an expression exposed as output column `name`
    pub fn named(name: impl Into<String>, expr: Expression, order: SortOrder) -> Self {
        Self {
            name: name.into(),
            expr,
            order,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.expr.return_type()
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.order.as_str())
    }
}

pub(crate) fn join_fields(orders: &[OrderField]) -> String {
    orders
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod testing {
    //! Mock plans shared by the executor tests.

    use super::*;
    use anyhow::bail;
    use bytes::Bytes;

    /// Mock plan that produces a fixed set of rows
    pub struct MockPlan {
        rows: Vec<KvPair>,
        current: usize,
        initialized: bool,
        /// Number of `next()` calls observed
        pub pulls: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl MockPlan {
        pub fn new(rows: Vec<KvPair>) -> Self {
            Self {
                rows,
                current: 0,
                initialized: false,
                pulls: Default::default(),
            }
        }

        /// Rows keyed `k1..kn` with values `v1..vn`
        pub fn numbered(n: usize) -> Self {
            Self::new(
                (1..=n)
                    .map(|i| KvPair::new(format!("k{}", i), format!("v{}", i)))
                    .collect(),
            )
        }
    }

    impl fmt::Display for MockPlan {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "MockPlan{{Rows = {}}}", self.rows.len())
        }
    }

    impl Plan for MockPlan {
        fn init(&mut self) -> Result<()> {
            self.initialized = true;
            Ok(())
        }

        fn next(&mut self) -> Result<Option<KvPair>> {
            if !self.initialized {
                bail!("Not initialized");
            }
            self.pulls.set(self.pulls.get() + 1);
            if self.current >= self.rows.len() {
                return Ok(None);
            }
            let row = self.rows[self.current].clone();
            self.current += 1;
            Ok(Some(row))
        }
    }

    /// Mock final plan that produces fixed column tuples
    pub struct MockFinalPlan {
        names: Vec<String>,
        tuples: Vec<Vec<Column>>,
        current: usize,
        initialized: bool,
    }

    impl MockFinalPlan {
        pub fn new(names: &[&str], tuples: Vec<Vec<&str>>) -> Self {
            Self {
                names: names.iter().map(|n| n.to_string()).collect(),
                tuples: tuples
                    .into_iter()
                    .map(|t| {
                        t.into_iter()
                            .map(|c| Bytes::copy_from_slice(c.as_bytes()))
                            .collect()
                    })
                    .collect(),
                current: 0,
                initialized: false,
            }
        }
    }

    impl fmt::Display for MockFinalPlan {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "MockFinalPlan{{Tuples = {}}}", self.tuples.len())
        }
    }

    impl FinalPlan for MockFinalPlan {
        fn init(&mut self) -> Result<()> {
            self.initialized = true;
            Ok(())
        }

        fn next(&mut self) -> Result<Option<Vec<Column>>> {
            if !self.initialized {
                bail!("Not initialized");
            }
            if self.current >= self.tuples.len() {
                return Ok(None);
            }
            let tuple = self.tuples[self.current].clone();
            self.current += 1;
            Ok(Some(tuple))
        }

        fn field_names(&self) -> &[String] {
            &self.names
        }
    }

    /// Drain a plan, returning row keys as strings
    pub fn collect_keys(plan: &mut dyn Plan) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        while let Some(row) = plan.next()? {
            keys.push(String::from_utf8_lossy(&row.key).into_owned());
        }
        Ok(keys)
    }

    /// Drain a final plan, returning tuples as strings
    pub fn collect_tuples(plan: &mut dyn FinalPlan) -> Result<Vec<Vec<String>>> {
        let mut out = Vec::new();
        while let Some(tuple) = plan.next()? {
            out.push(
                tuple
                    .iter()
                    .map(|c| String::from_utf8_lossy(c).into_owned())
                    .collect(),
            );
        }
        Ok(out)
    }
}
