//! Order plan over projected tuples.
//!
//! Ordering keys name output columns. Each column is compared according to
//! the declared type of its ordering expression:
//! - string: byte-wise
//! - boolean: `"true"` sorts after everything else
//! - number: as integers when both sides parse as one, else as floats when
//!   both parse as one, else equal

use crate::access::{Column, DataType};
use crate::executor::heap::{Comparator, SortHeap};
use crate::executor::{join_fields, FinalPlan, OrderField, SortOrder, NOT_INITIALIZED};
use anyhow::{anyhow, bail, Result};
use log::debug;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Resolved ordering key
#[derive(Debug, Clone, Copy)]
struct ColumnKey {
    position: usize,
    data_type: DataType,
    order: SortOrder,
}

pub struct FinalOrderPlan<'a> {
    child: Box<dyn FinalPlan + 'a>,
    orders: Vec<OrderField>,
    /// Keys resolved against the child's columns by init()
    keys: Vec<ColumnKey>,
    heap: Option<SortHeap<Vec<Column>>>,
    initialized: bool,
}

impl<'a> FinalOrderPlan<'a> {
    pub fn new(child: Box<dyn FinalPlan + 'a>, orders: Vec<OrderField>) -> Self {
        Self {
            child,
            orders,
            keys: Vec::new(),
            heap: None,
            initialized: false,
        }
    }

    fn resolve_keys(&self) -> Result<Vec<ColumnKey>> {
        let names = self.child.field_names();
        self.orders
            .iter()
            .map(|o| -> Result<ColumnKey> {
                let position = names
                    .iter()
                    .position(|n| *n == o.name)
                    .ok_or_else(|| anyhow!("Cannot find field: {}", o.name))?;
                Ok(ColumnKey {
                    position,
                    data_type: o.data_type(),
                    order: o.order,
                })
            })
            .collect()
    }

    fn materialize(&mut self) -> Result<SortHeap<Vec<Column>>> {
        let keys = self.keys.clone();
        let compare: Comparator<Vec<Column>> =
            Arc::new(move |a: &Vec<Column>, b: &Vec<Column>| compare_tuples(a, b, &keys));
        let mut heap = SortHeap::new(compare);
        while let Some(tuple) = self.child.next()? {
            heap.push(tuple);
        }
        debug!("FinalOrderPlan materialized {} tuples", heap.len());
        Ok(heap)
    }
}

impl FinalPlan for FinalOrderPlan<'_> {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.keys = self.resolve_keys()?;
        self.child.init()?;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Vec<Column>>> {
        if !self.initialized {
            bail!(NOT_INITIALIZED);
        }
        if self.heap.is_none() {
            let heap = self.materialize()?;
            self.heap = Some(heap);
        }
        Ok(self.heap.as_mut().and_then(|heap| heap.pop()))
    }

    fn explain(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        lines.extend(self.child.explain());
        lines
    }

    fn field_names(&self) -> &[String] {
        self.child.field_names()
    }
}

impl fmt::Display for FinalOrderPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FinalOrderPlan{{Fields = <{}>}}", join_fields(&self.orders))
    }
}

fn compare_tuples(left: &[Column], right: &[Column], keys: &[ColumnKey]) -> Ordering {
    for key in keys {
        let l = left.get(key.position).map(|c| &c[..]).unwrap_or_default();
        let r = right.get(key.position).map(|c| &c[..]).unwrap_or_default();
        let ord = compare_columns(l, r, key.data_type);
        let ord = match key.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_columns(left: &[u8], right: &[u8], data_type: DataType) -> Ordering {
    match data_type {
        DataType::String => left.cmp(right),
        DataType::Boolean => (left == b"true").cmp(&(right == b"true")),
        DataType::Number => compare_numeric_text(left, right),
    }
}

fn compare_numeric_text(left: &[u8], right: &[u8]) -> Ordering {
    let (Ok(l), Ok(r)) = (std::str::from_utf8(left), std::str::from_utf8(right)) else {
        return Ordering::Equal;
    };
    if let (Ok(a), Ok(b)) = (l.parse::<i64>(), r.parse::<i64>()) {
        return a.cmp(&b);
    }
    if let (Ok(a), Ok(b)) = (l.parse::<f64>(), r.parse::<f64>()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    Ordering::Equal
}
