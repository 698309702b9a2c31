//! Full scan plan.
//!
//! Walks the whole keyspace in key order and yields the rows accepted by the
//! filter.

use crate::access::KvPair;
use crate::executor::{FilterExec, Plan, NOT_INITIALIZED};
use crate::storage::{Cursor, Txn};
use anyhow::{anyhow, Result};
use log::debug;
use std::fmt;

pub struct FullScanPlan<'a> {
    txn: &'a dyn Txn,
    filter: FilterExec,
    /// Open cursor, set by init()
    cursor: Option<Box<dyn Cursor + 'a>>,
    /// Set once the cursor has run dry
    exhausted: bool,
}

impl<'a> FullScanPlan<'a> {
    pub fn new(txn: &'a dyn Txn, filter: FilterExec) -> Self {
        Self {
            txn,
            filter,
            cursor: None,
            exhausted: false,
        }
    }
}

impl Plan for FullScanPlan<'_> {
    fn init(&mut self) -> Result<()> {
        if self.cursor.is_some() {
            return Ok(());
        }
        let mut cursor = self.txn.cursor()?;
        cursor.seek(&[])?;
        self.cursor = Some(cursor);
        debug!("{} initialized", self);
        Ok(())
    }

    fn next(&mut self) -> Result<Option<KvPair>> {
        let cursor = self.cursor.as_mut().ok_or_else(|| anyhow!(NOT_INITIALIZED))?;
        if self.exhausted {
            return Ok(None);
        }

        while let Some(row) = cursor.next()? {
            if self.filter.filter(&row)? {
                return Ok(Some(row));
            }
        }

        self.exhausted = true;
        debug!("FullScanPlan exhausted");
        Ok(None)
    }
}

impl fmt::Display for FullScanPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FullScanPlan{{Filter = '{}'}}", self.filter.explain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::collect_keys;
    use crate::expression::Expression;
    use crate::storage::MemoryStore;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.put("b", "2");
        store.put("a", "1");
        store.put("c", "");
        store
    }

    #[test]
    fn test_full_scan_in_key_order() -> Result<()> {
        let store = store();
        let txn = store.begin();
        let mut plan = FullScanPlan::new(&txn, FilterExec::always());
        plan.init()?;
        assert_eq!(collect_keys(&mut plan)?, vec!["a", "b", "c"]);

        // Sentinel is sticky
        assert!(plan.next()?.is_none());
        assert!(plan.next()?.is_none());
        Ok(())
    }

    #[test]
    fn test_full_scan_with_filter() -> Result<()> {
        let store = store();
        let txn = store.begin();
        let filter = FilterExec::new(Expression::ne(Expression::value(), Expression::string("")));
        let mut plan = FullScanPlan::new(&txn, filter);
        plan.init()?;
        assert_eq!(collect_keys(&mut plan)?, vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_full_scan_requires_init() {
        let store = store();
        let txn = store.begin();
        let mut plan = FullScanPlan::new(&txn, FilterExec::always());
        let err = plan.next().unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[test]
    fn test_full_scan_explain() {
        let store = MemoryStore::new();
        let txn = store.begin();
        let filter = FilterExec::new(Expression::prefix_match(
            Expression::key(),
            Expression::string("user:"),
        ));
        let plan = FullScanPlan::new(&txn, filter);
        assert_eq!(
            plan.explain(),
            vec!["FullScanPlan{Filter = 'key ^= 'user:''}"]
        );
    }

    #[test]
    fn test_filter_error_propagates() -> Result<()> {
        let store = store();
        let txn = store.begin();
        let mut plan = FullScanPlan::new(&txn, FilterExec::new(Expression::key()));
        plan.init()?;
        let err = plan.next().unwrap_err();
        assert!(err
            .downcast_ref::<crate::expression::ExpressionError>()
            .is_some());
        Ok(())
    }
}
