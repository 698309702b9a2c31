//! Range scan plan.
//!
//! Yields rows with `start <= key <= end`. Either bound may be absent, in
//! which case that side of the range is open.

use crate::access::KvPair;
use crate::executor::{FilterExec, Plan, NOT_INITIALIZED};
use crate::storage::{Cursor, Txn};
use anyhow::{anyhow, Result};
use bytes::Bytes;
use log::debug;
use std::fmt;

pub struct RangeScanPlan<'a> {
    txn: &'a dyn Txn,
    /// Inclusive lower bound
    start: Option<Bytes>,
    /// Inclusive upper bound
    end: Option<Bytes>,
    filter: FilterExec,
    cursor: Option<Box<dyn Cursor + 'a>>,
    exhausted: bool,
}

impl<'a> RangeScanPlan<'a> {
    pub fn new(
        txn: &'a dyn Txn,
        start: Option<Bytes>,
        end: Option<Bytes>,
        filter: FilterExec,
    ) -> Self {
        Self {
            txn,
            start,
            end,
            filter,
            cursor: None,
            exhausted: false,
        }
    }
}

impl Plan for RangeScanPlan<'_> {
    fn init(&mut self) -> Result<()> {
        if self.cursor.is_some() {
            return Ok(());
        }
        let mut cursor = self.txn.cursor()?;
        if let Some(start) = &self.start {
            cursor.seek(start)?;
        }
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
            if matches!(&self.end, Some(end) if row.key > *end) {
                break;
            }
            if self.filter.filter(&row)? {
                return Ok(Some(row));
            }
        }

        self.exhausted = true;
        debug!("RangeScanPlan exhausted");
        Ok(None)
    }
}

fn fmt_bound(bound: &Option<Bytes>) -> String {
    match bound {
        Some(b) => format!("'{}'", String::from_utf8_lossy(b)),
        None => "<nil>".to_string(),
    }
}

impl fmt::Display for RangeScanPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RangeScanPlan{{Start = {}, End = {}, Filter = '{}'}}",
            fmt_bound(&self.start),
            fmt_bound(&self.end),
            self.filter.explain()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::collect_keys;
    use crate::storage::MemoryStore;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        for key in ["a", "b", "c", "d", "e"] {
            store.put(key, key);
        }
        store
    }

    fn scan(start: Option<&str>, end: Option<&str>) -> Result<Vec<String>> {
        let store = store();
        let txn = store.begin();
        let mut plan = RangeScanPlan::new(
            &txn,
            start.map(|s| Bytes::copy_from_slice(s.as_bytes())),
            end.map(|s| Bytes::copy_from_slice(s.as_bytes())),
            FilterExec::always(),
        );
        plan.init()?;
        let keys = collect_keys(&mut plan)?;
        assert!(plan.next()?.is_none());
        Ok(keys)
    }

    #[test]
    fn test_closed_range_is_inclusive() -> Result<()> {
        assert_eq!(scan(Some("b"), Some("d"))?, vec!["b", "c", "d"]);
        Ok(())
    }

    #[test]
    fn test_open_bounds() -> Result<()> {
        assert_eq!(scan(None, Some("b"))?, vec!["a", "b"]);
        assert_eq!(scan(Some("d"), None)?, vec!["d", "e"]);
        assert_eq!(scan(None, None)?.len(), 5);
        Ok(())
    }

    #[test]
    fn test_bounds_between_keys() -> Result<()> {
        assert_eq!(scan(Some("bb"), Some("dd"))?, vec!["c", "d"]);
        Ok(())
    }

    #[test]
    fn test_inverted_range_is_empty() -> Result<()> {
        assert!(scan(Some("d"), Some("b"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_range_scan_explain() {
        let store = MemoryStore::new();
        let txn = store.begin();
        let plan = RangeScanPlan::new(
            &txn,
            Some(Bytes::from_static(b"a")),
            None,
            FilterExec::always(),
        );
        assert_eq!(
            plan.to_string(),
            "RangeScanPlan{Start = 'a', End = <nil>, Filter = 'true'}"
        );
    }
}
