//! Point lookup plan.
//!
//! Fetches an explicit set of keys. Keys are sorted on construction so the
//! output follows key order like every other leaf plan; absent keys are
//! skipped.

use crate::access::KvPair;
use crate::executor::{FilterExec, Plan, NOT_INITIALIZED};
use crate::storage::Txn;
use anyhow::{bail, Result};
use bytes::Bytes;
use log::{debug, trace};
use std::fmt;

pub struct MultiGetPlan<'a> {
    txn: &'a dyn Txn,
    /// Keys to fetch, ascending
    keys: Vec<Bytes>,
    filter: FilterExec,
    /// Index of the next key to fetch
    position: usize,
    initialized: bool,
}

impl<'a> MultiGetPlan<'a> {
    pub fn new(txn: &'a dyn Txn, mut keys: Vec<Bytes>, filter: FilterExec) -> Self {
        keys.sort();
        Self {
            txn,
            keys,
            filter,
            position: 0,
            initialized: false,
        }
    }
}

impl Plan for MultiGetPlan<'_> {
    fn init(&mut self) -> Result<()> {
        if !self.initialized {
            self.initialized = true;
            debug!("{} initialized", self);
        }
        Ok(())
    }

    fn next(&mut self) -> Result<Option<KvPair>> {
        if !self.initialized {
            bail!(NOT_INITIALIZED);
        }

        while self.position < self.keys.len() {
            let key = self.keys[self.position].clone();
            self.position += 1;

            let Some(value) = self.txn.get(&key)? else {
                trace!("key {:?} not found", key);
                continue;
            };
            let row = KvPair { key, value };
            if self.filter.filter(&row)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}

impl fmt::Display for MultiGetPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self
            .keys
            .iter()
            .map(|k| String::from_utf8_lossy(k).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "MultiGetPlan{{Keys = <{}>, Filter = '{}'}}",
            keys,
            self.filter.explain()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::collect_keys;
    use crate::expression::Expression;
    use crate::storage::MemoryStore;

    fn keys(list: &[&'static str]) -> Vec<Bytes> {
        list.iter().map(|k| Bytes::from_static(k.as_bytes())).collect()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.put("a", "1");
        store.put("b", "2");
        store.put("c", "3");
        store
    }

    #[test]
    fn test_multi_get_sorted_and_skips_missing() -> Result<()> {
        let store = store();
        let txn = store.begin();
        let mut plan = MultiGetPlan::new(&txn, keys(&["c", "x", "a"]), FilterExec::always());
        plan.init()?;
        assert_eq!(collect_keys(&mut plan)?, vec!["a", "c"]);
        assert!(plan.next()?.is_none());
        Ok(())
    }

    #[test]
    fn test_multi_get_with_filter() -> Result<()> {
        let store = store();
        let txn = store.begin();
        let filter = FilterExec::new(Expression::ne(Expression::value(), Expression::string("1")));
        let mut plan = MultiGetPlan::new(&txn, keys(&["a", "b"]), filter);
        plan.init()?;
        assert_eq!(collect_keys(&mut plan)?, vec!["b"]);
        Ok(())
    }

    #[test]
    fn test_multi_get_values() -> Result<()> {
        let store = store();
        let txn = store.begin();
        let mut plan = MultiGetPlan::new(&txn, keys(&["b"]), FilterExec::always());
        plan.init()?;
        assert_eq!(plan.next()?, Some(KvPair::new("b", "2")));
        Ok(())
    }

    #[test]
    fn test_multi_get_explain() {
        let store = MemoryStore::new();
        let txn = store.begin();
        let plan = MultiGetPlan::new(&txn, keys(&["b", "a"]), FilterExec::always());
        assert_eq!(
            plan.to_string(),
            "MultiGetPlan{Keys = <a, b>, Filter = 'true'}"
        );
    }
}
