//! Prefix scan plan.
//!
//! Seeks to the prefix and yields rows until the first key that no longer
//! starts with it. Keys are ordered, so nothing past that point can match.

use crate::access::KvPair;
use crate::executor::{FilterExec, Plan, NOT_INITIALIZED};
use crate::storage::{Cursor, Txn};
use anyhow::{anyhow, Result};
use bytes::Bytes;
use log::debug;
use std::fmt;

pub struct PrefixScanPlan<'a> {
    txn: &'a dyn Txn,
    prefix: Bytes,
    filter: FilterExec,
    cursor: Option<Box<dyn Cursor + 'a>>,
    exhausted: bool,
}

impl<'a> PrefixScanPlan<'a> {
    pub fn new(txn: &'a dyn Txn, prefix: impl Into<Bytes>, filter: FilterExec) -> Self {
        Self {
            txn,
            prefix: prefix.into(),
            filter,
            cursor: None,
            exhausted: false,
        }
    }
}

impl Plan for PrefixScanPlan<'_> {
    fn init(&mut self) -> Result<()> {
        if self.cursor.is_some() {
            return Ok(());
        }
        let mut cursor = self.txn.cursor()?;
        cursor.seek(&self.prefix)?;
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
            if !row.key.starts_with(&self.prefix) {
                break;
            }
            if self.filter.filter(&row)? {
                return Ok(Some(row));
            }
        }

        self.exhausted = true;
        debug!("PrefixScanPlan exhausted");
        Ok(None)
    }
}

impl fmt::Display for PrefixScanPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PrefixScanPlan{{Prefix = '{}', Filter = '{}'}}",
            String::from_utf8_lossy(&self.prefix),
            self.filter.explain()
        )
    }
}
