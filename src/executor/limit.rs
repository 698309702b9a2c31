//! Limit plan implementation.
//!
//! Skips `offset` rows from the child, then passes through at most `limit`
//! rows. Once the limit is reached the child is never pulled again.

use crate::access::KvPair;
use crate::executor::{Plan, NOT_INITIALIZED};
use anyhow::{bail, Result};
use log::debug;
use std::fmt;

/// Plan that limits the number of rows returned
pub struct LimitPlan<'a> {
    /// Child plan that produces rows
    child: Box<dyn Plan + 'a>,
    /// Maximum number of rows to return
    limit: usize,
    /// Number of rows to skip before returning
    offset: usize,
    /// Number of rows skipped so far
    skipped: usize,
    /// Number of rows returned so far
    returned: usize,
    /// Set once the child ran dry or the limit was reached
    exhausted: bool,
    initialized: bool,
}

impl<'a> LimitPlan<'a> {
    /// Create a limit plan without offset
    pub fn new(child: Box<dyn Plan + 'a>, limit: usize) -> Self {
        Self::with_offset(child, limit, 0)
    }

    /// Create a limit plan with limit and offset
    ///
    /// # Arguments
    /// * `child` - The child plan that produces rows
    /// * `limit` - The maximum number of rows to return
    /// * `offset` - The number of rows to skip before returning
    pub fn with_offset(child: Box<dyn Plan + 'a>, limit: usize, offset: usize) -> Self {
        Self {
            child,
            limit,
            offset,
            skipped: 0,
            returned: 0,
            exhausted: false,
            initialized: false,
        }
    }
}

impl Plan for LimitPlan<'_> {
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
        if self.exhausted {
            return Ok(None);
        }

        while self.skipped < self.offset {
            if self.child.next()?.is_none() {
                self.exhausted = true;
                return Ok(None);
            }
            self.skipped += 1;
        }

        if self.returned >= self.limit {
            debug!("LimitPlan reached limit of {}", self.limit);
            self.exhausted = true;
            return Ok(None);
        }

        match self.child.next()? {
            Some(row) => {
                self.returned += 1;
                Ok(Some(row))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    fn explain(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        lines.extend(self.child.explain());
        lines
    }
}

impl fmt::Display for LimitPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LimitPlan{{Start = {}, Count = {}}}",
            self.offset, self.limit
        )
    }
}
