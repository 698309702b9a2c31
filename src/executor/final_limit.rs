//! Limit over projected tuples. Same skip/count semantics as `LimitPlan`.

use crate::access::Column;
use crate::executor::{FinalPlan, NOT_INITIALIZED};
use anyhow::{bail, Result};
use log::debug;
use std::fmt;

pub struct FinalLimitPlan<'a> {
    child: Box<dyn FinalPlan + 'a>,
    limit: usize,
    offset: usize,
    skipped: usize,
    returned: usize,
    exhausted: bool,
    initialized: bool,
}

impl<'a> FinalLimitPlan<'a> {
    pub fn new(child: Box<dyn FinalPlan + 'a>, limit: usize) -> Self {
        Self::with_offset(child, limit, 0)
    }

    pub fn with_offset(child: Box<dyn FinalPlan + 'a>, limit: usize, offset: usize) -> Self {
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

impl FinalPlan for FinalLimitPlan<'_> {
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

        while self.skipped < self.offset {
            if self.child.next()?.is_none() {
                self.exhausted = true;
                return Ok(None);
            }
            self.skipped += 1;
        }

        if self.returned >= self.limit {
            debug!("FinalLimitPlan reached limit of {}", self.limit);
            self.exhausted = true;
            return Ok(None);
        }

        let tuple = self.child.next()?;
        match tuple {
            Some(_) => self.returned += 1,
            None => self.exhausted = true,
        }
        Ok(tuple)
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

impl fmt::Display for FinalLimitPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FinalLimitPlan{{Start = {}, Count = {}}}",
            self.offset, self.limit
        )
    }
}
