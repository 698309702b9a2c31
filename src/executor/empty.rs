//! Plan that yields nothing, used when a query is known to be unsatisfiable.

use crate::access::KvPair;
use crate::executor::Plan;
use anyhow::Result;
use std::fmt;

#[derive(Debug, Default)]
pub struct EmptyResultPlan;

impl EmptyResultPlan {
    pub fn new() -> Self {
        Self
    }
}

impl Plan for EmptyResultPlan {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn next(&mut self) -> Result<Option<KvPair>> {
        Ok(None)
    }
}

impl fmt::Display for EmptyResultPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EmptyResultPlan")
    }
}
