//! The (d, t, n) parameter triple

use crate::error::{CffError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one search unit: is there a d-CFF with n blocks over t elements?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CffParams {
    pub d: usize,
    pub t: usize,
    pub n: usize,
}

impl CffParams {
    pub fn new(d: usize, t: usize, n: usize) -> Self {
        Self { d, t, n }
    }

    /// Reject triples that cannot be encoded into a meaningful formula
    pub fn validate(&self) -> Result<()> {
        let Self { d, t, n } = *self;
        if d == 0 {
            return Err(CffError::invalid(d, t, n, "d must be at least 1"));
        }
        if t == 0 {
            return Err(CffError::invalid(d, t, n, "t must be at least 1"));
        }
        if n == 0 {
            return Err(CffError::invalid(d, t, n, "n must be at least 1"));
        }
        if d >= n {
            // no d-subset of the other n-1 blocks exists; the formula would be empty
            return Err(CffError::invalid(d, t, n, "d must be smaller than n"));
        }
        Ok(())
    }
}

impl fmt::Display for CffParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d={}, t={}, n={}", self.d, self.t, self.n)
    }
}
