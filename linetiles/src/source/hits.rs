//! Hit count metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of times a line executed during the recorded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HitCount {
    pub count: u64,
}

impl HitCount {
    pub fn new(count: u64) -> Self {
        Self { count }
    }
}

impl fmt::Display for HitCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count)
    }
}
