use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// Upper bound on the rows a ranking returns.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct SelectLimit(i64);

impl SelectLimit {
    pub fn new(limit: impl Into<i64>) -> Self {
        Self(limit.into())
    }

    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl Default for SelectLimit {
    fn default() -> Self {
        Self(10)
    }
}
