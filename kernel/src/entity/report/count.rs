use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Fromln, AsRefln)]
pub struct LoanCount(i64);

impl LoanCount {
    pub fn new(count: impl Into<i64>) -> Self {
        Self(count.into())
    }
}
