use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// Copies currently on the shelf. Never negative.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct ItemStock(i32);

impl ItemStock {
    pub fn new(stock: impl Into<i32>) -> Self {
        Self(stock.into())
    }

    pub fn is_available(&self) -> bool {
        self.0 > 0
    }

    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }

    /// `None` when there is nothing left to lend.
    pub fn decremented(&self) -> Option<Self> {
        self.is_available().then(|| Self(self.0 - 1))
    }

    pub fn incremented(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}
