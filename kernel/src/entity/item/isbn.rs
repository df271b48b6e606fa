use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

// Opaque identifier; format checks belong to the catalog.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct ItemIsbn(String);

impl ItemIsbn {
    pub fn new(isbn: impl Into<String>) -> Self {
        Self(isbn.into())
    }
}
