use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vodca::{AsRefln, Fromln};

/// Resolved identity of the caller. Authentication happens before this value exists.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct BorrowerId(Uuid);

impl BorrowerId {
    pub fn new(id: impl Into<Uuid>) -> Self {
        Self(id.into())
    }
}
