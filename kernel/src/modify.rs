mod item;
mod loan;

pub use self::{item::*, loan::*};
