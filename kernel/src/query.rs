mod item;
mod loan;
mod stats;

pub use self::{item::*, loan::*, stats::*};
