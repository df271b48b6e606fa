mod borrower;
mod common;
mod item;
mod loan;
mod report;

pub use self::{borrower::*, common::*, item::*, loan::*, report::*};
