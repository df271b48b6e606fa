mod item;
mod loan;
mod stats;

pub use self::{item::ItemRouter, loan::LoanRouter, stats::StatsRouter};
