mod count;

pub use self::count::*;
use destructure::Destructure;
use vodca::References;

use crate::entity::{BorrowerId, ItemAuthor, ItemId, ItemTitle};

/// Catalog and ledger counters read from one consistent view.
#[derive(Debug, Clone, Default, Eq, PartialEq, References, Destructure)]
pub struct LedgerSummary {
    total_items: i64,
    available_items: i64,
    unavailable_items: i64,
    total_loans: i64,
    active_loans: i64,
}

impl LedgerSummary {
    pub fn new(
        total_items: i64,
        available_items: i64,
        unavailable_items: i64,
        total_loans: i64,
        active_loans: i64,
    ) -> Self {
        Self {
            total_items,
            available_items,
            unavailable_items,
            total_loans,
            active_loans,
        }
    }
}

/// How often an item has been lent, closed loans included.
#[derive(Debug, Clone, Eq, PartialEq, References, Destructure)]
pub struct ItemLoanCount {
    item_id: ItemId,
    title: ItemTitle,
    author: ItemAuthor,
    loans: LoanCount,
}

impl ItemLoanCount {
    pub fn new(item_id: ItemId, title: ItemTitle, author: ItemAuthor, loans: LoanCount) -> Self {
        Self {
            item_id,
            title,
            author,
            loans,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, References, Destructure)]
pub struct BorrowerLoanCount {
    borrower_id: BorrowerId,
    loans: LoanCount,
}

impl BorrowerLoanCount {
    pub fn new(borrower_id: BorrowerId, loans: LoanCount) -> Self {
        Self { borrower_id, loans }
    }
}
