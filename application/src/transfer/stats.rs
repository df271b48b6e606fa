use kernel::prelude::entity::{
    BorrowerLoanCount, DestructBorrowerLoanCount, DestructItemLoanCount, DestructLedgerSummary,
    ItemLoanCount, LedgerSummary,
};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct StatsDto {
    pub total_items: i64,
    pub available_items: i64,
    pub unavailable_items: i64,
    pub total_loans: i64,
    pub active_loans: i64,
}

impl From<LedgerSummary> for StatsDto {
    fn from(value: LedgerSummary) -> Self {
        let DestructLedgerSummary {
            total_items,
            available_items,
            unavailable_items,
            total_loans,
            active_loans,
        } = value.into_destruct();
        Self {
            total_items,
            available_items,
            unavailable_items,
            total_loans,
            active_loans,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TopItemDto {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub count: i64,
}

impl From<ItemLoanCount> for TopItemDto {
    fn from(value: ItemLoanCount) -> Self {
        let DestructItemLoanCount {
            item_id,
            title,
            author,
            loans,
        } = value.into_destruct();
        Self {
            id: item_id.into(),
            title: title.into(),
            author: author.into(),
            count: loans.into(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TopBorrowerDto {
    pub borrower_id: Uuid,
    pub count: i64,
}

impl From<BorrowerLoanCount> for TopBorrowerDto {
    fn from(value: BorrowerLoanCount) -> Self {
        let DestructBorrowerLoanCount { borrower_id, loans } = value.into_destruct();
        Self {
            borrower_id: borrower_id.into(),
            count: loans.into(),
        }
    }
}

#[derive(Debug)]
pub struct GetTopDto {
    pub limit: i64,
}
