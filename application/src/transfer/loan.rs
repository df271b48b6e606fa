use kernel::prelude::entity::{DestructLoan, Loan};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LoanDto {
    pub id: Uuid,
    pub borrower_id: Uuid,
    pub item_id: Uuid,
    pub borrowed_at: OffsetDateTime,
    pub returned_at: Option<OffsetDateTime>,
}

impl LoanDto {
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }
}

impl From<Loan> for LoanDto {
    fn from(value: Loan) -> Self {
        let DestructLoan {
            id,
            borrower_id,
            item_id,
            borrowed_at,
            returned_at,
        } = value.into_destruct();
        Self {
            id: id.into(),
            borrower_id: borrower_id.into(),
            item_id: item_id.into(),
            borrowed_at: borrowed_at.into(),
            returned_at: returned_at.map(Into::into),
        }
    }
}

#[derive(Debug)]
pub struct BorrowDto {
    pub borrower_id: Uuid,
    pub item_id: Uuid,
}

#[derive(Debug)]
pub struct ReturnDto {
    pub borrower_id: Uuid,
    pub item_id: Uuid,
}

#[derive(Debug)]
pub struct ReturnByLoanIdDto {
    pub loan_id: Uuid,
}

#[derive(Debug)]
pub struct GetLoansFromBorrowerDto {
    pub borrower_id: Uuid,
}
