use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{BorrowerId, ItemId, Loan, LoanId};
use crate::KernelError;

/// Read side of the loan ledger. Listings are ordered by `borrowed_at`.
#[async_trait::async_trait]
pub trait LoanQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn has_active(
        &self,
        con: &mut Self::Transaction,
        borrower_id: &BorrowerId,
        item_id: &ItemId,
    ) -> error_stack::Result<bool, KernelError>;

    async fn find_active(
        &self,
        con: &mut Self::Transaction,
        borrower_id: &BorrowerId,
        item_id: &ItemId,
    ) -> error_stack::Result<Option<Loan>, KernelError>;

    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError>;

    async fn find_by_borrower_id(
        &self,
        con: &mut Self::Transaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<Loan>, KernelError>;

    async fn find_all(
        &self,
        con: &mut Self::Transaction,
    ) -> error_stack::Result<Vec<Loan>, KernelError>;

    async fn find_all_active(
        &self,
        con: &mut Self::Transaction,
    ) -> error_stack::Result<Vec<Loan>, KernelError>;
}

pub trait DependOnLoanQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type LoanQuery: LoanQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn loan_query(&self) -> &Self::LoanQuery;
}
