use error_stack::Report;

use kernel::interface::query::LoanQuery;
use kernel::interface::update::LoanModifier;
use kernel::prelude::entity::{BorrowerId, ItemId, Loan, LoanId, ReturnedAt};
use kernel::KernelError;

use crate::database::memory::InMemoryTransaction;

pub struct InMemoryLoanRepository;

fn is_active_pair(loan: &Loan, borrower_id: &BorrowerId, item_id: &ItemId) -> bool {
    loan.is_active() && loan.borrower_id() == borrower_id && loan.item_id() == item_id
}

#[async_trait::async_trait]
impl LoanQuery for InMemoryLoanRepository {
    type Transaction = InMemoryTransaction;

    async fn has_active(
        &self,
        con: &mut InMemoryTransaction,
        borrower_id: &BorrowerId,
        item_id: &ItemId,
    ) -> error_stack::Result<bool, KernelError> {
        Ok(con
            .loans()
            .iter()
            .any(|loan| is_active_pair(loan, borrower_id, item_id)))
    }

    async fn find_active(
        &self,
        con: &mut InMemoryTransaction,
        borrower_id: &BorrowerId,
        item_id: &ItemId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        Ok(con
            .loans()
            .into_iter()
            .find(|loan| is_active_pair(loan, borrower_id, item_id)))
    }

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        Ok(con.loan(id))
    }

    async fn find_by_borrower_id(
        &self,
        con: &mut InMemoryTransaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        Ok(con
            .loans()
            .into_iter()
            .filter(|loan| loan.borrower_id() == borrower_id)
            .collect())
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        Ok(con.loans())
    }

    async fn find_all_active(
        &self,
        con: &mut InMemoryTransaction,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        Ok(con.loans().into_iter().filter(Loan::is_active).collect())
    }
}

#[async_trait::async_trait]
impl LoanModifier for InMemoryLoanRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        loan: &Loan,
    ) -> error_stack::Result<(), KernelError> {
        // Mirrors the partial unique index on (borrower_id, item_id) for active loans.
        let duplicated = con.loans().iter().any(|existing| {
            existing.id() == loan.id()
                || (loan.is_active()
                    && is_active_pair(existing, loan.borrower_id(), loan.item_id()))
        });
        if duplicated {
            return Err(Report::new(KernelError::Concurrency)
                .attach_printable(format!("loan {} violates uniqueness", loan.id().as_ref())));
        }
        con.stage_loan(loan.clone());
        Ok(())
    }

    async fn close(
        &self,
        con: &mut InMemoryTransaction,
        id: &LoanId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<Loan, KernelError> {
        let loan = con
            .loan(id)
            .ok_or_else(|| Report::new(KernelError::LoanNotFound))?;
        let closed = loan.close(returned_at.clone())?;
        con.stage_loan(closed.clone());
        Ok(closed)
    }
}
