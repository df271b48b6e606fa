mod borrowed_at;
mod id;
mod returned_at;

pub use self::{borrowed_at::*, id::*, returned_at::*};
use destructure::{Destructure, Mutation};
use error_stack::Report;
use vodca::References;

use crate::entity::{BorrowerId, ItemId};
use crate::KernelError;

/// A ledger record. Active while `returned_at` is absent; closing it is terminal.
#[derive(Debug, Clone, Eq, PartialEq, References, Destructure, Mutation)]
pub struct Loan {
    id: LoanId,
    borrower_id: BorrowerId,
    item_id: ItemId,
    borrowed_at: BorrowedAt,
    returned_at: Option<ReturnedAt>,
}

impl Loan {
    pub fn new(
        id: LoanId,
        borrower_id: BorrowerId,
        item_id: ItemId,
        borrowed_at: BorrowedAt,
        returned_at: Option<ReturnedAt>,
    ) -> Self {
        Self {
            id,
            borrower_id,
            item_id,
            borrowed_at,
            returned_at,
        }
    }

    pub fn open(
        id: LoanId,
        borrower_id: BorrowerId,
        item_id: ItemId,
        borrowed_at: BorrowedAt,
    ) -> Self {
        Self::new(id, borrower_id, item_id, borrowed_at, None)
    }

    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }

    pub fn close(mut self, returned_at: ReturnedAt) -> error_stack::Result<Self, KernelError> {
        if !self.is_active() {
            return Err(Report::new(KernelError::AlreadyReturned)
                .attach_printable(format!("loan {} is closed", self.id.as_ref())));
        }
        self.substitute(|loan| *loan.returned_at = Some(returned_at));
        Ok(self)
    }
}

#[cfg(test)]
mod test {
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use crate::entity::{BorrowedAt, BorrowerId, ItemId, Loan, LoanId, ReturnedAt};
    use crate::KernelError;

    fn active() -> Loan {
        Loan::open(
            LoanId::new(Uuid::new_v4()),
            BorrowerId::new(Uuid::new_v4()),
            ItemId::new(Uuid::new_v4()),
            BorrowedAt::new(OffsetDateTime::now_utc()),
        )
    }

    #[test]
    fn close_once() {
        let loan = active();
        assert!(loan.is_active());

        let at = ReturnedAt::new(*loan.borrowed_at().as_ref() + Duration::hours(1));
        let closed = loan.clone().close(at.clone()).unwrap();
        assert!(!closed.is_active());
        assert_eq!(closed.returned_at(), &Some(at));
        assert_eq!(closed.id(), loan.id());
        assert_eq!(closed.borrowed_at(), loan.borrowed_at());
    }

    #[test]
    fn closed_loan_cannot_be_closed_again() {
        let now = OffsetDateTime::now_utc();
        let closed = active().close(ReturnedAt::new(now)).unwrap();
        let error = closed.close(ReturnedAt::new(now)).unwrap_err();
        assert_eq!(error.current_context(), &KernelError::AlreadyReturned);
    }
}
