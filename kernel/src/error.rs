use std::fmt::Display;

use error_stack::Context;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KernelError {
    ItemNotFound,
    LoanNotFound,
    OutOfStock,
    AlreadyBorrowed,
    NoActiveLoan,
    AlreadyReturned,
    InvalidArgument,
    Concurrency,
    Timeout,
    Internal,
}

impl KernelError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, KernelError::ItemNotFound | KernelError::LoanNotFound)
    }

    /// Business-level rejections. These are expected outcomes, not faults.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            KernelError::OutOfStock
                | KernelError::AlreadyBorrowed
                | KernelError::NoActiveLoan
                | KernelError::AlreadyReturned
        )
    }

    /// Only storage-level conflicts are worth running the unit of work again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KernelError::Concurrency)
    }
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::ItemNotFound => write!(f, "Item not found"),
            KernelError::LoanNotFound => write!(f, "Loan not found"),
            KernelError::OutOfStock => write!(f, "Item is out of stock"),
            KernelError::AlreadyBorrowed => write!(f, "Item is already borrowed by this borrower"),
            KernelError::NoActiveLoan => write!(f, "No active loan for this borrower and item"),
            KernelError::AlreadyReturned => write!(f, "Loan has already been returned"),
            KernelError::InvalidArgument => write!(f, "Invalid argument"),
            KernelError::Concurrency => write!(f, "Concurrency error"),
            KernelError::Timeout => write!(f, "Process timed out"),
            KernelError::Internal => write!(f, "Internal kernel error"),
        }
    }
}

impl Context for KernelError {}

#[cfg(test)]
mod test {
    use crate::KernelError;

    #[test]
    fn classification() {
        assert!(KernelError::ItemNotFound.is_not_found());
        assert!(KernelError::LoanNotFound.is_not_found());
        assert!(!KernelError::NoActiveLoan.is_not_found());

        assert!(KernelError::OutOfStock.is_conflict());
        assert!(KernelError::AlreadyReturned.is_conflict());
        assert!(!KernelError::Concurrency.is_conflict());

        assert!(KernelError::Concurrency.is_retryable());
        assert!(!KernelError::AlreadyBorrowed.is_retryable());
        assert!(!KernelError::Timeout.is_retryable());
    }
}
