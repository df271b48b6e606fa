use crate::controller::Intake;
use crate::identity::Caller;
use application::transfer::{BorrowDto, GetLoansFromBorrowerDto, ReturnByLoanIdDto, ReturnDto};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct BorrowRequest {
    item_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    item_id: Uuid,
}

#[derive(Debug)]
pub struct ReturnByIdRequest {
    id: Uuid,
}

impl ReturnByIdRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

pub struct Transformer;

impl Intake<(Caller, BorrowRequest)> for Transformer {
    type To = BorrowDto;
    fn emit(&self, input: (Caller, BorrowRequest)) -> Self::To {
        let (caller, input) = input;
        BorrowDto {
            borrower_id: caller.id(),
            item_id: input.item_id,
        }
    }
}

impl Intake<(Caller, ReturnRequest)> for Transformer {
    type To = ReturnDto;
    fn emit(&self, input: (Caller, ReturnRequest)) -> Self::To {
        let (caller, input) = input;
        ReturnDto {
            borrower_id: caller.id(),
            item_id: input.item_id,
        }
    }
}

impl Intake<ReturnByIdRequest> for Transformer {
    type To = ReturnByLoanIdDto;
    fn emit(&self, input: ReturnByIdRequest) -> Self::To {
        ReturnByLoanIdDto { loan_id: input.id }
    }
}

impl Intake<Caller> for Transformer {
    type To = GetLoansFromBorrowerDto;
    fn emit(&self, input: Caller) -> Self::To {
        GetLoansFromBorrowerDto {
            borrower_id: input.id(),
        }
    }
}
