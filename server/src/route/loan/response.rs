use crate::controller::Exhaust;
use application::transfer::LoanDto;
use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    id: Uuid,
    borrower_id: Uuid,
    item_id: Uuid,
    active: bool,
    #[serde(with = "time::serde::rfc3339")]
    borrowed_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    returned_at: Option<OffsetDateTime>,
}

impl From<LoanDto> for LoanResponse {
    fn from(value: LoanDto) -> Self {
        Self {
            active: value.is_active(),
            id: value.id,
            borrower_id: value.borrower_id,
            item_id: value.item_id,
            borrowed_at: value.borrowed_at,
            returned_at: value.returned_at,
        }
    }
}

pub struct Presenter;

impl Exhaust<LoanDto> for Presenter {
    type To = Json<LoanResponse>;
    fn emit(&self, input: LoanDto) -> Self::To {
        Json(LoanResponse::from(input))
    }
}

impl Exhaust<Vec<LoanDto>> for Presenter {
    type To = Json<Vec<LoanResponse>>;
    fn emit(&self, input: Vec<LoanDto>) -> Self::To {
        Json::from(input.into_iter().map(LoanResponse::from).collect::<Vec<_>>())
    }
}
