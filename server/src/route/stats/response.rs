use crate::controller::Exhaust;
use application::transfer::{StatsDto, TopBorrowerDto, TopItemDto};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    total_items: i64,
    available_items: i64,
    unavailable_items: i64,
    total_loans: i64,
    active_loans: i64,
}

#[derive(Debug, Serialize)]
pub struct TopItemResponse {
    id: Uuid,
    title: String,
    author: String,
    count: i64,
}

impl From<TopItemDto> for TopItemResponse {
    fn from(value: TopItemDto) -> Self {
        Self {
            id: value.id,
            title: value.title,
            author: value.author,
            count: value.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TopBorrowerResponse {
    borrower_id: Uuid,
    count: i64,
}

impl From<TopBorrowerDto> for TopBorrowerResponse {
    fn from(value: TopBorrowerDto) -> Self {
        Self {
            borrower_id: value.borrower_id,
            count: value.count,
        }
    }
}

pub struct Presenter;

impl Exhaust<StatsDto> for Presenter {
    type To = Json<StatsResponse>;
    fn emit(&self, input: StatsDto) -> Self::To {
        Json(StatsResponse {
            total_items: input.total_items,
            available_items: input.available_items,
            unavailable_items: input.unavailable_items,
            total_loans: input.total_loans,
            active_loans: input.active_loans,
        })
    }
}

impl Exhaust<Vec<TopItemDto>> for Presenter {
    type To = Json<Vec<TopItemResponse>>;
    fn emit(&self, input: Vec<TopItemDto>) -> Self::To {
        Json(input.into_iter().map(TopItemResponse::from).collect())
    }
}

impl Exhaust<Vec<TopBorrowerDto>> for Presenter {
    type To = Json<Vec<TopBorrowerResponse>>;
    fn emit(&self, input: Vec<TopBorrowerDto>) -> Self::To {
        Json(input.into_iter().map(TopBorrowerResponse::from).collect())
    }
}
