use crate::controller::Exhaust;
use application::transfer::ItemDto;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    id: Uuid,
    title: String,
    author: String,
    isbn: String,
    stock: i32,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl From<ItemDto> for ItemResponse {
    fn from(value: ItemDto) -> Self {
        Self {
            id: value.id,
            title: value.title,
            author: value.author,
            isbn: value.isbn,
            stock: value.stock,
            created_at: value.created_at,
        }
    }
}

impl IntoResponse for ItemResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug)]
pub struct CreatedResponse(ItemResponse);

impl IntoResponse for CreatedResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

pub struct Presenter;

impl Exhaust<ItemDto> for Presenter {
    type To = CreatedResponse;
    fn emit(&self, input: ItemDto) -> Self::To {
        CreatedResponse(ItemResponse::from(input))
    }
}

impl Exhaust<Option<ItemDto>> for Presenter {
    type To = Option<ItemResponse>;
    fn emit(&self, input: Option<ItemDto>) -> Self::To {
        input.map(ItemResponse::from)
    }
}

impl Exhaust<Vec<ItemDto>> for Presenter {
    type To = Json<Vec<ItemResponse>>;
    fn emit(&self, input: Vec<ItemDto>) -> Self::To {
        Json::from(input.into_iter().map(ItemResponse::from).collect::<Vec<_>>())
    }
}
