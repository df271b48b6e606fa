use crate::controller::Intake;
use application::transfer::{CreateItemDto, GetItemDto};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    title: String,
    author: String,
    isbn: String,
    stock: i32,
}

#[derive(Debug)]
pub struct GetRequest {
    id: Uuid,
}

impl GetRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

pub struct Transformer;

impl Intake<CreateRequest> for Transformer {
    type To = CreateItemDto;
    fn emit(&self, input: CreateRequest) -> Self::To {
        CreateItemDto {
            title: input.title,
            author: input.author,
            isbn: input.isbn,
            stock: input.stock,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

impl Intake<GetRequest> for Transformer {
    type To = GetItemDto;
    fn emit(&self, input: GetRequest) -> Self::To {
        GetItemDto { id: input.id }
    }
}
