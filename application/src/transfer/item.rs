use kernel::prelude::entity::{DestructItem, Item};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ItemDto {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub stock: i32,
    pub created_at: OffsetDateTime,
}

impl From<Item> for ItemDto {
    fn from(value: Item) -> Self {
        let DestructItem {
            id,
            title,
            author,
            isbn,
            stock,
            created_at,
        } = value.into_destruct();
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            stock: stock.into(),
            created_at: created_at.into(),
        }
    }
}

#[derive(Debug)]
pub struct CreateItemDto {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub stock: i32,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct GetItemDto {
    pub id: Uuid,
}
