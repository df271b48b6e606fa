mod author;
mod id;
mod isbn;
mod stock;
mod title;

pub use self::{author::*, id::*, isbn::*, stock::*, title::*};
use crate::entity::common::CreatedAt;
use destructure::{Destructure, Mutation};
use vodca::References;

/// A lendable item. Everything except `stock` is catalog metadata carried through untouched.
#[derive(Debug, Clone, Eq, PartialEq, References, Destructure, Mutation)]
pub struct Item {
    id: ItemId,
    title: ItemTitle,
    author: ItemAuthor,
    isbn: ItemIsbn,
    stock: ItemStock,
    created_at: CreatedAt<Item>,
}

impl Item {
    pub fn new(
        id: ItemId,
        title: ItemTitle,
        author: ItemAuthor,
        isbn: ItemIsbn,
        stock: ItemStock,
        created_at: CreatedAt<Item>,
    ) -> Self {
        Self {
            id,
            title,
            author,
            isbn,
            stock,
            created_at,
        }
    }

    pub fn is_available(&self) -> bool {
        self.stock.is_available()
    }
}
