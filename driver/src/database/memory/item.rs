use error_stack::Report;

use kernel::interface::query::ItemQuery;
use kernel::interface::update::ItemModifier;
use kernel::prelude::entity::{Item, ItemId};
use kernel::KernelError;

use crate::database::memory::InMemoryTransaction;

pub struct InMemoryItemRepository;

#[async_trait::async_trait]
impl ItemQuery for InMemoryItemRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        Ok(con.item(id))
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut InMemoryTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        if con.item(id).is_none() {
            return Ok(None);
        }
        con.lock(id).await?;
        Ok(con.item(id))
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
    ) -> error_stack::Result<Vec<Item>, KernelError> {
        Ok(con.items())
    }
}

#[async_trait::async_trait]
impl ItemModifier for InMemoryItemRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        item: &Item,
    ) -> error_stack::Result<(), KernelError> {
        if con.item(item.id()).is_some() {
            return Err(Report::new(KernelError::Concurrency)
                .attach_printable(format!("item {} already exists", item.id().as_ref())));
        }
        con.lock(item.id()).await?;
        con.stage_item(item.clone());
        Ok(())
    }

    async fn decrement_stock(
        &self,
        con: &mut InMemoryTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Item, KernelError> {
        con.lock(id).await?;
        let mut item = con
            .item(id)
            .ok_or_else(|| Report::new(KernelError::ItemNotFound))?;
        let stock = item
            .stock()
            .decremented()
            .ok_or_else(|| Report::new(KernelError::OutOfStock))?;
        item.substitute(|item| *item.stock = stock);
        con.stage_item(item.clone());
        Ok(item)
    }

    async fn increment_stock(
        &self,
        con: &mut InMemoryTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Item, KernelError> {
        con.lock(id).await?;
        let mut item = con
            .item(id)
            .ok_or_else(|| Report::new(KernelError::ItemNotFound))?;
        let stock = item.stock().incremented().ok_or_else(|| {
            Report::new(KernelError::Internal).attach_printable("stock counter overflow")
        })?;
        item.substitute(|item| *item.stock = stock);
        con.stage_item(item.clone());
        Ok(item)
    }
}
