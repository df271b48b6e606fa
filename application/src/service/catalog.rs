use error_stack::Report;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{DependOnItemQuery, ItemQuery};
use kernel::interface::update::{DependOnItemModifier, ItemModifier};
use kernel::prelude::entity::{
    CreatedAt, Item, ItemAuthor, ItemId, ItemIsbn, ItemStock, ItemTitle,
};
use kernel::KernelError;

use crate::transfer::{CreateItemDto, GetItemDto, ItemDto};

#[async_trait::async_trait]
pub trait RegisterItemService:
    'static + Sync + Send + DependOnDatabaseConnection + DependOnItemModifier
{
    #[tracing::instrument(skip(self), level = "debug")]
    async fn register_item(&self, dto: CreateItemDto) -> error_stack::Result<ItemDto, KernelError> {
        let stock = ItemStock::new(dto.stock);
        if !stock.is_valid() {
            return Err(Report::new(KernelError::InvalidArgument)
                .attach_printable(format!("stock must not be negative, got {}", dto.stock)));
        }

        let mut connection = self.database_connection().transact().await?;

        let item = Item::new(
            ItemId::new(Uuid::new_v4()),
            ItemTitle::new(dto.title),
            ItemAuthor::new(dto.author),
            ItemIsbn::new(dto.isbn),
            stock,
            CreatedAt::new(dto.created_at),
        );
        self.item_modifier().create(&mut connection, &item).await?;

        connection.commit().await?;
        tracing::info!(item_id = %item.id().as_ref(), "item registered");

        Ok(ItemDto::from(item))
    }
}

impl<T> RegisterItemService for T where T: DependOnDatabaseConnection + DependOnItemModifier {}

#[async_trait::async_trait]
pub trait GetItemService: 'static + Sync + Send + DependOnDatabaseConnection + DependOnItemQuery {
    async fn get_item(&self, dto: GetItemDto) -> error_stack::Result<Option<ItemDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let id = ItemId::new(dto.id);
        let item = self.item_query().find_by_id(&mut connection, &id).await?;

        Ok(item.map(ItemDto::from))
    }

    async fn get_all_items(&self) -> error_stack::Result<Vec<ItemDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let items = self.item_query().find_all(&mut connection).await?;
        Ok(items.into_iter().map(ItemDto::from).collect())
    }
}

impl<T> GetItemService for T where T: DependOnDatabaseConnection + DependOnItemQuery {}

#[cfg(test)]
mod test {
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use driver::database::InMemoryDatabase;
    use kernel::KernelError;

    use crate::service::{GetItemService, RegisterItemService};
    use crate::transfer::{CreateItemDto, GetItemDto};

    fn create(title: &str, stock: i32, created_at: OffsetDateTime) -> CreateItemDto {
        CreateItemDto {
            title: title.to_string(),
            author: "Stanisław Lem".to_string(),
            isbn: "9780156027601".to_string(),
            stock,
            created_at,
        }
    }

    #[tokio::test]
    async fn register_and_find() {
        let db = InMemoryDatabase::new();
        let now = OffsetDateTime::now_utc().replace_nanosecond(123_456_789).unwrap();

        let item = db.register_item(create("Solaris", 4, now)).await.unwrap();
        assert_eq!(item.stock, 4);
        assert_eq!(item.created_at, now.replace_nanosecond(123_456_000).unwrap());

        let found = db.get_item(GetItemDto { id: item.id }).await.unwrap();
        assert_eq!(found, Some(item));
    }

    #[tokio::test]
    async fn unknown_item_is_absent() {
        let db = InMemoryDatabase::new();
        let found = db
            .get_item(GetItemDto { id: Uuid::new_v4() })
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn negative_stock_is_rejected() {
        let db = InMemoryDatabase::new();
        let error = db
            .register_item(create("Solaris", -1, OffsetDateTime::now_utc()))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::InvalidArgument);
        assert!(db.get_all_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_items_in_creation_order() {
        let db = InMemoryDatabase::new();
        let now = OffsetDateTime::now_utc();

        let later = db
            .register_item(create("Fiasco", 1, now + Duration::minutes(1)))
            .await
            .unwrap();
        let earlier = db.register_item(create("Solaris", 0, now)).await.unwrap();

        let all = db.get_all_items().await.unwrap();
        assert_eq!(all, vec![earlier, later]);
    }
}
