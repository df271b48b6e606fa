use error_stack::Report;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use kernel::interface::query::ItemQuery;
use kernel::interface::update::ItemModifier;
use kernel::prelude::entity::{
    CreatedAt, Item, ItemAuthor, ItemId, ItemIsbn, ItemStock, ItemTitle,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresItemRepository;

#[async_trait::async_trait]
impl ItemQuery for PostgresItemRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        PgItemInternal::find_by_id(con, id).await
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut PostgresTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        PgItemInternal::find_by_id_for_update(con, id).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresTransaction,
    ) -> error_stack::Result<Vec<Item>, KernelError> {
        PgItemInternal::find_all(con).await
    }
}

#[async_trait::async_trait]
impl ItemModifier for PostgresItemRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        item: &Item,
    ) -> error_stack::Result<(), KernelError> {
        PgItemInternal::create(con, item).await
    }

    async fn decrement_stock(
        &self,
        con: &mut PostgresTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Item, KernelError> {
        PgItemInternal::decrement_stock(con, id).await
    }

    async fn increment_stock(
        &self,
        con: &mut PostgresTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Item, KernelError> {
        PgItemInternal::increment_stock(con, id).await
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    title: String,
    author: String,
    isbn: String,
    stock: i32,
    created_at: OffsetDateTime,
}

impl From<ItemRow> for Item {
    fn from(value: ItemRow) -> Self {
        Item::new(
            ItemId::new(value.id),
            ItemTitle::new(value.title),
            ItemAuthor::new(value.author),
            ItemIsbn::new(value.isbn),
            ItemStock::new(value.stock),
            CreatedAt::new(value.created_at),
        )
    }
}

pub(in crate::database) struct PgItemInternal;

impl PgItemInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        let row = sqlx::query_as::<_, ItemRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, isbn, stock, created_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Item::from))
    }

    async fn find_by_id_for_update(
        con: &mut PgConnection,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        let row = sqlx::query_as::<_, ItemRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, isbn, stock, created_at
            FROM items
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Item::from))
    }

    async fn find_all(con: &mut PgConnection) -> error_stack::Result<Vec<Item>, KernelError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, isbn, stock, created_at
            FROM items
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn create(con: &mut PgConnection, item: &Item) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO items (id, title, author, isbn, stock, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id().as_ref())
        .bind(item.title().as_ref())
        .bind(item.author().as_ref())
        .bind(item.isbn().as_ref())
        .bind(item.stock().as_ref())
        .bind(item.created_at().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn decrement_stock(
        con: &mut PgConnection,
        id: &ItemId,
    ) -> error_stack::Result<Item, KernelError> {
        let row = sqlx::query_as::<_, ItemRow>(
            // language=postgresql
            r#"
            UPDATE items
            SET stock = stock - 1
            WHERE id = $1 AND stock > 0
            RETURNING id, title, author, isbn, stock, created_at
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(&mut *con)
        .await
        .convert_error()?;
        match row {
            Some(row) => Ok(Item::from(row)),
            None => match Self::find_by_id(con, id).await? {
                Some(_) => Err(Report::new(KernelError::OutOfStock)),
                None => Err(Report::new(KernelError::ItemNotFound)),
            },
        }
    }

    async fn increment_stock(
        con: &mut PgConnection,
        id: &ItemId,
    ) -> error_stack::Result<Item, KernelError> {
        let row = sqlx::query_as::<_, ItemRow>(
            // language=postgresql
            r#"
            UPDATE items
            SET stock = stock + 1
            WHERE id = $1
            RETURNING id, title, author, isbn, stock, created_at
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        row.map(Item::from)
            .ok_or_else(|| Report::new(KernelError::ItemNotFound))
    }
}

#[cfg(test)]
mod test {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::ItemQuery;
    use kernel::interface::update::ItemModifier;
    use kernel::prelude::entity::{
        CreatedAt, Item, ItemAuthor, ItemId, ItemIsbn, ItemStock, ItemTitle,
    };
    use kernel::KernelError;

    use crate::database::postgres::{PostgresDatabase, PostgresItemRepository};

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn stock_transitions() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        let mut con = db.transact().await?;
        let id = ItemId::new(Uuid::new_v4());
        let item = Item::new(
            id.clone(),
            ItemTitle::new("title"),
            ItemAuthor::new("author"),
            ItemIsbn::new("isbn"),
            ItemStock::new(1),
            CreatedAt::new(OffsetDateTime::now_utc().replace_nanosecond(0).unwrap()),
        );
        PostgresItemRepository.create(&mut con, &item).await?;

        let found = PostgresItemRepository
            .find_by_id_for_update(&mut con, &id)
            .await?;
        assert_eq!(found, Some(item.clone()));

        let item = PostgresItemRepository.decrement_stock(&mut con, &id).await?;
        assert_eq!(item.stock(), &ItemStock::new(0));

        let error = PostgresItemRepository
            .decrement_stock(&mut con, &id)
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::OutOfStock);

        let item = PostgresItemRepository.increment_stock(&mut con, &id).await?;
        assert_eq!(item.stock(), &ItemStock::new(1));

        let missing = ItemId::new(Uuid::new_v4());
        let error = PostgresItemRepository
            .increment_stock(&mut con, &missing)
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::ItemNotFound);

        con.roll_back().await?;
        Ok(())
    }
}
