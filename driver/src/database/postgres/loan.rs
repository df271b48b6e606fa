use error_stack::Report;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use kernel::interface::query::LoanQuery;
use kernel::interface::update::LoanModifier;
use kernel::prelude::entity::{BorrowedAt, BorrowerId, ItemId, Loan, LoanId, ReturnedAt};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresLoanRepository;

#[async_trait::async_trait]
impl LoanQuery for PostgresLoanRepository {
    type Transaction = PostgresTransaction;

    async fn has_active(
        &self,
        con: &mut PostgresTransaction,
        borrower_id: &BorrowerId,
        item_id: &ItemId,
    ) -> error_stack::Result<bool, KernelError> {
        PgLoanInternal::has_active(con, borrower_id, item_id).await
    }

    async fn find_active(
        &self,
        con: &mut PostgresTransaction,
        borrower_id: &BorrowerId,
        item_id: &ItemId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        PgLoanInternal::find_active(con, borrower_id, item_id).await
    }

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        PgLoanInternal::find_by_id(con, id).await
    }

    async fn find_by_borrower_id(
        &self,
        con: &mut PostgresTransaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        PgLoanInternal::find_by_borrower_id(con, borrower_id).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresTransaction,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        PgLoanInternal::find_all(con, false).await
    }

    async fn find_all_active(
        &self,
        con: &mut PostgresTransaction,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        PgLoanInternal::find_all(con, true).await
    }
}

#[async_trait::async_trait]
impl LoanModifier for PostgresLoanRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        loan: &Loan,
    ) -> error_stack::Result<(), KernelError> {
        PgLoanInternal::create(con, loan).await
    }

    async fn close(
        &self,
        con: &mut PostgresTransaction,
        id: &LoanId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<Loan, KernelError> {
        PgLoanInternal::close(con, id, returned_at).await
    }
}

#[derive(sqlx::FromRow)]
struct LoanRow {
    id: Uuid,
    borrower_id: Uuid,
    item_id: Uuid,
    borrowed_at: OffsetDateTime,
    returned_at: Option<OffsetDateTime>,
}

impl From<LoanRow> for Loan {
    fn from(value: LoanRow) -> Self {
        Loan::new(
            LoanId::new(value.id),
            BorrowerId::new(value.borrower_id),
            ItemId::new(value.item_id),
            BorrowedAt::new(value.borrowed_at),
            value.returned_at.map(ReturnedAt::new),
        )
    }
}

pub(in crate::database) struct PgLoanInternal;

impl PgLoanInternal {
    async fn has_active(
        con: &mut PgConnection,
        borrower_id: &BorrowerId,
        item_id: &ItemId,
    ) -> error_stack::Result<bool, KernelError> {
        sqlx::query_scalar::<_, bool>(
            // language=postgresql
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE borrower_id = $1 AND item_id = $2 AND returned_at IS NULL
            )
            "#,
        )
        .bind(borrower_id.as_ref())
        .bind(item_id.as_ref())
        .fetch_one(con)
        .await
        .convert_error()
    }

    async fn find_active(
        con: &mut PgConnection,
        borrower_id: &BorrowerId,
        item_id: &ItemId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        let row = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, borrower_id, item_id, borrowed_at, returned_at
            FROM loans
            WHERE borrower_id = $1 AND item_id = $2 AND returned_at IS NULL
            "#,
        )
        .bind(borrower_id.as_ref())
        .bind(item_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Loan::from))
    }

    async fn find_by_id(
        con: &mut PgConnection,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        let row = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, borrower_id, item_id, borrowed_at, returned_at
            FROM loans
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Loan::from))
    }

    async fn find_by_borrower_id(
        con: &mut PgConnection,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        let rows = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, borrower_id, item_id, borrowed_at, returned_at
            FROM loans
            WHERE borrower_id = $1
            ORDER BY borrowed_at, id
            "#,
        )
        .bind(borrower_id.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Loan::from).collect())
    }

    async fn find_all(
        con: &mut PgConnection,
        active_only: bool,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        let rows = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, borrower_id, item_id, borrowed_at, returned_at
            FROM loans
            WHERE NOT $1 OR returned_at IS NULL
            ORDER BY borrowed_at, id
            "#,
        )
        .bind(active_only)
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Loan::from).collect())
    }

    async fn create(con: &mut PgConnection, loan: &Loan) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO loans (id, borrower_id, item_id, borrowed_at, returned_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(loan.id().as_ref())
        .bind(loan.borrower_id().as_ref())
        .bind(loan.item_id().as_ref())
        .bind(loan.borrowed_at().as_ref())
        .bind(loan.returned_at().as_ref().map(|at| *at.as_ref()))
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn close(
        con: &mut PgConnection,
        id: &LoanId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<Loan, KernelError> {
        let row = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            UPDATE loans
            SET returned_at = $2
            WHERE id = $1 AND returned_at IS NULL
            RETURNING id, borrower_id, item_id, borrowed_at, returned_at
            "#,
        )
        .bind(id.as_ref())
        .bind(returned_at.as_ref())
        .fetch_optional(&mut *con)
        .await
        .convert_error()?;
        match row {
            Some(row) => Ok(Loan::from(row)),
            None => match Self::find_by_id(con, id).await? {
                Some(_) => Err(Report::new(KernelError::AlreadyReturned)),
                None => Err(Report::new(KernelError::LoanNotFound)),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::LoanQuery;
    use kernel::interface::update::{ItemModifier, LoanModifier};
    use kernel::prelude::entity::{
        BorrowedAt, BorrowerId, CreatedAt, Item, ItemAuthor, ItemId, ItemIsbn, ItemStock,
        ItemTitle, Loan, LoanId, ReturnedAt,
    };
    use kernel::KernelError;

    use crate::database::postgres::{
        PostgresDatabase, PostgresItemRepository, PostgresLoanRepository,
    };

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc().replace_nanosecond(0).unwrap()
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn open_and_close() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        let mut con = db.transact().await?;

        let item_id = ItemId::new(Uuid::new_v4());
        let item = Item::new(
            item_id.clone(),
            ItemTitle::new("title"),
            ItemAuthor::new("author"),
            ItemIsbn::new("isbn"),
            ItemStock::new(1),
            CreatedAt::new(now()),
        );
        PostgresItemRepository.create(&mut con, &item).await?;

        let borrower_id = BorrowerId::new(Uuid::new_v4());
        let loan = Loan::open(
            LoanId::new(Uuid::new_v4()),
            borrower_id.clone(),
            item_id.clone(),
            BorrowedAt::new(now()),
        );
        PostgresLoanRepository.create(&mut con, &loan).await?;

        assert!(
            PostgresLoanRepository
                .has_active(&mut con, &borrower_id, &item_id)
                .await?
        );
        let found = PostgresLoanRepository
            .find_active(&mut con, &borrower_id, &item_id)
            .await?;
        assert_eq!(found, Some(loan.clone()));

        let closed = PostgresLoanRepository
            .close(&mut con, loan.id(), &ReturnedAt::new(now()))
            .await?;
        assert!(!closed.is_active());

        let error = PostgresLoanRepository
            .close(&mut con, loan.id(), &ReturnedAt::new(now()))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::AlreadyReturned);

        let found = PostgresLoanRepository
            .find_by_borrower_id(&mut con, &borrower_id)
            .await?;
        assert_eq!(found, vec![closed]);

        con.roll_back().await?;
        Ok(())
    }
}
