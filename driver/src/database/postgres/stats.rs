use sqlx::PgConnection;
use uuid::Uuid;

use kernel::interface::query::StatsQuery;
use kernel::prelude::entity::{
    BorrowerId, BorrowerLoanCount, ItemAuthor, ItemId, ItemLoanCount, ItemTitle, LedgerSummary,
    LoanCount, SelectLimit,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresStatsRepository;

#[async_trait::async_trait]
impl StatsQuery for PostgresStatsRepository {
    type Transaction = PostgresTransaction;

    async fn summarize(
        &self,
        con: &mut PostgresTransaction,
    ) -> error_stack::Result<LedgerSummary, KernelError> {
        PgStatsInternal::summarize(con).await
    }

    async fn find_top_items(
        &self,
        con: &mut PostgresTransaction,
        limit: &SelectLimit,
    ) -> error_stack::Result<Vec<ItemLoanCount>, KernelError> {
        PgStatsInternal::find_top_items(con, limit).await
    }

    async fn find_top_borrowers(
        &self,
        con: &mut PostgresTransaction,
        limit: &SelectLimit,
    ) -> error_stack::Result<Vec<BorrowerLoanCount>, KernelError> {
        PgStatsInternal::find_top_borrowers(con, limit).await
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    total_items: i64,
    available_items: i64,
    unavailable_items: i64,
    total_loans: i64,
    active_loans: i64,
}

impl From<SummaryRow> for LedgerSummary {
    fn from(value: SummaryRow) -> Self {
        LedgerSummary::new(
            value.total_items,
            value.available_items,
            value.unavailable_items,
            value.total_loans,
            value.active_loans,
        )
    }
}

#[derive(sqlx::FromRow)]
struct TopItemRow {
    id: Uuid,
    title: String,
    author: String,
    loans: i64,
}

impl From<TopItemRow> for ItemLoanCount {
    fn from(value: TopItemRow) -> Self {
        ItemLoanCount::new(
            ItemId::new(value.id),
            ItemTitle::new(value.title),
            ItemAuthor::new(value.author),
            LoanCount::new(value.loans),
        )
    }
}

#[derive(sqlx::FromRow)]
struct TopBorrowerRow {
    borrower_id: Uuid,
    loans: i64,
}

impl From<TopBorrowerRow> for BorrowerLoanCount {
    fn from(value: TopBorrowerRow) -> Self {
        BorrowerLoanCount::new(BorrowerId::new(value.borrower_id), LoanCount::new(value.loans))
    }
}

pub(in crate::database) struct PgStatsInternal;

impl PgStatsInternal {
    // One statement, one snapshot: the counters cannot straddle a commit.
    async fn summarize(con: &mut PgConnection) -> error_stack::Result<LedgerSummary, KernelError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            // language=postgresql
            r#"
            SELECT
                (SELECT COUNT(*) FROM items) AS total_items,
                (SELECT COUNT(*) FROM items WHERE stock > 0) AS available_items,
                (SELECT COUNT(*) FROM items WHERE stock = 0) AS unavailable_items,
                (SELECT COUNT(*) FROM loans) AS total_loans,
                (SELECT COUNT(*) FROM loans WHERE returned_at IS NULL) AS active_loans
            "#,
        )
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(LedgerSummary::from(row))
    }

    async fn find_top_items(
        con: &mut PgConnection,
        limit: &SelectLimit,
    ) -> error_stack::Result<Vec<ItemLoanCount>, KernelError> {
        let rows = sqlx::query_as::<_, TopItemRow>(
            // language=postgresql
            r#"
            SELECT i.id, i.title, i.author, COUNT(l.id) AS loans
            FROM loans l
            JOIN items i ON i.id = l.item_id
            GROUP BY i.id, i.title, i.author
            ORDER BY loans DESC, i.id
            LIMIT $1
            "#,
        )
        .bind(limit.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(ItemLoanCount::from).collect())
    }

    async fn find_top_borrowers(
        con: &mut PgConnection,
        limit: &SelectLimit,
    ) -> error_stack::Result<Vec<BorrowerLoanCount>, KernelError> {
        let rows = sqlx::query_as::<_, TopBorrowerRow>(
            // language=postgresql
            r#"
            SELECT borrower_id, COUNT(*) AS loans
            FROM loans
            GROUP BY borrower_id
            ORDER BY loans DESC, borrower_id
            LIMIT $1
            "#,
        )
        .bind(limit.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(BorrowerLoanCount::from).collect())
    }
}
