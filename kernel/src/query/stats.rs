use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{BorrowerLoanCount, ItemLoanCount, LedgerSummary, SelectLimit};
use crate::KernelError;

/// Read-only reports over the catalog and the loan ledger. Only committed
/// loans are counted, returned ones included.
#[async_trait::async_trait]
pub trait StatsQuery: 'static + Sync + Send {
    type Transaction: Transaction;

    /// All counters come from a single read, so they agree with each other.
    async fn summarize(
        &self,
        con: &mut Self::Transaction,
    ) -> error_stack::Result<LedgerSummary, KernelError>;

    /// Items by loan count, highest first, ties broken by id.
    async fn find_top_items(
        &self,
        con: &mut Self::Transaction,
        limit: &SelectLimit,
    ) -> error_stack::Result<Vec<ItemLoanCount>, KernelError>;

    /// Borrowers by loan count, highest first, ties broken by id.
    async fn find_top_borrowers(
        &self,
        con: &mut Self::Transaction,
        limit: &SelectLimit,
    ) -> error_stack::Result<Vec<BorrowerLoanCount>, KernelError>;
}

pub trait DependOnStatsQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type StatsQuery: StatsQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn stats_query(&self) -> &Self::StatsQuery;
}
