use std::ops::{Deref, DerefMut};
use std::time::Duration;

use error_stack::{Report, ResultExt};
use sqlx::{Error, PgConnection, Pool, Postgres};

use kernel::interface::config::{DependOnLendingConfig, LendingConfig};
use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{DependOnItemQuery, DependOnLoanQuery, DependOnStatsQuery};
use kernel::interface::update::{DependOnItemModifier, DependOnLoanModifier};
use kernel::KernelError;

use crate::config::{lending_config, lock_timeout};
use crate::env;
use crate::error::ConvertError;

pub use self::{item::*, loan::*, stats::*};

mod item;
mod loan;
mod stats;

static POSTGRES_URL: &str = "POSTGRES_URL";

// SQLSTATE codes that mean "another unit got there first, try again".
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
    lock_timeout: Duration,
    config: LendingConfig,
}

impl PostgresDatabase {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        let url = env(POSTGRES_URL)?;
        Self::connect(&url, lock_timeout()?, lending_config()?).await
    }

    pub async fn connect(
        url: &str,
        lock_timeout: Duration,
        config: LendingConfig,
    ) -> error_stack::Result<Self, KernelError> {
        let pool = Pool::connect(url).await.convert_error()?;
        sqlx::migrate!()
            .run(&pool)
            .await
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable_lazy(|| "Failed to apply migrations")?;
        tracing::info!(?lock_timeout, ?config, "connected to postgres");
        Ok(Self {
            pool,
            lock_timeout,
            config,
        })
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let mut tx = self.pool.begin().await.convert_error()?;
        let statement = format!("SET LOCAL lock_timeout = {}", self.lock_timeout.as_millis());
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .convert_error()?;
        Ok(PostgresTransaction(tx))
    }
}

pub struct PostgresTransaction(sqlx::Transaction<'static, Postgres>);

#[async_trait::async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl Deref for PostgresTransaction {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PostgresTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl DependOnLendingConfig for PostgresDatabase {
    fn lending_config(&self) -> &LendingConfig {
        &self.config
    }
}

impl DependOnItemQuery for PostgresDatabase {
    type ItemQuery = PostgresItemRepository;
    fn item_query(&self) -> &Self::ItemQuery {
        &PostgresItemRepository
    }
}

impl DependOnItemModifier for PostgresDatabase {
    type ItemModifier = PostgresItemRepository;
    fn item_modifier(&self) -> &Self::ItemModifier {
        &PostgresItemRepository
    }
}

impl DependOnLoanQuery for PostgresDatabase {
    type LoanQuery = PostgresLoanRepository;
    fn loan_query(&self) -> &Self::LoanQuery {
        &PostgresLoanRepository
    }
}

impl DependOnLoanModifier for PostgresDatabase {
    type LoanModifier = PostgresLoanRepository;
    fn loan_modifier(&self) -> &Self::LoanModifier {
        &PostgresLoanRepository
    }
}

impl DependOnStatsQuery for PostgresDatabase {
    type StatsQuery = PostgresStatsRepository;
    fn stats_query(&self) -> &Self::StatsQuery {
        &PostgresStatsRepository
    }
}

impl<T> ConvertError for Result<T, Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| {
            let context = match &error {
                Error::PoolTimedOut => KernelError::Timeout,
                Error::Database(db) => match db.code().as_deref() {
                    Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | LOCK_NOT_AVAILABLE) => {
                        KernelError::Concurrency
                    }
                    Some(UNIQUE_VIOLATION) => KernelError::Concurrency,
                    _ => KernelError::Internal,
                },
                _ => KernelError::Internal,
            };
            Report::from(error).change_context(context)
        })
    }
}
