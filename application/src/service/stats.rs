use error_stack::Report;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection};
use kernel::interface::query::{DependOnStatsQuery, StatsQuery};
use kernel::prelude::entity::SelectLimit;
use kernel::KernelError;

use crate::transfer::{GetTopDto, StatsDto, TopBorrowerDto, TopItemDto};

fn limit_of(dto: &GetTopDto) -> error_stack::Result<SelectLimit, KernelError> {
    let limit = SelectLimit::new(dto.limit);
    if !limit.is_valid() {
        return Err(Report::new(KernelError::InvalidArgument)
            .attach_printable(format!("limit must be positive, got {}", dto.limit)));
    }
    Ok(limit)
}

#[async_trait::async_trait]
pub trait GetStatsService:
    'static + Sync + Send + DependOnDatabaseConnection + DependOnStatsQuery
{
    async fn get_stats(&self) -> error_stack::Result<StatsDto, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let summary = self.stats_query().summarize(&mut connection).await?;
        Ok(StatsDto::from(summary))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn get_top_items(
        &self,
        dto: GetTopDto,
    ) -> error_stack::Result<Vec<TopItemDto>, KernelError> {
        let limit = limit_of(&dto)?;
        let mut connection = self.database_connection().transact().await?;
        let ranked = self
            .stats_query()
            .find_top_items(&mut connection, &limit)
            .await?;
        Ok(ranked.into_iter().map(TopItemDto::from).collect())
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn get_top_borrowers(
        &self,
        dto: GetTopDto,
    ) -> error_stack::Result<Vec<TopBorrowerDto>, KernelError> {
        let limit = limit_of(&dto)?;
        let mut connection = self.database_connection().transact().await?;
        let ranked = self
            .stats_query()
            .find_top_borrowers(&mut connection, &limit)
            .await?;
        Ok(ranked.into_iter().map(TopBorrowerDto::from).collect())
    }
}

impl<T> GetStatsService for T where T: DependOnDatabaseConnection + DependOnStatsQuery {}
