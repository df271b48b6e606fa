use std::collections::HashMap;
use std::hash::Hash;

use kernel::interface::query::StatsQuery;
use kernel::prelude::entity::{
    BorrowerId, BorrowerLoanCount, ItemLoanCount, LedgerSummary, LoanCount, SelectLimit,
};
use kernel::KernelError;

use crate::database::memory::InMemoryTransaction;

pub struct InMemoryStatsRepository;

/// Counts per key, highest first, ties by key, at most `limit` entries.
fn rank<K, I>(keys: I, limit: &SelectLimit) -> Vec<(K, i64)>
where
    K: Eq + Hash + Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts = HashMap::<K, i64>::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut ranked = counts.into_iter().collect::<Vec<_>>();
    ranked.sort_by(|(a, left), (b, right)| right.cmp(left).then_with(|| a.cmp(b)));
    ranked.truncate(usize::try_from(*limit.as_ref()).unwrap_or(0));
    ranked
}

fn count<T>(values: impl Iterator<Item = T>) -> i64 {
    i64::try_from(values.count()).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl StatsQuery for InMemoryStatsRepository {
    type Transaction = InMemoryTransaction;

    async fn summarize(
        &self,
        con: &mut InMemoryTransaction,
    ) -> error_stack::Result<LedgerSummary, KernelError> {
        let (items, loans) = con.snapshot();
        let available = count(items.iter().filter(|item| item.is_available()));
        Ok(LedgerSummary::new(
            count(items.iter()),
            available,
            count(items.iter()) - available,
            count(loans.iter()),
            count(loans.iter().filter(|loan| loan.is_active())),
        ))
    }

    async fn find_top_items(
        &self,
        con: &mut InMemoryTransaction,
        limit: &SelectLimit,
    ) -> error_stack::Result<Vec<ItemLoanCount>, KernelError> {
        let (items, loans) = con.snapshot();
        let items = items
            .into_iter()
            .map(|item| (*item.id().as_ref(), item))
            .collect::<HashMap<_, _>>();
        let ranked = rank(loans.iter().map(|loan| *loan.item_id().as_ref()), limit);
        Ok(ranked
            .into_iter()
            .filter_map(|(id, loans)| {
                items.get(&id).map(|item| {
                    ItemLoanCount::new(
                        item.id().clone(),
                        item.title().clone(),
                        item.author().clone(),
                        LoanCount::new(loans),
                    )
                })
            })
            .collect())
    }

    async fn find_top_borrowers(
        &self,
        con: &mut InMemoryTransaction,
        limit: &SelectLimit,
    ) -> error_stack::Result<Vec<BorrowerLoanCount>, KernelError> {
        let loans = con.loans();
        let ranked = rank(loans.iter().map(|loan| *loan.borrower_id().as_ref()), limit);
        Ok(ranked
            .into_iter()
            .map(|(id, loans)| BorrowerLoanCount::new(BorrowerId::new(id), LoanCount::new(loans)))
            .collect())
    }
}
