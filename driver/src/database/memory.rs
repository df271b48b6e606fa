use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use error_stack::Report;
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};

use kernel::interface::config::{DependOnLendingConfig, LendingConfig};
use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{DependOnItemQuery, DependOnLoanQuery, DependOnStatsQuery};
use kernel::interface::update::{DependOnItemModifier, DependOnLoanModifier};
use kernel::prelude::entity::{Item, ItemId, Loan, LoanId};
use kernel::KernelError;

pub use self::{item::*, loan::*, stats::*};

mod item;
mod loan;
mod stats;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Process-local storage with the same isolation the PostgreSQL backend gives:
/// per-item locks, read-your-own-writes inside a transaction, and nothing
/// visible to others until commit.
#[derive(Clone)]
pub struct InMemoryDatabase {
    store: Arc<Store>,
    config: LendingConfig,
}

struct Store {
    committed: RwLock<Ledger>,
    locks: DashMap<ItemId, Arc<Mutex<()>>>,
    lock_timeout: Duration,
}

#[derive(Default)]
struct Ledger {
    items: HashMap<ItemId, Item>,
    loans: Vec<Loan>,
    index: HashMap<LoanId, usize>,
}

impl Ledger {
    fn upsert_loan(&mut self, loan: Loan) {
        match self.index.get(loan.id()) {
            Some(&position) => self.loans[position] = loan,
            None => {
                self.index.insert(loan.id().clone(), self.loans.len());
                self.loans.push(loan);
            }
        }
    }
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::with_config(LendingConfig::default(), DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_config(config: LendingConfig, lock_timeout: Duration) -> Self {
        Self {
            store: Arc::new(Store {
                committed: RwLock::new(Ledger::default()),
                locks: DashMap::new(),
                lock_timeout,
            }),
            config,
        }
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for InMemoryDatabase {
    type Transaction = InMemoryTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        Ok(InMemoryTransaction {
            store: Arc::clone(&self.store),
            guards: HashMap::new(),
            items: HashMap::new(),
            loans: Vec::new(),
        })
    }
}

/// Staged changes plus the item locks taken so far. Dropping it releases the
/// locks and forgets the changes.
pub struct InMemoryTransaction {
    store: Arc<Store>,
    guards: HashMap<ItemId, OwnedMutexGuard<()>>,
    items: HashMap<ItemId, Item>,
    loans: Vec<Loan>,
}

impl InMemoryTransaction {
    pub(in crate::database) async fn lock(
        &mut self,
        id: &ItemId,
    ) -> error_stack::Result<(), KernelError> {
        if self.guards.contains_key(id) {
            return Ok(());
        }
        let mutex = self.store.locks.entry(id.clone()).or_default().clone();
        let guard = tokio::time::timeout(self.store.lock_timeout, mutex.lock_owned())
            .await
            .map_err(|elapsed| {
                Report::new(elapsed)
                    .change_context(KernelError::Concurrency)
                    .attach_printable(format!("lock wait for item {} expired", id.as_ref()))
            })?;
        self.guards.insert(id.clone(), guard);
        Ok(())
    }

    pub(in crate::database) fn item(&self, id: &ItemId) -> Option<Item> {
        self.items
            .get(id)
            .cloned()
            .or_else(|| self.store.committed.read().items.get(id).cloned())
    }

    pub(in crate::database) fn items(&self) -> Vec<Item> {
        self.merged_items(&self.store.committed.read())
    }

    fn merged_items(&self, ledger: &Ledger) -> Vec<Item> {
        let mut items = ledger
            .items
            .values()
            .map(|item| self.items.get(item.id()).unwrap_or(item).clone())
            .collect::<Vec<_>>();
        items.extend(
            self.items
                .values()
                .filter(|item| !ledger.items.contains_key(item.id()))
                .cloned(),
        );
        items.sort_by_key(|item| *item.created_at().as_ref());
        items
    }

    pub(in crate::database) fn stage_item(&mut self, item: Item) {
        self.items.insert(item.id().clone(), item);
    }

    pub(in crate::database) fn loans(&self) -> Vec<Loan> {
        self.merged_loans(&self.store.committed.read())
    }

    fn merged_loans(&self, ledger: &Ledger) -> Vec<Loan> {
        let mut loans = ledger
            .loans
            .iter()
            .map(|loan| self.staged_loan(loan.id()).unwrap_or(loan).clone())
            .collect::<Vec<_>>();
        loans.extend(
            self.loans
                .iter()
                .filter(|loan| !ledger.index.contains_key(loan.id()))
                .cloned(),
        );
        loans.sort_by_key(|loan| *loan.borrowed_at().as_ref());
        loans
    }

    /// Items and loans seen under one read guard, so no commit lands between them.
    pub(in crate::database) fn snapshot(&self) -> (Vec<Item>, Vec<Loan>) {
        let ledger = self.store.committed.read();
        (self.merged_items(&ledger), self.merged_loans(&ledger))
    }

    pub(in crate::database) fn loan(&self, id: &LoanId) -> Option<Loan> {
        self.staged_loan(id).cloned().or_else(|| {
            let ledger = self.store.committed.read();
            ledger
                .index
                .get(id)
                .map(|&position| ledger.loans[position].clone())
        })
    }

    pub(in crate::database) fn stage_loan(&mut self, loan: Loan) {
        match self.loans.iter_mut().find(|staged| staged.id() == loan.id()) {
            Some(staged) => *staged = loan,
            None => self.loans.push(loan),
        }
    }

    fn staged_loan(&self, id: &LoanId) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.id() == id)
    }

    fn apply(self) {
        let mut ledger = self.store.committed.write();
        ledger.items.extend(self.items);
        self.loans
            .into_iter()
            .for_each(|loan| ledger.upsert_loan(loan));
    }
}

#[async_trait::async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.apply();
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

impl DependOnLendingConfig for InMemoryDatabase {
    fn lending_config(&self) -> &LendingConfig {
        &self.config
    }
}

impl DependOnItemQuery for InMemoryDatabase {
    type ItemQuery = InMemoryItemRepository;
    fn item_query(&self) -> &Self::ItemQuery {
        &InMemoryItemRepository
    }
}

impl DependOnItemModifier for InMemoryDatabase {
    type ItemModifier = InMemoryItemRepository;
    fn item_modifier(&self) -> &Self::ItemModifier {
        &InMemoryItemRepository
    }
}

impl DependOnLoanQuery for InMemoryDatabase {
    type LoanQuery = InMemoryLoanRepository;
    fn loan_query(&self) -> &Self::LoanQuery {
        &InMemoryLoanRepository
    }
}

impl DependOnLoanModifier for InMemoryDatabase {
    type LoanModifier = InMemoryLoanRepository;
    fn loan_modifier(&self) -> &Self::LoanModifier {
        &InMemoryLoanRepository
    }
}

impl DependOnStatsQuery for InMemoryDatabase {
    type StatsQuery = InMemoryStatsRepository;
    fn stats_query(&self) -> &Self::StatsQuery {
        &InMemoryStatsRepository
    }
}
