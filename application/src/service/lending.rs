use error_stack::Report;
use time::OffsetDateTime;
use uuid::Uuid;

use kernel::interface::config::DependOnLendingConfig;
use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{DependOnItemQuery, DependOnLoanQuery, ItemQuery, LoanQuery};
use kernel::interface::update::{
    DependOnItemModifier, DependOnLoanModifier, ItemModifier, LoanModifier,
};
use kernel::prelude::entity::{BorrowedAt, BorrowerId, ItemId, Loan, LoanId, ReturnedAt};
use kernel::KernelError;

use crate::service::retry_on_conflict;
use crate::transfer::{BorrowDto, GetLoansFromBorrowerDto, LoanDto, ReturnByLoanIdDto, ReturnDto};

fn report_outcome(operation: &str, result: &error_stack::Result<Loan, KernelError>) {
    match result {
        Ok(loan) => tracing::info!(
            operation,
            loan_id = %loan.id().as_ref(),
            item_id = %loan.item_id().as_ref(),
            borrower_id = %loan.borrower_id().as_ref(),
            "loan committed"
        ),
        Err(report) if report.current_context().is_conflict() => {
            tracing::debug!(operation, reason = %report.current_context(), "request rejected")
        }
        Err(report) if report.current_context().is_not_found() => {
            tracing::debug!(operation, reason = %report.current_context(), "reference not found")
        }
        Err(_) => {}
    }
}

#[async_trait::async_trait]
pub trait BorrowService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnLendingConfig
    + DependOnItemQuery
    + DependOnItemModifier
    + DependOnLoanQuery
    + DependOnLoanModifier
{
    #[tracing::instrument(skip(self), level = "debug")]
    async fn borrow_item(&self, dto: BorrowDto) -> error_stack::Result<LoanDto, KernelError> {
        let borrower_id = BorrowerId::new(dto.borrower_id);
        let item_id = ItemId::new(dto.item_id);

        let result = retry_on_conflict(self.lending_config(), "borrow", || {
            borrow_once(self, &borrower_id, &item_id)
        })
        .await;
        report_outcome("borrow", &result);

        Ok(LoanDto::from(result?))
    }
}

impl<T> BorrowService for T where
    T: DependOnDatabaseConnection
        + DependOnLendingConfig
        + DependOnItemQuery
        + DependOnItemModifier
        + DependOnLoanQuery
        + DependOnLoanModifier
{
}

async fn borrow_once<T>(
    module: &T,
    borrower_id: &BorrowerId,
    item_id: &ItemId,
) -> error_stack::Result<Loan, KernelError>
where
    T: ?Sized
        + DependOnDatabaseConnection
        + DependOnItemQuery
        + DependOnItemModifier
        + DependOnLoanQuery
        + DependOnLoanModifier,
{
    let mut connection = module.database_connection().transact().await?;

    let item = module
        .item_query()
        .find_by_id_for_update(&mut connection, item_id)
        .await?
        .ok_or_else(|| Report::new(KernelError::ItemNotFound))?;
    if !item.is_available() {
        return Err(Report::new(KernelError::OutOfStock));
    }
    if module
        .loan_query()
        .has_active(&mut connection, borrower_id, item_id)
        .await?
    {
        return Err(Report::new(KernelError::AlreadyBorrowed));
    }

    module
        .item_modifier()
        .decrement_stock(&mut connection, item_id)
        .await?;
    let loan = Loan::open(
        LoanId::new(Uuid::new_v4()),
        borrower_id.clone(),
        item_id.clone(),
        BorrowedAt::new(OffsetDateTime::now_utc()),
    );
    module
        .loan_modifier()
        .create(&mut connection, &loan)
        .await?;

    connection.commit().await?;
    Ok(loan)
}

#[async_trait::async_trait]
pub trait ReturnService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnLendingConfig
    + DependOnItemQuery
    + DependOnItemModifier
    + DependOnLoanQuery
    + DependOnLoanModifier
{
    #[tracing::instrument(skip(self), level = "debug")]
    async fn return_by_borrower(&self, dto: ReturnDto) -> error_stack::Result<LoanDto, KernelError> {
        let borrower_id = BorrowerId::new(dto.borrower_id);
        let item_id = ItemId::new(dto.item_id);

        let result = retry_on_conflict(self.lending_config(), "return", || {
            return_by_borrower_once(self, &borrower_id, &item_id)
        })
        .await;
        report_outcome("return", &result);

        Ok(LoanDto::from(result?))
    }

    /// Privileged path: closes any loan by id without checking who borrowed it.
    #[tracing::instrument(skip(self), level = "debug")]
    async fn return_by_loan_id(
        &self,
        dto: ReturnByLoanIdDto,
    ) -> error_stack::Result<LoanDto, KernelError> {
        let loan_id = LoanId::new(dto.loan_id);

        let result = retry_on_conflict(self.lending_config(), "return_by_loan_id", || {
            return_by_loan_id_once(self, &loan_id)
        })
        .await;
        report_outcome("return_by_loan_id", &result);

        Ok(LoanDto::from(result?))
    }
}

impl<T> ReturnService for T where
    T: DependOnDatabaseConnection
        + DependOnLendingConfig
        + DependOnItemQuery
        + DependOnItemModifier
        + DependOnLoanQuery
        + DependOnLoanModifier
{
}

async fn return_by_borrower_once<T>(
    module: &T,
    borrower_id: &BorrowerId,
    item_id: &ItemId,
) -> error_stack::Result<Loan, KernelError>
where
    T: ?Sized
        + DependOnDatabaseConnection
        + DependOnItemQuery
        + DependOnItemModifier
        + DependOnLoanQuery
        + DependOnLoanModifier,
{
    let mut connection = module.database_connection().transact().await?;

    module
        .item_query()
        .find_by_id_for_update(&mut connection, item_id)
        .await?
        .ok_or_else(|| {
            Report::new(KernelError::NoActiveLoan).attach_printable("item does not exist")
        })?;
    let loan = module
        .loan_query()
        .find_active(&mut connection, borrower_id, item_id)
        .await?
        .ok_or_else(|| Report::new(KernelError::NoActiveLoan))?;

    let closed = close_and_restock(module, &mut connection, &loan).await?;

    connection.commit().await?;
    Ok(closed)
}

async fn return_by_loan_id_once<T>(
    module: &T,
    loan_id: &LoanId,
) -> error_stack::Result<Loan, KernelError>
where
    T: ?Sized
        + DependOnDatabaseConnection
        + DependOnItemQuery
        + DependOnItemModifier
        + DependOnLoanQuery
        + DependOnLoanModifier,
{
    let mut connection = module.database_connection().transact().await?;

    let loan = module
        .loan_query()
        .find_by_id(&mut connection, loan_id)
        .await?
        .ok_or_else(|| Report::new(KernelError::LoanNotFound))?;
    if !loan.is_active() {
        return Err(Report::new(KernelError::AlreadyReturned));
    }
    module
        .item_query()
        .find_by_id_for_update(&mut connection, loan.item_id())
        .await?
        .ok_or_else(|| {
            Report::new(KernelError::Internal)
                .attach_printable(format!("loan {} references a missing item", loan_id.as_ref()))
        })?;

    // `close` re-checks under the item lock; a concurrent return surfaces as AlreadyReturned.
    let closed = close_and_restock(module, &mut connection, &loan).await?;

    connection.commit().await?;
    Ok(closed)
}

async fn close_and_restock<T>(
    module: &T,
    connection: &mut <T::DatabaseConnection as DatabaseConnection>::Transaction,
    loan: &Loan,
) -> error_stack::Result<Loan, KernelError>
where
    T: ?Sized + DependOnDatabaseConnection + DependOnItemModifier + DependOnLoanModifier,
{
    let closed = module
        .loan_modifier()
        .close(
            connection,
            loan.id(),
            &ReturnedAt::new(OffsetDateTime::now_utc()),
        )
        .await?;
    module
        .item_modifier()
        .increment_stock(connection, loan.item_id())
        .await?;
    Ok(closed)
}

#[async_trait::async_trait]
pub trait GetLoanService:
    'static + Sync + Send + DependOnDatabaseConnection + DependOnLoanQuery
{
    async fn list_for_borrower(
        &self,
        dto: GetLoansFromBorrowerDto,
    ) -> error_stack::Result<Vec<LoanDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let borrower_id = BorrowerId::new(dto.borrower_id);
        let loans = self
            .loan_query()
            .find_by_borrower_id(&mut connection, &borrower_id)
            .await?;

        Ok(loans.into_iter().map(LoanDto::from).collect())
    }

    async fn list_all(&self) -> error_stack::Result<Vec<LoanDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let loans = self.loan_query().find_all(&mut connection).await?;
        Ok(loans.into_iter().map(LoanDto::from).collect())
    }

    async fn list_active(&self) -> error_stack::Result<Vec<LoanDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let loans = self.loan_query().find_all_active(&mut connection).await?;
        Ok(loans.into_iter().map(LoanDto::from).collect())
    }
}

impl<T> GetLoanService for T where T: DependOnDatabaseConnection + DependOnLoanQuery {}

#[cfg(test)]
mod test {
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use time::OffsetDateTime;
    use uuid::Uuid;

    use driver::database::{InMemoryDatabase, PostgresDatabase};
    use kernel::interface::config::LendingConfig;
    use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
    use kernel::interface::query::{DependOnItemQuery, ItemQuery};
    use kernel::prelude::entity::ItemId;
    use kernel::KernelError;

    use crate::service::{
        BorrowService, GetItemService, GetLoanService, RegisterItemService, ReturnService,
    };
    use crate::transfer::{
        BorrowDto, CreateItemDto, GetItemDto, GetLoansFromBorrowerDto, ReturnByLoanIdDto,
        ReturnDto,
    };

    async fn register<D: RegisterItemService>(db: &D, stock: i32) -> Uuid {
        db.register_item(CreateItemDto {
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            isbn: "9780441478125".to_string(),
            stock,
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .unwrap()
        .id
    }

    async fn stock_of<D: GetItemService>(db: &D, id: Uuid) -> i32 {
        db.get_item(GetItemDto { id }).await.unwrap().unwrap().stock
    }

    fn borrow(borrower_id: Uuid, item_id: Uuid) -> BorrowDto {
        BorrowDto {
            borrower_id,
            item_id,
        }
    }

    fn give_back(borrower_id: Uuid, item_id: Uuid) -> ReturnDto {
        ReturnDto {
            borrower_id,
            item_id,
        }
    }

    #[tokio::test]
    async fn borrow_takes_one_copy() {
        let db = InMemoryDatabase::new();
        let item = register(&db, 3).await;
        let user = Uuid::new_v4();

        let loan = db.borrow_item(borrow(user, item)).await.unwrap();
        assert!(loan.is_active());
        assert_eq!(loan.borrower_id, user);
        assert_eq!(loan.item_id, item);
        assert_eq!(stock_of(&db, item).await, 2);
    }

    #[tokio::test]
    async fn borrow_out_of_stock() {
        let db = InMemoryDatabase::new();
        let item = register(&db, 0).await;

        let error = db
            .borrow_item(borrow(Uuid::new_v4(), item))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::OutOfStock);
        assert_eq!(stock_of(&db, item).await, 0);
        assert!(db.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn borrow_unknown_item() {
        let db = InMemoryDatabase::new();
        let error = db
            .borrow_item(borrow(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::ItemNotFound);
    }

    #[tokio::test]
    async fn borrow_twice_is_rejected() {
        let db = InMemoryDatabase::new();
        let item = register(&db, 3).await;
        let user = Uuid::new_v4();

        db.borrow_item(borrow(user, item)).await.unwrap();
        let error = db.borrow_item(borrow(user, item)).await.unwrap_err();
        assert_eq!(error.current_context(), &KernelError::AlreadyBorrowed);
        assert_eq!(stock_of(&db, item).await, 2);
        assert_eq!(db.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn return_without_loan() {
        let db = InMemoryDatabase::new();
        let item = register(&db, 3).await;

        let error = db
            .return_by_borrower(give_back(Uuid::new_v4(), item))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::NoActiveLoan);
        assert_eq!(stock_of(&db, item).await, 3);

        let error = db
            .return_by_borrower(give_back(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::NoActiveLoan);
    }

    #[tokio::test]
    async fn borrow_then_return_restores_stock() {
        let db = InMemoryDatabase::new();
        let item = register(&db, 2).await;
        let user = Uuid::new_v4();

        let borrowed = db.borrow_item(borrow(user, item)).await.unwrap();
        let returned = db.return_by_borrower(give_back(user, item)).await.unwrap();
        assert_eq!(returned.returned_at.map(|at| at.nanosecond() % 1_000), Some(0));

        assert_eq!(borrowed.id, returned.id);
        assert!(!returned.is_active());
        assert!(returned.returned_at.unwrap() >= returned.borrowed_at);
        assert_eq!(stock_of(&db, item).await, 2);

        let loans = db
            .list_for_borrower(GetLoansFromBorrowerDto { borrower_id: user })
            .await
            .unwrap();
        assert_eq!(loans, vec![returned]);
        assert!(db.list_active().await.unwrap().is_empty());

        // The pair may borrow again once the previous loan is closed.
        db.borrow_item(borrow(user, item)).await.unwrap();
        assert_eq!(db.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn return_by_loan_id_once_only() {
        let db = InMemoryDatabase::new();
        let item = register(&db, 1).await;
        let loan = db
            .borrow_item(borrow(Uuid::new_v4(), item))
            .await
            .unwrap();

        let closed = db
            .return_by_loan_id(ReturnByLoanIdDto { loan_id: loan.id })
            .await
            .unwrap();
        assert!(!closed.is_active());
        assert_eq!(stock_of(&db, item).await, 1);

        let error = db
            .return_by_loan_id(ReturnByLoanIdDto { loan_id: loan.id })
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::AlreadyReturned);
        assert_eq!(stock_of(&db, item).await, 1);
        assert_eq!(db.list_all().await.unwrap(), vec![closed]);
    }

    #[tokio::test]
    async fn return_by_unknown_loan_id() {
        let db = InMemoryDatabase::new();
        let error = db
            .return_by_loan_id(ReturnByLoanIdDto {
                loan_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::LoanNotFound);
    }

    async fn race_for_last_copy<D>(db: D)
    where
        D: Clone + BorrowService + RegisterItemService + GetItemService + GetLoanService,
    {
        let item = register(&db, 1).await;

        let tasks = (0..16)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { db.borrow_item(borrow(Uuid::new_v4(), item)).await })
            })
            .collect::<Vec<_>>();

        let mut granted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => granted += 1,
                Err(error) => assert_eq!(error.current_context(), &KernelError::OutOfStock),
            }
        }
        assert_eq!(granted, 1);
        assert_eq!(stock_of(&db, item).await, 0);
        let loans = db.list_all().await.unwrap();
        assert_eq!(loans.iter().filter(|loan| loan.item_id == item).count(), 1);
    }

    async fn racing_returns_close_once<D>(db: D)
    where
        D: Clone
            + BorrowService
            + ReturnService
            + RegisterItemService
            + GetItemService
            + GetLoanService,
    {
        for _ in 0..8 {
            let item = register(&db, 1).await;
            let user = Uuid::new_v4();
            let loan = db.borrow_item(borrow(user, item)).await.unwrap();

            let by_id = {
                let db = db.clone();
                tokio::spawn(async move {
                    db.return_by_loan_id(ReturnByLoanIdDto { loan_id: loan.id })
                        .await
                })
            };
            let by_borrower = {
                let db = db.clone();
                tokio::spawn(async move { db.return_by_borrower(give_back(user, item)).await })
            };
            let results = [by_id.await.unwrap(), by_borrower.await.unwrap()];

            assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
            for error in results.iter().filter_map(|result| result.as_ref().err()) {
                assert!(matches!(
                    error.current_context(),
                    KernelError::AlreadyReturned | KernelError::NoActiveLoan
                ));
            }
            assert_eq!(stock_of(&db, item).await, 1);
            let loans = db
                .list_for_borrower(GetLoansFromBorrowerDto { borrower_id: user })
                .await
                .unwrap();
            assert_eq!(loans.len(), 1);
            assert!(!loans[0].is_active());
        }
    }

    async fn gives_up_while_item_is_locked<D>(db: D)
    where
        D: BorrowService + RegisterItemService + GetItemService,
    {
        let item = register(&db, 1).await;

        let mut holder = db.database_connection().transact().await.unwrap();
        db.item_query()
            .find_by_id_for_update(&mut holder, &ItemId::new(item))
            .await
            .unwrap();

        let error = db
            .borrow_item(borrow(Uuid::new_v4(), item))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Concurrency);
        assert_eq!(stock_of(&db, item).await, 1);

        holder.roll_back().await.unwrap();
        db.borrow_item(borrow(Uuid::new_v4(), item)).await.unwrap();
        assert_eq!(stock_of(&db, item).await, 0);
    }

    fn impatient() -> (Duration, LendingConfig) {
        (
            Duration::from_millis(50),
            LendingConfig::new(2, Duration::from_millis(1)),
        )
    }

    async fn postgres(lock_timeout: Duration, config: LendingConfig) -> PostgresDatabase {
        let url = std::env::var("POSTGRES_URL").unwrap();
        PostgresDatabase::connect(&url, lock_timeout, config)
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn last_copy_goes_to_exactly_one_borrower() {
        race_for_last_copy(InMemoryDatabase::new()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_returns_close_the_loan_once() {
        racing_returns_close_once(InMemoryDatabase::new()).await;
    }

    #[tokio::test]
    async fn gives_up_while_item_is_locked_in_memory() {
        let (lock_timeout, config) = impatient();
        gives_up_while_item_is_locked(InMemoryDatabase::with_config(config, lock_timeout)).await;
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn postgres_last_copy_goes_to_exactly_one_borrower() {
        race_for_last_copy(PostgresDatabase::new().await.unwrap()).await;
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn postgres_concurrent_returns_close_the_loan_once() {
        racing_returns_close_once(PostgresDatabase::new().await.unwrap()).await;
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn postgres_gives_up_after_lock_timeout() {
        let (lock_timeout, config) = impatient();
        gives_up_while_item_is_locked(postgres(lock_timeout, config).await).await;
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn postgres_stamps_survive_a_round_trip() {
        let db = PostgresDatabase::new().await.unwrap();
        stamps_survive_a_round_trip(db).await;
    }

    async fn stamps_survive_a_round_trip<D>(db: D)
    where
        D: BorrowService + ReturnService + RegisterItemService + GetLoanService,
    {
        let item = register(&db, 1).await;
        let user = Uuid::new_v4();

        let borrowed = db.borrow_item(borrow(user, item)).await.unwrap();
        assert_eq!(borrowed.borrowed_at.nanosecond() % 1_000, 0);
        let listed = db
            .list_for_borrower(GetLoansFromBorrowerDto { borrower_id: user })
            .await
            .unwrap();
        assert_eq!(listed, vec![borrowed]);

        let returned = db.return_by_borrower(give_back(user, item)).await.unwrap();
        assert_eq!(returned.returned_at.map(|at| at.nanosecond() % 1_000), Some(0));
        let listed = db
            .list_for_borrower(GetLoansFromBorrowerDto { borrower_id: user })
            .await
            .unwrap();
        assert_eq!(listed, vec![returned]);
    }

    #[tokio::test]
    async fn stamps_keep_storage_precision() {
        stamps_survive_a_round_trip(InMemoryDatabase::new()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn random_interleavings_keep_the_books_balanced() {
        let db = InMemoryDatabase::new();
        let mut owned = HashMap::new();
        for stock in [1, 2, 3] {
            owned.insert(register(&db, stock).await, stock);
        }
        let items = owned.keys().copied().collect::<Vec<_>>();
        let borrowers = (0..4).map(|_| Uuid::new_v4()).collect::<Vec<_>>();

        let tasks = (0..8u64)
            .map(|seed| {
                let db = db.clone();
                let items = items.clone();
                let borrowers = borrowers.clone();
                tokio::spawn(async move {
                    let mut rng = StdRng::seed_from_u64(seed);
                    for _ in 0..40 {
                        let item = items[rng.gen_range(0..items.len())];
                        let user = borrowers[rng.gen_range(0..borrowers.len())];
                        let result = if rng.gen_bool(0.6) {
                            db.borrow_item(borrow(user, item)).await
                        } else {
                            db.return_by_borrower(give_back(user, item)).await
                        };
                        if let Err(error) = result {
                            assert!(error.current_context().is_conflict(), "{error:?}");
                        }
                    }
                })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await.unwrap();
        }

        let active = db.list_active().await.unwrap();
        let mut pairs = HashSet::new();
        for loan in &active {
            assert!(pairs.insert((loan.borrower_id, loan.item_id)));
        }
        for (item, owned) in owned {
            let lent = active.iter().filter(|loan| loan.item_id == item).count() as i32;
            assert_eq!(stock_of(&db, item).await + lent, owned);
        }
    }
}
