//! Combines the balance and the monthly series into one view of the dashboard.
//!
//! The dashboard runs two queries against the statement source: one for the
//! transaction list, which feeds the charts, and one for the balance. Each
//! query keeps its own loading and error state, and [Dashboard::view]
//! merges them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    balance::{Balance, calculate_balance},
    dashboard::aggregation::{
        MonthlyData, MonthlyIncomeOutcome, evolution_series, income_outcome_series,
    },
    statement::StatementSource,
    transaction::{AccountId, Transaction},
};

/// Everything the dashboard widgets need to render.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// The current balance, once the balance query has succeeded.
    pub balance: Option<Balance>,
    /// The balance evolution chart. Empty until the statement has loaded.
    pub evolution: Vec<MonthlyData>,
    /// The income versus outcome chart. Empty until the statement has loaded.
    pub income_outcome: Vec<MonthlyIncomeOutcome>,
    /// Whether either query is still running.
    pub loading: bool,
    /// The statement query's error, or else the balance query's error.
    pub error: Option<Arc<Error>>,
}

#[derive(Debug)]
enum QueryState<T> {
    /// The query has not run.
    Idle,
    Loading,
    Ready(T),
    Failed(Arc<Error>),
}

impl<T> QueryState<T> {
    fn from_result(result: Result<T, Error>) -> Self {
        match result {
            Ok(data) => QueryState::Ready(data),
            Err(error) => QueryState::Failed(Arc::new(error)),
        }
    }

    fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    fn data(&self) -> Option<&T> {
        match self {
            QueryState::Ready(data) => Some(data),
            _ => None,
        }
    }

    fn error(&self) -> Option<&Arc<Error>> {
        match self {
            QueryState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Queries {
    statement: QueryState<Vec<Transaction>>,
    balance: QueryState<Balance>,
}

/// The data behind the dashboard of one account.
///
/// Without an account both queries are disabled: [Dashboard::refetch] does
/// nothing and the view stays empty.
#[derive(Debug)]
pub struct Dashboard<S> {
    source: S,
    account_id: Option<AccountId>,
    local_offset: UtcOffset,
    queries: Mutex<Queries>,
}

impl<S: StatementSource> Dashboard<S> {
    /// Create a dashboard that has not fetched anything yet.
    ///
    /// `local_offset` decides which calendar month a transaction falls in.
    pub fn new(source: S, account_id: Option<AccountId>, local_offset: UtcOffset) -> Self {
        Self {
            source,
            account_id,
            local_offset,
            queries: Mutex::new(Queries {
                statement: QueryState::Idle,
                balance: QueryState::Idle,
            }),
        }
    }

    /// Fetch everything for `account_id` once and return the resulting view.
    pub async fn load(source: S, account_id: AccountId, local_offset: UtcOffset) -> DashboardView {
        let dashboard = Self::new(source, Some(account_id), local_offset);
        dashboard.refetch().await;
        dashboard.view()
    }

    /// Run both queries again, replacing any earlier results.
    ///
    /// The queries run concurrently and are marked as loading until they
    /// finish. Failures are kept in the query state rather than returned.
    pub async fn refetch(&self) {
        let Some(account_id) = &self.account_id else {
            return;
        };

        {
            let mut queries = self.lock_queries();
            queries.statement = QueryState::Loading;
            queries.balance = QueryState::Loading;
        }

        let (statement, balance) = tokio::join!(
            self.source.fetch_statement(account_id),
            self.fetch_balance(account_id)
        );

        let mut queries = self.lock_queries();
        queries.statement = QueryState::from_result(statement);
        queries.balance = QueryState::from_result(balance);
    }

    /// The dashboard as of the current time in the local offset.
    pub fn view(&self) -> DashboardView {
        self.view_at(OffsetDateTime::now_utc().to_offset(self.local_offset))
    }

    /// The dashboard with `now` as the end of the chart window.
    pub fn view_at(&self, now: OffsetDateTime) -> DashboardView {
        let queries = self.lock_queries();

        let (evolution, income_outcome) = match queries.statement.data() {
            Some(transactions) => (
                evolution_series(transactions, now),
                income_outcome_series(transactions, now),
            ),
            None => (Vec::new(), Vec::new()),
        };

        DashboardView {
            balance: queries.balance.data().cloned(),
            evolution,
            income_outcome,
            loading: queries.statement.is_loading() || queries.balance.is_loading(),
            error: queries
                .statement
                .error()
                .or_else(|| queries.balance.error())
                .cloned(),
        }
    }

    async fn fetch_balance(&self, account_id: &AccountId) -> Result<Balance, Error> {
        let transactions = self.source.fetch_statement(account_id).await?;

        Ok(calculate_balance(&transactions, None))
    }

    // The queries only hold plain data, so a panic elsewhere cannot leave
    // them half updated.
    fn lock_queries(&self) -> MutexGuard<'_, Queries> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU16, AtomicUsize, Ordering},
    };

    use time::{OffsetDateTime, UtcOffset, macros::datetime};
    use tokio::sync::Semaphore;

    use crate::{
        Error,
        balance::Balance,
        dashboard::facade::{Dashboard, QueryState},
        statement::StatementSource,
        transaction::{AccountId, Transaction, TransactionKind},
    };

    const NOW: OffsetDateTime = datetime!(2024-06-15 12:00 UTC);

    /// Returns the same statement for every request, or fails with
    /// `fail_with_status` when it is not zero.
    struct FakeSource {
        transactions: Vec<Transaction>,
        fail_with_status: AtomicU16,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn with(transactions: Vec<Transaction>) -> Self {
            Self {
                transactions,
                fail_with_status: AtomicU16::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                transactions: Vec::new(),
                fail_with_status: AtomicU16::new(status),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl StatementSource for FakeSource {
        async fn fetch_statement(&self, _: &AccountId) -> Result<Vec<Transaction>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            match self.fail_with_status.load(Ordering::SeqCst) {
                0 => Ok(self.transactions.clone()),
                status => Err(Error::StatementStatus(status)),
            }
        }
    }

    /// Holds every request until a permit is released.
    struct GatedSource {
        gate: Arc<Semaphore>,
    }

    impl StatementSource for GatedSource {
        async fn fetch_statement(&self, _: &AccountId) -> Result<Vec<Transaction>, Error> {
            let _permit = self.gate.acquire().await.unwrap();
            Ok(Vec::new())
        }
    }

    fn create_test_transaction(kind: TransactionKind, value: f64) -> Transaction {
        Transaction::new(
            "t",
            AccountId::new("acc"),
            kind,
            value,
            datetime!(2024-06-01 0:00 UTC),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn view_combines_balance_and_series() {
        let source = FakeSource::with(vec![
            create_test_transaction(TransactionKind::Credit, 100.0),
            create_test_transaction(TransactionKind::Debit, -40.0),
        ]);
        let dashboard = Dashboard::new(source, Some(AccountId::new("acc")), UtcOffset::UTC);

        dashboard.refetch().await;
        let view = dashboard.view_at(NOW);

        assert_eq!(
            view.balance,
            Some(Balance {
                value: 60.0,
                yield_percentage: 3.0
            })
        );
        assert_eq!(view.evolution.len(), 6);
        assert_eq!(view.income_outcome.len(), 6);
        assert_eq!(view.income_outcome[5].income, 100.0);
        assert!((view.income_outcome[5].outcome - 40.0).abs() < 1e-9);
        assert!(!view.loading);
        assert!(view.error.is_none());
        // One request for the statement and one for the balance.
        assert_eq!(dashboard.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn view_before_fetch_is_empty() {
        let dashboard = Dashboard::new(
            FakeSource::with(Vec::new()),
            Some(AccountId::new("acc")),
            UtcOffset::UTC,
        );

        let view = dashboard.view_at(NOW);

        assert!(view.balance.is_none());
        assert!(view.evolution.is_empty());
        assert!(view.income_outcome.is_empty());
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn without_account_nothing_is_fetched() {
        let dashboard = Dashboard::new(FakeSource::with(Vec::new()), None, UtcOffset::UTC);

        dashboard.refetch().await;
        let view = dashboard.view_at(NOW);

        assert_eq!(dashboard.source.calls.load(Ordering::SeqCst), 0);
        assert!(view.balance.is_none());
        assert!(view.evolution.is_empty());
        assert!(!view.loading);
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn empty_statement_still_fills_six_months() {
        let view = Dashboard::load(
            FakeSource::with(Vec::new()),
            AccountId::new("acc"),
            UtcOffset::UTC,
        )
        .await;

        assert_eq!(view.evolution.len(), 6);
        assert!(view.evolution.iter().all(|point| point.value == 50.0));
        assert_eq!(view.balance.map(|balance| balance.value), Some(0.0));
    }

    #[tokio::test]
    async fn failures_are_reported_in_view() {
        let view = Dashboard::load(FakeSource::failing(503), AccountId::new("acc"), UtcOffset::UTC)
            .await;

        assert_eq!(view.error.as_deref(), Some(&Error::StatementStatus(503)));
        assert!(view.balance.is_none());
        assert!(view.evolution.is_empty());
        assert!(!view.loading);
    }

    #[test]
    fn statement_error_takes_precedence() {
        let dashboard = Dashboard::new(
            FakeSource::with(Vec::new()),
            Some(AccountId::new("acc")),
            UtcOffset::UTC,
        );

        {
            let mut queries = dashboard.lock_queries();
            queries.statement = QueryState::Failed(Arc::new(Error::StatementStatus(500)));
            queries.balance = QueryState::Failed(Arc::new(Error::StatementStatus(404)));
        }
        assert_eq!(
            dashboard.view_at(NOW).error.as_deref(),
            Some(&Error::StatementStatus(500))
        );

        {
            let mut queries = dashboard.lock_queries();
            queries.statement = QueryState::Ready(Vec::new());
        }
        let view = dashboard.view_at(NOW);
        assert_eq!(view.error.as_deref(), Some(&Error::StatementStatus(404)));
        // The charts still render from the statement that did load.
        assert_eq!(view.evolution.len(), 6);
    }

    #[test]
    fn loading_if_either_query_is_pending() {
        let dashboard = Dashboard::new(
            FakeSource::with(Vec::new()),
            Some(AccountId::new("acc")),
            UtcOffset::UTC,
        );

        {
            let mut queries = dashboard.lock_queries();
            queries.statement = QueryState::Ready(Vec::new());
            queries.balance = QueryState::Loading;
        }

        assert!(dashboard.view_at(NOW).loading);
    }

    #[tokio::test]
    async fn refetch_marks_queries_loading_until_done() {
        let gate = Arc::new(Semaphore::new(0));
        let dashboard = Arc::new(Dashboard::new(
            GatedSource { gate: gate.clone() },
            Some(AccountId::new("acc")),
            UtcOffset::UTC,
        ));

        let task = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.refetch().await }
        });
        tokio::task::yield_now().await;

        assert!(dashboard.view_at(NOW).loading);

        gate.add_permits(2);
        task.await.unwrap();

        let view = dashboard.view_at(NOW);
        assert!(!view.loading);
        assert_eq!(view.evolution.len(), 6);
    }

    #[tokio::test]
    async fn refetch_replaces_previous_results() {
        let mut source = FakeSource::with(vec![create_test_transaction(
            TransactionKind::Credit,
            10.0,
        )]);
        source.fail_with_status = AtomicU16::new(500);
        let dashboard = Dashboard::new(source, Some(AccountId::new("acc")), UtcOffset::UTC);
        dashboard.refetch().await;
        assert!(dashboard.view_at(NOW).error.is_some());

        dashboard.source.fail_with_status.store(0, Ordering::SeqCst);
        dashboard.refetch().await;

        let view = dashboard.view_at(NOW);
        assert!(view.error.is_none());
        assert_eq!(view.balance.map(|balance| balance.value), Some(10.0));
    }
}
