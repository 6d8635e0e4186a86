//! Transaction data aggregation for the dashboard charts.
//!
//! Buckets transactions into the trailing six calendar months and produces
//! two chart-ready series, both scaled to the range 0 to 100:
//! - the balance evolution, a running balance that carries forward through
//!   months without transactions;
//! - income versus outcome, per-month totals where months without
//!   transactions are zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    dashboard::window::MonthWindow,
    format::format_month,
    transaction::{Transaction, TransactionKind},
};

/// The balance shown at the bottom of the evolution chart.
const EVOLUTION_FLOOR: f64 = -10_000.0;

/// The distance between the balances shown at the bottom and top of the
/// evolution chart.
const EVOLUTION_SPAN: f64 = 20_000.0;

/// One point of the balance evolution chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyData {
    /// The three-letter month label.
    pub month: String,
    /// The balance at the end of the month, scaled to 0..=100.
    pub value: f64,
}

/// One pair of bars in the income versus outcome chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyIncomeOutcome {
    /// The three-letter month label.
    pub month: String,
    /// Money received during the month, scaled to 0..=100.
    #[serde(rename = "entrada")]
    pub income: f64,
    /// Money spent during the month, scaled to 0..=100.
    #[serde(rename = "saida")]
    pub outcome: f64,
}

/// Money in and out during one month.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct MonthTotals {
    income: f64,
    outcome: f64,
}

/// Calculates the balance evolution over the six months ending with the
/// month of `now`.
///
/// The balance only counts transactions from the start of the window, so it
/// is the change in balance over the window rather than the account
/// balance. A month without transactions shows the balance of the latest
/// earlier month that had some, or zero if there is none.
///
/// Balances are mapped linearly from -10,000..=10,000 onto 0..=100 and
/// clamped, so a zero balance is shown as 50.
///
/// # Returns
/// Exactly six points, oldest month first.
pub fn evolution_series(transactions: &[Transaction], now: OffsetDateTime) -> Vec<MonthlyData> {
    let window = MonthWindow::ending_at(now);
    let closing_balances = closing_balance_by_month(transactions, &window);

    let mut carried_balance = 0.0;

    window
        .months()
        .iter()
        .map(|month| {
            if let Some(&balance) = closing_balances.get(month) {
                carried_balance = balance;
            }

            MonthlyData {
                month: format_month(*month).to_owned(),
                value: normalize_balance(carried_balance),
            }
        })
        .collect()
}

/// Calculates income and outcome for each of the six months ending with
/// the month of `now`.
///
/// Credits count as income and every other transaction as outcome, both by
/// absolute value. The figures are scaled against the largest monthly
/// income or outcome so that the largest bar is 100. A month without
/// transactions shows zero for both.
///
/// # Returns
/// Exactly six points, oldest month first.
pub fn income_outcome_series(
    transactions: &[Transaction],
    now: OffsetDateTime,
) -> Vec<MonthlyIncomeOutcome> {
    let window = MonthWindow::ending_at(now);
    let totals = totals_by_month(transactions, &window);

    // Never below one, so an empty window does not divide by zero.
    let max_total = totals
        .values()
        .fold(1.0_f64, |max, totals| max.max(totals.income).max(totals.outcome));

    window
        .months()
        .iter()
        .map(|month| {
            let totals = totals.get(month).copied().unwrap_or_default();

            MonthlyIncomeOutcome {
                month: format_month(*month).to_owned(),
                income: normalize_ratio(totals.income, max_total),
                outcome: normalize_ratio(totals.outcome, max_total),
            }
        })
        .collect()
}

/// Walks the transactions in date order and records the running balance
/// after the last transaction of each month.
///
/// Transactions before the window are skipped and do not count towards the
/// running balance.
fn closing_balance_by_month(
    transactions: &[Transaction],
    window: &MonthWindow,
) -> HashMap<Date, f64> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|transaction| transaction.date());

    let mut running_balance = 0.0;
    let mut balances = HashMap::new();

    for transaction in sorted {
        if let Some(month) = window.month_of(transaction.date()) {
            running_balance += transaction.value();
            balances.insert(month, running_balance);
        }
    }

    balances
}

fn totals_by_month(
    transactions: &[Transaction],
    window: &MonthWindow,
) -> HashMap<Date, MonthTotals> {
    let mut totals: HashMap<Date, MonthTotals> = HashMap::new();

    for transaction in transactions {
        let Some(month) = window.month_of(transaction.date()) else {
            continue;
        };

        let month_totals = totals.entry(month).or_default();
        let amount = transaction.value().abs();

        match transaction.kind() {
            TransactionKind::Credit => month_totals.income += amount,
            TransactionKind::Debit => month_totals.outcome += amount,
        }
    }

    totals
}

fn normalize_balance(balance: f64) -> f64 {
    (((balance - EVOLUTION_FLOOR) / EVOLUTION_SPAN) * 100.0).clamp(0.0, 100.0)
}

fn normalize_ratio(amount: f64, max: f64) -> f64 {
    ((amount / max) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        dashboard::aggregation::{
            MonthlyIncomeOutcome, evolution_series, income_outcome_series, normalize_balance,
        },
        transaction::{AccountId, Transaction, TransactionKind},
    };

    const NOW: OffsetDateTime = datetime!(2024-06-15 12:00 UTC);

    fn create_test_transaction(
        kind: TransactionKind,
        value: f64,
        date: OffsetDateTime,
    ) -> Transaction {
        Transaction::new("t", AccountId::new("acc"), kind, value, date).unwrap()
    }

    fn credit(value: f64, date: OffsetDateTime) -> Transaction {
        create_test_transaction(TransactionKind::Credit, value, date)
    }

    fn debit(value: f64, date: OffsetDateTime) -> Transaction {
        create_test_transaction(TransactionKind::Debit, value, date)
    }

    #[track_caller]
    fn assert_close(got: f64, want: f64) {
        assert!(
            (got - want).abs() < 1e-9,
            "expected {want}, got {got}"
        );
    }

    #[track_caller]
    fn assert_values(got: &[f64], want: &[f64]) {
        assert_eq!(got.len(), want.len(), "got {got:?}, want {want:?}");

        for (got, want) in got.iter().zip(want) {
            assert_close(*got, *want);
        }
    }

    fn evolution_values(transactions: &[Transaction]) -> Vec<f64> {
        evolution_series(transactions, NOW)
            .into_iter()
            .map(|point| point.value)
            .collect()
    }

    #[test]
    fn evolution_of_empty_statement_is_midpoint() {
        let series = evolution_series(&[], NOW);

        let months: Vec<_> = series.iter().map(|point| point.month.as_str()).collect();
        assert_eq!(months, vec!["Jan", "Fev", "Mar", "Abr", "Mai", "Jun"]);
        assert!(series.iter().all(|point| point.value == 50.0));
    }

    #[test]
    fn evolution_carries_balance_through_quiet_months() {
        let transactions = vec![
            credit(2000.0, datetime!(2024-01-10 9:00 UTC)),
            debit(-500.0, datetime!(2024-05-20 9:00 UTC)),
        ];

        let values = evolution_values(&transactions);

        assert_values(&values, &[60.0, 60.0, 60.0, 60.0, 57.5, 57.5]);
    }

    #[test]
    fn evolution_ignores_transactions_before_window() {
        let transactions = vec![
            credit(5000.0, datetime!(2023-12-31 23:00 UTC)),
            credit(1000.0, datetime!(2024-02-01 0:00 UTC)),
        ];

        let values = evolution_values(&transactions);

        assert_values(&values, &[50.0, 55.0, 55.0, 55.0, 55.0, 55.0]);
    }

    #[test]
    fn evolution_uses_last_balance_of_month_regardless_of_input_order() {
        let transactions = vec![
            credit(300.0, datetime!(2024-03-20 9:00 UTC)),
            credit(100.0, datetime!(2024-03-05 9:00 UTC)),
            debit(-200.0, datetime!(2024-03-10 9:00 UTC)),
        ];

        let values = evolution_values(&transactions);

        assert_values(&values, &[50.0, 50.0, 51.0, 51.0, 51.0, 51.0]);
    }

    #[test]
    fn evolution_saturates_outside_display_range() {
        let rich = vec![credit(50_000.0, datetime!(2024-06-01 9:00 UTC))];
        let broke = vec![debit(-50_000.0, datetime!(2024-06-01 9:00 UTC))];

        assert_eq!(evolution_values(&rich)[5], 100.0);
        assert_eq!(evolution_values(&broke)[5], 0.0);
    }

    #[test]
    fn normalize_balance_maps_range_linearly() {
        assert_eq!(normalize_balance(0.0), 50.0);
        assert_eq!(normalize_balance(-10_000.0), 0.0);
        assert_eq!(normalize_balance(10_000.0), 100.0);
        assert_close(normalize_balance(5_000.0), 75.0);
    }

    #[test]
    fn income_outcome_of_empty_statement_is_zero() {
        let series = income_outcome_series(&[], NOW);

        assert_eq!(series.len(), 6);
        assert!(
            series
                .iter()
                .all(|point| point.income == 0.0 && point.outcome == 0.0)
        );
        assert_eq!(series[0].month, "Jan");
        assert_eq!(series[5].month, "Jun");
    }

    #[test]
    fn income_outcome_for_current_month() {
        let transactions = vec![
            credit(100.0, datetime!(2024-06-01 0:00 UTC)),
            debit(-40.0, datetime!(2024-06-01 0:00 UTC)),
        ];

        let series = income_outcome_series(&transactions, NOW);

        assert_close(series[5].income, 100.0);
        assert_close(series[5].outcome, 40.0);
    }

    #[test]
    fn income_outcome_zero_fills_quiet_months() {
        let transactions = vec![
            credit(500.0, datetime!(2024-02-14 9:00 UTC)),
            debit(-250.0, datetime!(2024-04-02 9:00 UTC)),
        ];

        let series = income_outcome_series(&transactions, NOW);

        let expected = [
            ("Jan", 0.0, 0.0),
            ("Fev", 100.0, 0.0),
            ("Mar", 0.0, 0.0),
            ("Abr", 0.0, 50.0),
            ("Mai", 0.0, 0.0),
            ("Jun", 0.0, 0.0),
        ];

        for (point, (month, income, outcome)) in series.iter().zip(expected) {
            assert_eq!(point.month, month);
            assert_close(point.income, income);
            assert_close(point.outcome, outcome);
        }
    }

    #[test]
    fn income_outcome_scales_against_largest_figure() {
        let transactions = vec![
            credit(1000.0, datetime!(2024-01-05 9:00 UTC)),
            debit(-2000.0, datetime!(2024-01-06 9:00 UTC)),
            debit(-500.0, datetime!(2024-03-06 9:00 UTC)),
        ];

        let series = income_outcome_series(&transactions, NOW);

        assert_close(series[0].income, 50.0);
        assert_close(series[0].outcome, 100.0);
        assert_close(series[2].outcome, 25.0);
    }

    #[test]
    fn income_outcome_uses_kind_and_absolute_value() {
        // Upstream data with unexpected signs is classified by kind only.
        let transactions = vec![
            debit(30.0, datetime!(2024-06-02 9:00 UTC)),
            credit(-20.0, datetime!(2024-06-03 9:00 UTC)),
        ];

        let series = income_outcome_series(&transactions, NOW);

        assert_close(series[5].income, 20.0 / 30.0 * 100.0);
        assert_close(series[5].outcome, 100.0);
    }

    #[test]
    fn income_outcome_ignores_transactions_before_window() {
        let transactions = vec![
            credit(10_000.0, datetime!(2023-12-15 9:00 UTC)),
            credit(10.0, datetime!(2024-06-02 9:00 UTC)),
        ];

        let series = income_outcome_series(&transactions, NOW);

        assert_eq!(
            series[5],
            MonthlyIncomeOutcome {
                month: "Jun".to_owned(),
                income: 100.0,
                outcome: 0.0,
            }
        );
    }

    #[test]
    fn small_totals_are_not_inflated() {
        // The maximum never drops below one.
        let transactions = vec![credit(0.5, datetime!(2024-06-02 9:00 UTC))];

        let series = income_outcome_series(&transactions, NOW);

        assert_close(series[5].income, 50.0);
    }

    #[test]
    fn both_series_always_have_six_months() {
        let transactions: Vec<_> = (0..100)
            .map(|i| {
                let date = datetime!(2022-06-01 12:00 UTC) + time::Duration::days(i * 8);
                if i % 2 == 0 {
                    credit(i as f64, date)
                } else {
                    debit(-(i as f64), date)
                }
            })
            .collect();

        assert_eq!(evolution_series(&transactions, NOW).len(), 6);
        assert_eq!(income_outcome_series(&transactions, NOW).len(), 6);
        assert_eq!(evolution_series(&[], NOW).len(), 6);
    }

    #[test]
    fn months_are_bucketed_in_local_time() {
        let now = datetime!(2024-06-15 12:00 -3);
        // Still the 31st of May in UTC-3.
        let transactions = vec![credit(100.0, datetime!(2024-06-01 1:00 UTC))];

        let series = income_outcome_series(&transactions, now);

        assert_close(series[4].income, 100.0);
        assert_close(series[5].income, 0.0);
    }

    #[test]
    fn series_serialize_with_wire_names() {
        let series = income_outcome_series(&[], NOW);

        let json = serde_json::to_value(&series[0]).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"month": "Jan", "entrada": 0.0, "saida": 0.0})
        );
    }
}
