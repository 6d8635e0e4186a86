//! The current balance of an account, derived from its statement.

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// The yield percentage shown when the caller does not provide one.
pub const DEFAULT_YIELD_PERCENTAGE: f64 = 3.0;

/// The amount of money available in an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    /// The sum of every transaction value on the statement.
    pub value: f64,
    /// Informational yield shown next to the balance.
    pub yield_percentage: f64,
}

/// Sum the values of `transactions` into a [Balance].
///
/// Values are added with the sign they already carry; the transaction kind
/// is not consulted. `yield_percentage` defaults to [DEFAULT_YIELD_PERCENTAGE].
pub fn calculate_balance(transactions: &[Transaction], yield_percentage: Option<f64>) -> Balance {
    let value = transactions
        .iter()
        .map(|transaction| transaction.value())
        .sum();

    Balance {
        value,
        yield_percentage: yield_percentage.unwrap_or(DEFAULT_YIELD_PERCENTAGE),
    }
}
