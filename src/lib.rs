//! Extrato serves the data behind a personal-finance dashboard.
//!
//! The library turns an account statement (a list of transactions fetched
//! from an upstream statement endpoint) into the figures the dashboard
//! widgets display: the current balance, a six-month balance evolution and a
//! six-month income versus outcome comparison. It also stores which widgets
//! are visible and in what order, and exposes all of this as a JSON API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod balance;
mod config;
mod dashboard;
mod db;
pub mod endpoints;
mod format;
mod logging;
mod routing;
mod statement;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use balance::{Balance, DEFAULT_YIELD_PERCENTAGE, calculate_balance};
pub use config::Config;
pub use dashboard::{
    Dashboard, DashboardConfig, DashboardView, MonthlyData, MonthlyIncomeOutcome, WIDGET_COUNT,
    WINDOW_MONTHS, WidgetConfig, WidgetId, WidgetOrder, evolution_series, get_dashboard_config,
    income_outcome_series, save_dashboard_config, toggle_widget_visibility, update_widget_order,
};
pub use db::initialize as initialize_db;
pub use format::{format_currency, format_currency_text, format_month, format_month_str, format_value};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use statement::{HttpStatementSource, StatementResponse, StatementSource};
pub use timezone::get_local_offset;
pub use transaction::{AccountId, Transaction, TransactionKind};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction date could not be parsed as an ISO-8601 date or timestamp.
    ///
    /// Callers should pass in the date string that caused the error.
    #[error("\"{0}\" is not a valid ISO-8601 date")]
    InvalidTransactionDate(String),

    /// A transaction was created with a value that is NaN or infinite.
    ///
    /// The aggregations assume every value is a finite number, so such
    /// transactions are rejected when they are created.
    #[error("transaction {0} has a value that is not a finite number")]
    NonFiniteValue(String),

    /// The request to the statement endpoint could not be completed, e.g.
    /// the connection was refused or timed out.
    #[error("could not fetch the statement: {0}")]
    StatementRequest(String),

    /// The statement endpoint answered with a non-success status code.
    #[error("the statement endpoint responded with status {0}")]
    StatementStatus(u16),

    /// The statement endpoint answered with a body that is not a valid
    /// statement, including statements with malformed transactions.
    #[error("could not read the statement: {0}")]
    InvalidStatement(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code a client should see for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::StatementRequest(_)
            | Error::StatementStatus(_)
            | Error::InvalidStatement(_)
            | Error::InvalidTransactionDate(_)
            | Error::NonFiniteValue(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error as a JSON response without consuming it.
    ///
    /// Errors held by the dashboard are shared behind an `Arc`, so handlers
    /// need to build a response from a reference.
    pub(crate) fn to_response(&self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.to_response()
    }
}
