//! Dashboard HTTP handlers.
//!
//! This module contains:
//! - The route handler returning the dashboard data of an account
//! - Route handlers for reading and updating the widget configuration
//! - The state types used by the handlers

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    balance::Balance,
    dashboard::{
        aggregation::{MonthlyData, MonthlyIncomeOutcome},
        facade::{Dashboard, DashboardView},
        preferences::{
            DashboardConfig, WidgetId, WidgetOrder, get_dashboard_config, save_dashboard_config,
            toggle_widget_visibility, update_widget_order,
        },
    },
    format::format_currency,
    statement::StatementSource,
    timezone::get_local_offset,
    transaction::AccountId,
};

/// The state needed for the dashboard data endpoint.
#[derive(Debug, Clone)]
pub struct DashboardState<S> {
    /// Where account statements are fetched from.
    pub statement_source: S,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl<S: Clone> FromRef<AppState<S>> for DashboardState<S> {
    fn from_ref(state: &AppState<S>) -> Self {
        Self {
            statement_source: state.statement_source.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The state needed for reading and saving the widget configuration.
#[derive(Debug, Clone)]
pub struct PreferencesState {
    /// The database connection holding the preferences.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl<S> FromRef<AppState<S>> for PreferencesState {
    fn from_ref(state: &AppState<S>) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

impl PreferencesState {
    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

/// The dashboard data of one account as sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardResponse {
    balance: Option<Balance>,
    formatted_balance: Option<String>,
    evolution: Vec<MonthlyData>,
    income_outcome: Vec<MonthlyIncomeOutcome>,
}

impl From<DashboardView> for DashboardResponse {
    fn from(view: DashboardView) -> Self {
        Self {
            formatted_balance: view
                .balance
                .as_ref()
                .map(|balance| format_currency(balance.value)),
            balance: view.balance,
            evolution: view.evolution,
            income_outcome: view.income_outcome,
        }
    }
}

/// Get the balance and the chart series for `account_id`.
///
/// Responds with a bad gateway status if the statement could not be fetched.
pub async fn get_dashboard<S>(
    State(state): State<DashboardState<S>>,
    Path(account_id): Path<AccountId>,
) -> Response
where
    S: StatementSource,
{
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let view = Dashboard::load(state.statement_source, account_id, local_offset).await;

    if let Some(error) = &view.error {
        tracing::error!("Could not load the dashboard: {error}");
        return error.to_response();
    }

    Json(DashboardResponse::from(view)).into_response()
}

/// Get the widget configuration.
pub async fn get_dashboard_config_endpoint(
    State(state): State<PreferencesState>,
) -> Result<Json<DashboardConfig>, Error> {
    let connection = state.connection()?;

    get_dashboard_config(&connection)
        .inspect_err(|error| tracing::error!("could not get dashboard config: {error}"))
        .map(Json)
}

/// Replace the widget configuration and return it as it will be read back.
pub async fn put_dashboard_config_endpoint(
    State(state): State<PreferencesState>,
    Json(config): Json<DashboardConfig>,
) -> Result<Json<DashboardConfig>, Error> {
    let connection = state.connection()?;

    save_dashboard_config(&config, &connection)
        .inspect_err(|error| tracing::error!("Failed to save dashboard preferences: {error}"))?;

    get_dashboard_config(&connection).map(Json)
}

/// Show or hide one widget.
///
/// Responds with not found if `widget_id` is not a dashboard widget.
pub async fn toggle_widget_endpoint(
    State(state): State<PreferencesState>,
    Path(widget_id): Path<String>,
) -> Result<Json<DashboardConfig>, Error> {
    let widget_id: WidgetId = widget_id.parse()?;
    let connection = state.connection()?;

    toggle_widget_visibility(widget_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to toggle widget {widget_id:?}: {error}"))
        .map(Json)
}

/// Move widgets to new positions.
pub async fn put_widget_order_endpoint(
    State(state): State<PreferencesState>,
    Json(orders): Json<Vec<WidgetOrder>>,
) -> Result<Json<DashboardConfig>, Error> {
    let connection = state.connection()?;

    update_widget_order(&orders, &connection)
        .inspect_err(|error| tracing::error!("Failed to reorder widgets: {error}"))
        .map(Json)
}
