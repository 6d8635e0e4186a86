//! Application router configuration.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::{
    AppState,
    dashboard::{
        get_dashboard, get_dashboard_config_endpoint, put_dashboard_config_endpoint,
        put_widget_order_endpoint, toggle_widget_endpoint,
    },
    endpoints,
    logging::logging_middleware,
    statement::StatementSource,
};

/// Return a router with all the app's routes.
pub fn build_router<S>(state: AppState<S>) -> Router
where
    S: StatementSource + Clone + 'static,
{
    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::DASHBOARD, get(get_dashboard::<S>))
        .route(
            endpoints::DASHBOARD_CONFIG,
            get(get_dashboard_config_endpoint).put(put_dashboard_config_endpoint),
        )
        .route(endpoints::TOGGLE_WIDGET, post(toggle_widget_endpoint))
        .route(endpoints::WIDGET_ORDER, put(put_widget_order_endpoint))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_health() -> &'static str {
    "ok"
}
