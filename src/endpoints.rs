//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}/dashboard', use [format_endpoint].

/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
/// The route for the balance and chart series of an account.
pub const DASHBOARD: &str = "/api/accounts/{account_id}/dashboard";
/// The route to read or replace the widget configuration.
pub const DASHBOARD_CONFIG: &str = "/api/dashboard/config";
/// The route to show or hide a single widget.
pub const TOGGLE_WIDGET: &str = "/api/dashboard/config/widgets/{widget_id}/toggle";
/// The route to move widgets to new positions.
pub const WIDGET_ORDER: &str = "/api/dashboard/config/order";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/widgets/{widget_id}', '{widget_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
