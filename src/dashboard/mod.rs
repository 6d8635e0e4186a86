//! Dashboard module
//!
//! Turns an account statement into the figures shown by the dashboard
//! widgets and stores which widgets are visible and in what order.

mod aggregation;
mod facade;
mod handlers;
mod preferences;
mod window;

pub use aggregation::{MonthlyData, MonthlyIncomeOutcome, evolution_series, income_outcome_series};
pub use facade::{Dashboard, DashboardView};
pub use handlers::{
    DashboardState, PreferencesState, get_dashboard, get_dashboard_config_endpoint,
    put_dashboard_config_endpoint, put_widget_order_endpoint, toggle_widget_endpoint,
};
pub use preferences::{
    DashboardConfig, WIDGET_COUNT, WidgetConfig, WidgetId, WidgetOrder, create_preference_table,
    get_dashboard_config, save_dashboard_config, toggle_widget_visibility, update_widget_order,
};
pub use window::WINDOW_MONTHS;
