//! Dashboard Preferences Management
//!
//! This module handles saving and loading which dashboard widgets are
//! visible and the order they are shown in. The configuration is stored as
//! JSON under a fixed key in a key/value table.

use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The key the dashboard configuration is stored under.
const DASHBOARD_CONFIG_KEY: &str = "dashboardConfig";

/// The number of widgets on the dashboard.
pub const WIDGET_COUNT: usize = 3;

/// The widgets that can be shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetId {
    /// The current balance.
    Balance,
    /// The balance evolution chart.
    Evolution,
    /// The income versus outcome chart.
    IncomeOutcome,
}

impl WidgetId {
    /// Every widget, in default display order.
    pub const ALL: [WidgetId; WIDGET_COUNT] =
        [WidgetId::Balance, WidgetId::Evolution, WidgetId::IncomeOutcome];
}

impl FromStr for WidgetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance" => Ok(WidgetId::Balance),
            "evolution" => Ok(WidgetId::Evolution),
            "incomeOutcome" => Ok(WidgetId::IncomeOutcome),
            _ => Err(Error::NotFound),
        }
    }
}

/// How a single widget is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// The widget being configured.
    pub id: WidgetId,
    /// Whether the widget is shown.
    pub visible: bool,
    /// Position of the widget, lowest first.
    pub order: u32,
}

/// The new position for one widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetOrder {
    /// The widget to move.
    pub id: WidgetId,
    /// Its new position.
    pub order: u32,
}

/// How every widget on the dashboard is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// The widgets, sorted by `order`.
    pub widgets: Vec<WidgetConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let widgets = WidgetId::ALL
            .into_iter()
            .zip(0..)
            .map(|(id, order)| WidgetConfig {
                id,
                visible: true,
                order,
            })
            .collect();

        Self { widgets }
    }
}

impl DashboardConfig {
    /// Append any widget that is missing from a stored configuration, e.g.
    /// one added after the configuration was saved, then sort by order.
    ///
    /// Missing widgets are visible and placed after the existing ones.
    fn with_missing_widgets(mut self) -> Self {
        for default_widget in DashboardConfig::default().widgets {
            if self.widget_mut(default_widget.id).is_none() {
                let order = self.widgets.len() as u32;
                self.widgets.push(WidgetConfig {
                    order,
                    ..default_widget
                });
            }
        }

        self.sort();
        self
    }

    fn widget_mut(&mut self, id: WidgetId) -> Option<&mut WidgetConfig> {
        self.widgets.iter_mut().find(|widget| widget.id == id)
    }

    fn sort(&mut self) {
        self.widgets.sort_by_key(|widget| widget.order);
    }
}

/// Create the preference table in the database.
///
/// The table is a simple key/value store where values are JSON strings.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_preference_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS preference (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Gets the dashboard configuration.
///
/// Returns the default configuration if none has been saved or the saved
/// configuration cannot be read. Widgets missing from the saved
/// configuration are appended. The widgets are sorted by order.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query fails.
pub fn get_dashboard_config(connection: &Connection) -> Result<DashboardConfig, Error> {
    let stored: Option<String> = connection
        .query_row(
            "SELECT value FROM preference WHERE key = ?1",
            [DASHBOARD_CONFIG_KEY],
            |row| row.get(0),
        )
        .optional()?;

    let Some(stored) = stored else {
        return Ok(DashboardConfig::default());
    };

    match serde_json::from_str::<DashboardConfig>(&stored) {
        Ok(config) => Ok(config.with_missing_widgets()),
        Err(error) => {
            tracing::warn!("could not read the saved dashboard configuration: {error}");
            Ok(DashboardConfig::default())
        }
    }
}

/// Saves the dashboard configuration, replacing any saved before.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query fails.
pub fn save_dashboard_config(config: &DashboardConfig, connection: &Connection) -> Result<(), Error> {
    let json = serde_json::to_string(config)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    connection.execute(
        "INSERT INTO preference (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (DASHBOARD_CONFIG_KEY, json),
    )?;

    Ok(())
}

/// Shows the widget `widget_id` if it is hidden, hides it otherwise.
///
/// # Returns
/// The saved configuration.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query fails.
pub fn toggle_widget_visibility(
    widget_id: WidgetId,
    connection: &Connection,
) -> Result<DashboardConfig, Error> {
    let mut config = get_dashboard_config(connection)?;

    if let Some(widget) = config.widget_mut(widget_id) {
        widget.visible = !widget.visible;
        save_dashboard_config(&config, connection)?;
    }

    Ok(config)
}

/// Moves the widgets in `orders` to their new positions.
///
/// Widgets not listed keep their position.
///
/// # Returns
/// The saved configuration, sorted by the new order.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query fails.
pub fn update_widget_order(
    orders: &[WidgetOrder],
    connection: &Connection,
) -> Result<DashboardConfig, Error> {
    let mut config = get_dashboard_config(connection)?;

    for WidgetOrder { id, order } in orders {
        if let Some(widget) = config.widget_mut(*id) {
            widget.order = *order;
        }
    }

    config.sort();
    save_dashboard_config(&config, connection)?;

    Ok(config)
}
