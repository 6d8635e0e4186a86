//! Database setup.

use rusqlite::Connection;

use crate::{Error, dashboard::create_preference_table};

/// Create the tables the application needs if they do not exist yet.
///
/// # Errors
/// Returns an error if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    create_preference_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
