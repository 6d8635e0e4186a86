//! Command line and environment configuration for the server.

use std::net::SocketAddr;

use clap::Parser;

/// The JSON API server for the personal finance dashboard.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// File path to the application SQLite database.
    #[arg(long)]
    pub db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Base URL of the statement API, e.g. "http://localhost:5000".
    #[arg(long, env = "STATEMENT_URL")]
    pub statement_url: String,

    /// Bearer token sent to the statement API.
    #[arg(long, env = "STATEMENT_TOKEN", hide_env_values = true)]
    pub statement_token: Option<String>,

    /// The canonical name of the local timezone, e.g. "America/Sao_Paulo".
    ///
    /// Transactions are grouped into months in this timezone.
    #[arg(long, default_value = "Etc/UTC")]
    pub timezone: String,
}

impl Config {
    /// The address the server listens on.
    pub fn address(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.port))
    }
}
