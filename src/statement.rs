//! Fetching account statements.
//!
//! The dashboard does not own transaction data. It asks a [StatementSource]
//! for the statement of an account each time it needs one.

use std::{future::Future, time::Duration};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    transaction::{AccountId, Transaction},
};

/// Anything that can provide the list of transactions for an account.
pub trait StatementSource: Send + Sync {
    /// Fetch every transaction for `account_id`, in no particular order.
    fn fetch_statement(
        &self,
        account_id: &AccountId,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;
}

/// The body returned by the statement endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResponse {
    /// A human readable status message.
    #[serde(default)]
    pub message: String,
    /// The statement itself.
    pub result: StatementResult,
}

/// The transactions and paging information of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    /// The transactions. A missing or null list means there are none.
    #[serde(default)]
    pub transactions: Option<Vec<Transaction>>,
    /// Paging information, if the endpoint sent any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Which page of a statement was returned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The page number.
    pub page: u32,
    /// The maximum number of transactions per page.
    pub page_size: u32,
    /// The number of transactions across all pages.
    pub total: u32,
    /// The number of pages.
    pub total_pages: u32,
}

/// Fetches statements from the HTTP statement endpoint
/// `{base_url}/account/{account_id}/statement`.
#[derive(Debug, Clone)]
pub struct HttpStatementSource {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpStatementSource {
    /// The number of transactions requested in a single page.
    pub const PAGE_SIZE: u32 = 1000;

    /// How long a statement request may take before it is abandoned.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a source for the statement API at `base_url`.
    ///
    /// If `token` is given it is sent as a bearer token with every request.
    /// Requests time out after [Self::DEFAULT_TIMEOUT].
    ///
    /// # Errors
    /// Returns [Error::StatementRequest] if `base_url` is not an absolute
    /// HTTP URL.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, Error> {
        Self::with_timeout(base_url, token, Self::DEFAULT_TIMEOUT)
    }

    /// Like [Self::new], but requests time out after `timeout`.
    ///
    /// # Errors
    /// Returns [Error::StatementRequest] if `base_url` is not an absolute
    /// HTTP URL or the HTTP client cannot be built.
    pub fn with_timeout(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)
            .map_err(|error| Error::StatementRequest(format!("invalid URL {base_url}: {error}")))?;

        if base_url.cannot_be_a_base() {
            return Err(Error::StatementRequest(format!(
                "invalid URL {base_url}: cannot be used as a base URL"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::StatementRequest(error.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn statement_url(&self, account_id: &AccountId) -> Result<Url, Error> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| Error::StatementRequest(format!("invalid URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["account", account_id.as_str(), "statement"]);
        url.query_pairs_mut()
            .append_pair("pageSize", &Self::PAGE_SIZE.to_string());

        Ok(url)
    }
}

impl StatementSource for HttpStatementSource {
    async fn fetch_statement(&self, account_id: &AccountId) -> Result<Vec<Transaction>, Error> {
        let url = self.statement_url(account_id)?;
        tracing::debug!("Fetching statement from {url}");

        let mut request = self.client.get(url);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .inspect_err(|error| tracing::error!("statement request failed: {error}"))
            .map_err(|error| Error::StatementRequest(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("statement endpoint responded with {status}");
            return Err(Error::StatementStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|error| Error::StatementRequest(error.to_string()))?;

        let statement: StatementResponse = serde_json::from_str(&body)
            .inspect_err(|error| tracing::error!("could not parse statement: {error}"))
            .map_err(|error| Error::InvalidStatement(error.to_string()))?;

        let mut transactions = statement.result.transactions.unwrap_or_default();
        sort_newest_first(&mut transactions);

        tracing::debug!(
            "Fetched {} transactions for account {account_id}",
            transactions.len()
        );

        Ok(transactions)
    }
}

/// Sort `transactions` so the most recent comes first.
pub(crate) fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|transaction| std::cmp::Reverse(transaction.date()));
}
