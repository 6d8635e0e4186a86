//! The transaction records that make up an account statement.

use std::fmt::Display;

use serde::{Deserialize, Serialize, Serializer};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime,
    format_description::well_known::{Iso8601, Rfc3339},
    macros::format_description,
};

use crate::Error;

/// Identifies the account a statement belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Whether money came into or went out of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money coming in.
    Credit,
    /// Money going out.
    Debit,
}

/// One movement of money on an account.
///
/// The sign of `value` is set upstream: credits are usually positive and
/// debits usually negative, but nothing here enforces it.
///
/// A transaction always has a finite value and a valid timestamp. Both are
/// checked when it is created or deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TransactionRecord")]
pub struct Transaction {
    id: String,
    account_id: AccountId,
    #[serde(rename = "type")]
    kind: TransactionKind,
    value: f64,
    #[serde(serialize_with = "serialize_timestamp")]
    date: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<String>,
    #[serde(rename = "anexo", skip_serializing_if = "Option::is_none")]
    attachment: Option<String>,
    #[serde(rename = "urlAnexo", skip_serializing_if = "Option::is_none")]
    attachment_url: Option<String>,
}

impl Transaction {
    /// Create a transaction without counterparties or attachments.
    ///
    /// # Errors
    /// Returns [Error::NonFiniteValue] if `value` is NaN or infinite.
    pub fn new(
        id: impl Into<String>,
        account_id: AccountId,
        kind: TransactionKind,
        value: f64,
        date: OffsetDateTime,
    ) -> Result<Self, Error> {
        let id = id.into();

        if !value.is_finite() {
            return Err(Error::NonFiniteValue(id));
        }

        Ok(Self {
            id,
            account_id,
            kind,
            value,
            date,
            from: None,
            to: None,
            attachment: None,
            attachment_url: None,
        })
    }

    /// Set who sent and who received the money.
    pub fn with_parties(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Attach a receipt or other document by name and URL.
    pub fn with_attachment(mut self, name: String, url: Option<String>) -> Self {
        self.attachment = Some(name);
        self.attachment_url = url;
        self
    }

    /// The transaction's unique ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The account the transaction belongs to.
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Whether this is a credit or a debit.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// The signed amount.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// When the transaction happened.
    pub fn date(&self) -> OffsetDateTime {
        self.date
    }

    /// Who sent the money, if known.
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Who received the money, if known.
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    /// The name of the attached document, if any.
    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }

    /// Where the attached document can be downloaded, if anywhere.
    pub fn attachment_url(&self) -> Option<&str> {
        self.attachment_url.as_deref()
    }
}

/// A transaction as it appears on the wire, before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRecord {
    id: String,
    account_id: AccountId,
    #[serde(rename = "type")]
    kind: TransactionKind,
    value: f64,
    date: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    anexo: Option<String>,
    #[serde(default)]
    url_anexo: Option<String>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = Error;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let date = parse_timestamp(&record.date)?;
        let mut transaction = Transaction::new(
            record.id,
            record.account_id,
            record.kind,
            record.value,
            date,
        )?
        .with_parties(record.from, record.to);

        transaction.attachment = record.anexo;
        transaction.attachment_url = record.url_anexo;

        Ok(transaction)
    }
}

/// Parse an ISO-8601 date or timestamp.
///
/// Accepts RFC 3339 timestamps, ISO-8601 timestamps with or without an
/// offset, and plain dates. Timestamps without an offset and plain dates
/// are taken to be UTC, plain dates at midnight.
///
/// # Errors
/// Returns [Error::InvalidTransactionDate] if `text` matches none of these forms.
pub(crate) fn parse_timestamp(text: &str) -> Result<OffsetDateTime, Error> {
    let text = text.trim();

    if let Ok(timestamp) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(timestamp);
    }

    if let Ok(timestamp) = OffsetDateTime::parse(text, &Iso8601::DEFAULT) {
        return Ok(timestamp);
    }

    if let Ok(timestamp) = PrimitiveDateTime::parse(text, &Iso8601::DEFAULT) {
        return Ok(timestamp.assume_utc());
    }

    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| Error::InvalidTransactionDate(text.to_owned()))
}

fn serialize_timestamp<S>(timestamp: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let text = timestamp
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;

    serializer.serialize_str(&text)
}
