//! Display formatting for amounts and months.
//!
//! Amounts use the Brazilian convention: `.` groups thousands and `,`
//! separates the two decimal places, e.g. `R$ 1.234,56`.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use time::Date;

use crate::{Error, transaction::parse_timestamp};

/// The string shown in place of amounts that are not finite numbers.
const ZERO_CURRENCY: &str = "R$ 0,00";

const ZERO_VALUE: &str = "0,00";

/// numfmt writes amounts of a trillion or more in scientific notation.
const POSITIONAL_LIMIT: f64 = 1e12;

/// Three-letter month labels, indexed by zero-based month number.
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Format `number` as Brazilian reais, e.g. `R$ 1.234,56` or `-R$ 40,00`.
///
/// The amount is rounded to the nearest cent. NaN and infinite values are
/// formatted as `R$ 0,00`.
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| brazilian_formatter("R$ "));

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| brazilian_formatter("-R$ "));

    format_with(number, positive_fmt, negative_fmt, "R$ ", "-R$ ")
        .unwrap_or_else(|| ZERO_CURRENCY.to_owned())
}

/// Parse `text` as a number and format it with [format_currency].
///
/// Text that is not a number is formatted as `R$ 0,00`.
pub fn format_currency_text(text: &str) -> String {
    text.trim()
        .parse::<f64>()
        .map(format_currency)
        .unwrap_or_else(|_| ZERO_CURRENCY.to_owned())
}

/// Format `number` with two decimal places and no currency symbol, e.g. `1.234,56`.
///
/// NaN and infinite values are formatted as `0,00`.
pub fn format_value(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| brazilian_formatter(""));

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| brazilian_formatter("-"));

    format_with(number, positive_fmt, negative_fmt, "", "-")
        .unwrap_or_else(|| ZERO_VALUE.to_owned())
}

/// The three-letter label for the month of `date`, e.g. "Jan" or "Fev".
pub fn format_month(date: Date) -> &'static str {
    MONTH_LABELS[usize::from(u8::from(date.month())) - 1]
}

/// The three-letter label for the month of an ISO-8601 date string.
///
/// The month is taken from the date as written, without converting between
/// timezones.
///
/// # Errors
/// Returns [Error::InvalidTransactionDate] if `date` cannot be parsed.
pub fn format_month_str(date: &str) -> Result<&'static str, Error> {
    parse_timestamp(date).map(|timestamp| format_month(timestamp.date()))
}

fn brazilian_formatter(prefix: &str) -> Formatter {
    Formatter::currency(prefix)
        .unwrap()
        .separator('.')
        .unwrap()
        .precision(Precision::Decimals(2))
}

/// Round `number` to cents and format it with `positive_fmt` or
/// `negative_fmt`.
///
/// Returns `None` for zero and non-finite numbers. Amounts that round to
/// zero cents count as zero, so they never get a minus sign.
fn format_with(
    number: f64,
    positive_fmt: &Formatter,
    negative_fmt: &Formatter,
    positive_prefix: &str,
    negative_prefix: &str,
) -> Option<String> {
    if !number.is_finite() {
        return None;
    }

    let (formatter, prefix) = if number < 0.0 {
        (negative_fmt, negative_prefix)
    } else {
        (positive_fmt, positive_prefix)
    };
    let amount = number.abs();

    let formatted_string = if amount < POSITIONAL_LIMIT {
        // numfmt truncates extra decimals instead of rounding them.
        let rounded = (amount * 100.0).round() / 100.0;

        if rounded == 0.0 {
            return None;
        }

        formatter.fmt_string(rounded)
    } else {
        format!("{prefix}{}", format_large(amount))
    };

    Some(pad_decimals(formatted_string))
}

/// numfmt omits trailing zeros, so we must add them ourselves.
/// For example, "R$ 12,3" becomes "R$ 12,30" and "R$ 12" becomes "R$ 12,00".
fn pad_decimals(mut formatted_string: String) -> String {
    match formatted_string.rfind(',') {
        Some(comma) => {
            let decimals = formatted_string.len() - comma - 1;
            for _ in decimals..2 {
                formatted_string.push('0');
            }
        }
        None => formatted_string.push_str(",00"),
    }

    formatted_string
}

/// Positional notation for amounts numfmt would write in scientific notation.
fn format_large(amount: f64) -> String {
    let text = format!("{amount:.2}");
    let (integer, decimals) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{grouped},{decimals}")
}
