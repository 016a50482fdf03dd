//! Price text parsing

use crate::models::{Currency, Price};
use regex::Regex;
use std::sync::LazyLock;

/// First run of digits, whitespace and separators, starting at a digit
static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d\s,.]*").expect("valid regex"));

/// Parses a price string such as `"1 234,50 $"` or `"12 500 ₽"`
///
/// The currency is detected by symbol (`$` → USD, `€` → EUR, otherwise RUB).
/// A string without a parseable number is not an error: the result keeps
/// `value == 0.0` and the untouched `text`.
///
/// # Examples
///
/// ```
/// use avitolog::{parse_price, Currency};
///
/// let price = parse_price("1 234,50 $");
/// assert_eq!(price.value, 1234.5);
/// assert_eq!(price.currency, Currency::Usd);
/// assert_eq!(price.text, "1 234,50 $");
/// ```
pub fn parse_price(raw: &str) -> Price {
    let currency = if raw.contains('$') {
        Currency::Usd
    } else if raw.contains('€') {
        Currency::Eur
    } else {
        Currency::Rub
    };

    let value = PRICE_NUMBER
        .find(raw)
        .and_then(|m| parse_number(m.as_str()))
        .unwrap_or(0.0);

    Price {
        value,
        currency,
        text: raw.to_string(),
    }
}

fn parse_number(run: &str) -> Option<f64> {
    let compact: String = run.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.trim_end_matches(['.', ',']).replace(',', ".");
    compact.parse::<f64>().ok()
}
