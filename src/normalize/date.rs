//! Publish date parsing
//!
//! Handles relative day words and the absolute layouts the site prints,
//! with Russian month names.

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};

const TODAY: &str = "сегодня";
const YESTERDAY: &str = "вчера";

/// Month tokens in the forms the site prints them (genitive and abbreviated)
const MONTHS: &[(&str, u32)] = &[
    ("января", 1),
    ("янв", 1),
    ("февраля", 2),
    ("фев", 2),
    ("марта", 3),
    ("мар", 3),
    ("апреля", 4),
    ("апр", 4),
    ("мая", 5),
    ("май", 5),
    ("июня", 6),
    ("июн", 6),
    ("июля", 7),
    ("июл", 7),
    ("августа", 8),
    ("авг", 8),
    ("сентября", 9),
    ("сен", 9),
    ("сент", 9),
    ("октября", 10),
    ("окт", 10),
    ("ноября", 11),
    ("ноя", 11),
    ("декабря", 12),
    ("дек", 12),
];

/// A single absolute-date layout; returns `(year, month, day)` with `year`
/// missing when the layout carries none
type DateFormat = fn(&str) -> Option<(Option<i32>, u32, u32)>;

/// Tried in order; the first layout that recognises the text wins
const FORMATS: &[(&str, DateFormat)] = &[
    ("day month-name year", day_month_name_year),
    ("day month-name", day_month_name),
    ("day.month.year", day_month_year),
    ("day.month.yy", day_month_short_year),
];

/// Parses a publish date as printed on a listing page, relative to the current time
///
/// See [`parse_date_at`] for the rules.
pub fn parse_date(raw: &str) -> DateTime<Local> {
    parse_date_at(raw, Local::now())
}

/// Parses a publish date relative to `now`
///
/// - `сегодня …` / `вчера …` map to local midnight of that calendar day
/// - absolute layouts: `12 марта 2023`, `12 марта`, `12.03.2023`, `12.03.23`;
///   a layout without a year takes the year of `now`
/// - anything unrecognised returns `now` itself. This is a deliberate degraded
///   value: consumers always get a timestamp, at the cost of it being invented.
pub fn parse_date_at(raw: &str, now: DateTime<Local>) -> DateTime<Local> {
    let text = raw.trim().to_lowercase();

    if text.contains(TODAY) {
        return local_midnight(now.date_naive()).unwrap_or(now);
    }

    if text.contains(YESTERDAY) {
        return now
            .date_naive()
            .pred_opt()
            .and_then(local_midnight)
            .unwrap_or(now);
    }

    for (name, format) in FORMATS {
        if let Some((year, month, day)) = format(&text) {
            let year = year.unwrap_or_else(|| now.year());
            if let Some(parsed) = NaiveDate::from_ymd_opt(year, month, day).and_then(local_midnight)
            {
                tracing::trace!("Parsed date {:?} with layout '{}'", raw, name);
                return parsed;
            }
        }
    }

    tracing::debug!("Unrecognised date {:?}, falling back to now", raw);
    now
}

fn local_midnight(date: NaiveDate) -> Option<DateTime<Local>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Local.from_local_datetime(&midnight).earliest()
}

fn month_number(token: &str) -> Option<u32> {
    let token = token.trim_end_matches(['.', ',']);
    MONTHS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, number)| *number)
}

fn parse_day(token: &str) -> Option<u32> {
    if token.is_empty() || token.len() > 2 || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn day_month_name_year(text: &str) -> Option<(Option<i32>, u32, u32)> {
    let mut tokens = text.split_whitespace();
    let day = parse_day(tokens.next()?)?;
    let month = month_number(tokens.next()?)?;
    let year_token = tokens.next()?.trim_end_matches(['.', ',']);
    if year_token.len() != 4 || !year_token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((Some(year_token.parse().ok()?), month, day))
}

fn day_month_name(text: &str) -> Option<(Option<i32>, u32, u32)> {
    let mut tokens = text.split_whitespace();
    let day = parse_day(tokens.next()?)?;
    let month = month_number(tokens.next()?)?;
    Some((None, month, day))
}

fn numeric_parts(text: &str) -> Option<(u32, u32, &str)> {
    let token = text.split_whitespace().next()?;
    let mut parts = token.split('.');
    let day = parse_day(parts.next()?)?;
    let month = parse_day(parts.next()?)?;
    let year = parts.next()?;
    if parts.next().is_some() || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((day, month, year))
}

fn day_month_year(text: &str) -> Option<(Option<i32>, u32, u32)> {
    let (day, month, year) = numeric_parts(text)?;
    if year.len() != 4 {
        return None;
    }
    Some((Some(year.parse().ok()?), month, day))
}

fn day_month_short_year(text: &str) -> Option<(Option<i32>, u32, u32)> {
    let (day, month, year) = numeric_parts(text)?;
    if year.len() != 2 {
        return None;
    }
    let short: i32 = year.parse().ok()?;
    Some((Some(2000 + short), month, day))
}
