//! Field normalizers
//!
//! Pure functions that turn raw page text into values safe to store:
//! absolute URLs, whitespace-clean text, prices and publish dates.
//! None of them fail; malformed input degrades to a documented default.

mod date;
mod price;
mod text;
mod url;

pub use self::url::{is_same_site, normalize_url};
pub use date::{parse_date, parse_date_at};
pub use price::parse_price;
pub use text::clean_text;
