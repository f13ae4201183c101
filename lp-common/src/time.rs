//! Timestamp utilities

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar date of `ts` in the server's local time zone
pub fn local_date(ts: DateTime<Utc>) -> NaiveDate {
    date_in(ts, &Local)
}

/// Calendar date of `ts` in an arbitrary time zone
pub fn date_in<Tz: TimeZone>(ts: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}
