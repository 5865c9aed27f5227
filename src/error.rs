use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid {kind} record for location {location_id} on {date}: {reason}")]
    InvalidRecord {
        kind: &'static str,
        location_id: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("unknown order type: {0}")]
    UnknownOrderType(String),

    #[error("unknown inventory category: {0}")]
    UnknownCategory(String),
}
