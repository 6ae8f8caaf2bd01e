//! Client for the university timetable API.

mod client;
mod types;

pub use self::client::TimetableClient;
pub use self::types::{Call, DaySchedule, Lesson, Period};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by the timetable API.
///
/// Transport problems (connection refused, timeout, malformed body) are
/// separated from structured API errors (a non-2xx response with a body),
/// so callers can tell "temporarily unreachable" from "the API rejected
/// the request".
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("timetable API request failed")]
    Transport(#[from] reqwest::Error),
    #[error("timetable API returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Read access to the university timetable.
#[async_trait]
pub trait ScheduleApi: Send + Sync {
    /// The daily bell schedule, ordered by lesson number.
    async fn call_schedule(&self) -> Result<Vec<Call>, ApiError>;

    /// One group's schedule for a single day. A day the API has no lessons
    /// for comes back with an empty lesson list.
    async fn group_schedule_day(&self, group_id: i64, date: NaiveDate)
        -> Result<DaySchedule, ApiError>;
}
