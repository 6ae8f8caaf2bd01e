use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{ApiError, Call, DaySchedule, ScheduleApi};

/// Per-request timeout. Bounds how long a single chat's schedule fetch can
/// stall a notification batch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the university timetable service.
#[derive(Debug, Clone)]
pub struct TimetableClient {
    http: Client,
    base_url: String,
}

impl TimetableClient {
    /// Creates a client for the timetable API at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupScheduleRequest {
    group_id: i64,
    date_start: String,
    date_end: String,
}

#[async_trait]
impl ScheduleApi for TimetableClient {
    async fn call_schedule(&self) -> Result<Vec<Call>, ApiError> {
        let url = format!("{}/time-table/call-schedule", self.base_url);
        debug!("GET {}", url);

        let response = check_status(self.http.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn group_schedule_day(
        &self,
        group_id: i64,
        date: NaiveDate,
    ) -> Result<DaySchedule, ApiError> {
        let url = format!("{}/time-table/group", self.base_url);
        let date_str = date.format("%Y-%m-%d").to_string();
        let request = GroupScheduleRequest {
            group_id,
            date_start: date_str.clone(),
            date_end: date_str,
        };
        debug!("POST {} for group {}", url, group_id);

        let response = check_status(self.http.post(&url).json(&request).send().await?).await?;
        let days: Vec<DaySchedule> = response.json().await?;

        Ok(pick_day(days, date))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

/// The API omits days without lessons, so a missing entry is an empty day.
fn pick_day(days: Vec<DaySchedule>, date: NaiveDate) -> DaySchedule {
    days.into_iter()
        .find(|day| day.date == date)
        .unwrap_or_else(|| DaySchedule {
            date,
            lessons: Vec::new(),
        })
}
