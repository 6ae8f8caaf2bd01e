use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One bell-schedule slot, shared by all groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub number: i32,
    /// Lesson start, wall-clock `HH:MM`.
    pub time_start: String,
    /// Lesson end, wall-clock `HH:MM`.
    pub time_end: String,
}

/// One group's schedule for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// A numbered lesson slot with its taught periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub number: i32,
    #[serde(default)]
    pub periods: Vec<Period>,
}

/// A single taught discipline within a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub discipline_short_name: String,
    pub type_str: String,
}
