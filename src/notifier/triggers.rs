//! Turns the daily call schedule into notification trigger times.

use chrono::NaiveTime;

use crate::api::Call;

use super::{NotificationClass, NotifierError};

/// Local times of day at which notification jobs fire, one list per
/// notification class, in call schedule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerTimes {
    pub fifteen_minutes: Vec<NaiveTime>,
    pub one_minute: Vec<NaiveTime>,
}

impl TriggerTimes {
    pub fn for_class(&self, class: NotificationClass) -> &[NaiveTime] {
        match class {
            NotificationClass::FifteenMinutes => &self.fifteen_minutes,
            NotificationClass::OneMinute => &self.one_minute,
        }
    }
}

/// Derives trigger times by subtracting each class offset from every
/// call start. Subtraction wraps around midnight, so a 00:10 call
/// yields a 23:55 trigger for the 15 minute class.
pub fn compile_trigger_times(calls: &[Call]) -> Result<TriggerTimes, NotifierError> {
    if calls.is_empty() {
        return Err(NotifierError::EmptyCallSchedule);
    }

    let mut fifteen_minutes = Vec::with_capacity(calls.len());
    let mut one_minute = Vec::with_capacity(calls.len());
    for call in calls {
        let start = parse_call_time(&call.time_start)?;
        fifteen_minutes.push(start - NotificationClass::FifteenMinutes.offset());
        one_minute.push(start - NotificationClass::OneMinute.offset());
    }

    Ok(TriggerTimes {
        fifteen_minutes,
        one_minute,
    })
}

/// Parses an `HH:MM` call schedule time.
pub(crate) fn parse_call_time(value: &str) -> Result<NaiveTime, NotifierError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|source| NotifierError::InvalidCallTime {
        value: value.to_string(),
        source,
    })
}

/// Deduplicates times, keeping first occurrence order.
pub(crate) fn distinct_times(times: &[NaiveTime]) -> Vec<NaiveTime> {
    let mut distinct = Vec::with_capacity(times.len());
    for time in times {
        if !distinct.contains(time) {
            distinct.push(*time);
        }
    }
    distinct
}
