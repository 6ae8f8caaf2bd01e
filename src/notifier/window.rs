//! Decides whether a schedule day warrants a notification right now.

use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;

use crate::api::{Call, DaySchedule};

use super::triggers::parse_call_time;
use super::NotifierError;

/// Lessons whose first period name contains this marker (case
/// insensitive) are placeholders and never notified.
pub const HIDDEN_LESSON_MARKER: &str = "приховано";

/// Decides whether `now` falls inside the notification window for the
/// group's first lesson of the day.
///
/// The window is the open interval between the end of the previous
/// call and the end of the lesson's own call. With no previous call,
/// or when both calls share an end time, the lower bound is one minute
/// before `now`.
pub fn has_upcoming_lesson(
    day: &DaySchedule,
    calls: &[Call],
    now: DateTime<Tz>,
) -> Result<bool, NotifierError> {
    let Some(first_lesson) = day.lessons.first() else {
        return Ok(false);
    };
    let Some(first_period) = first_lesson.periods.first() else {
        return Ok(false);
    };
    if first_period
        .discipline_short_name
        .to_lowercase()
        .contains(HIDDEN_LESSON_MARKER)
    {
        return Ok(false);
    }

    let position = calls
        .iter()
        .position(|call| call.number == first_lesson.number)
        .ok_or(NotifierError::UnknownCallNumber {
            number: first_lesson.number,
        })?;
    let current_end = end_of_call(&calls[position], now)?;

    let previous = position.checked_sub(1).map(|i| &calls[i]);
    let lower_bound = match previous {
        Some(previous) => {
            let previous_end = end_of_call(previous, now)?;
            if previous_end == current_end {
                now - Duration::minutes(1)
            } else {
                previous_end
            }
        }
        None => now - Duration::minutes(1),
    };

    Ok(lower_bound < now && now < current_end)
}

/// The call's end on `now`'s local date.
fn end_of_call(call: &Call, now: DateTime<Tz>) -> Result<DateTime<Tz>, NotifierError> {
    let date = now.date_naive();
    let time = parse_call_time(&call.time_end)?;
    let timezone = now.timezone();
    timezone
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or(NotifierError::NonexistentLocalTime {
            date,
            time,
            timezone,
        })
}
