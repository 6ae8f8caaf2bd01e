//! Renders notification messages and their inline reply actions.

use teloxide::utils::markdown;

use crate::api::DaySchedule;
use crate::i18n::Language;

use super::NotificationClass;

/// One inline button: a label and the callback data it sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyAction {
    pub label: String,
    pub data: String,
}

/// Builds the MarkdownV2 notification text and its reply actions for
/// one chat.
pub fn build_notification(
    lang: &Language,
    day: &DaySchedule,
    class: NotificationClass,
) -> (String, Vec<ReplyAction>) {
    let text = lang
        .page
        .classes_notification
        .replace("{remaining}", class.label())
        .replace("{schedule}", &schedule_section(day));

    let actions = vec![
        ReplyAction {
            label: lang.button.open_schedule.clone(),
            data: format!("open.schedule.day#from=notification&date={}", day.date),
        },
        ReplyAction {
            label: lang.button.settings.clone(),
            data: "open.settings#from=notification".to_string(),
        },
    ];

    (text, actions)
}

/// One line per period, `` `N\)` *Name*`[Type]` ``, newline separated.
fn schedule_section(day: &DaySchedule) -> String {
    let mut lines = Vec::new();
    for lesson in &day.lessons {
        for period in &lesson.periods {
            lines.push(format!(
                "`{}\\)` *{}*`[{}]`",
                lesson.number,
                markdown::escape(&period.discipline_short_name),
                markdown::escape(&period.type_str)
            ));
        }
    }
    lines.join("\n")
}
