#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Europe::Kyiv;
use chrono_tz::Tz;
use class_reminder_bot::api::{ApiError, Call, DaySchedule, Lesson, Period, ScheduleApi};
use class_reminder_bot::i18n::{ButtonStrings, Language, PageStrings};
use class_reminder_bot::notifier::{
    Messenger, NotificationClass, Notifier, NotifierService, ReplyAction, SubscriberStore,
    Subscription,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeApi {
    calls: Vec<Call>,
    days: HashMap<i64, DaySchedule>,
    failing_groups: HashSet<i64>,
    failing_call_schedule: bool,
}

#[async_trait]
impl ScheduleApi for FakeApi {
    async fn call_schedule(&self) -> Result<Vec<Call>, ApiError> {
        if self.failing_call_schedule {
            return Err(ApiError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(self.calls.clone())
    }

    async fn group_schedule_day(
        &self,
        group_id: i64,
        date: NaiveDate,
    ) -> Result<DaySchedule, ApiError> {
        if self.failing_groups.contains(&group_id) {
            return Err(ApiError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(self
            .days
            .get(&group_id)
            .cloned()
            .unwrap_or(DaySchedule {
                date,
                lessons: vec![],
            }))
    }
}

#[derive(Default)]
struct FakeStore {
    subscriptions: HashMap<NotificationClass, Vec<Subscription>>,
    fail: bool,
    queried: Mutex<Vec<NotificationClass>>,
}

#[async_trait]
impl SubscriberStore for FakeStore {
    async fn subscribed(&self, class: NotificationClass) -> anyhow::Result<Vec<Subscription>> {
        self.queried.lock().unwrap().push(class);
        if self.fail {
            anyhow::bail!("store offline");
        }
        Ok(self.subscriptions.get(&class).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<(i64, String, Vec<ReplyAction>)>>,
    failing_chats: HashSet<i64>,
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_notification(
        &self,
        chat_id: i64,
        text: &str,
        actions: &[ReplyAction],
    ) -> anyhow::Result<()> {
        if self.failing_chats.contains(&chat_id) {
            anyhow::bail!("blocked by user");
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id, text.to_string(), actions.to_vec()));
        Ok(())
    }
}

fn kyiv(h: u32, m: u32) -> DateTime<Tz> {
    Kyiv.with_ymd_and_hms(2024, 9, 2, h, m, 0).single().unwrap()
}

fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

fn calls() -> Vec<Call> {
    vec![
        Call {
            number: 1,
            time_start: "08:00".to_string(),
            time_end: "08:45".to_string(),
        },
        Call {
            number: 2,
            time_start: "08:50".to_string(),
            time_end: "09:35".to_string(),
        },
    ]
}

fn lesson_day(lesson_number: i32, discipline: &str) -> DaySchedule {
    DaySchedule {
        date: test_date(),
        lessons: vec![Lesson {
            number: lesson_number,
            periods: vec![Period {
                discipline_short_name: discipline.to_string(),
                type_str: "Лк".to_string(),
            }],
        }],
    }
}

fn langs() -> HashMap<String, Language> {
    let mut langs = HashMap::new();
    langs.insert(
        "en".to_string(),
        Language {
            page: PageStrings {
                classes_notification: "Classes start in {remaining}\n{schedule}".to_string(),
            },
            button: ButtonStrings {
                open_schedule: "Schedule".to_string(),
                settings: "Settings".to_string(),
            },
        },
    );
    langs.insert(
        "uk".to_string(),
        Language {
            page: PageStrings {
                classes_notification: "Пари через {remaining}\n{schedule}".to_string(),
            },
            button: ButtonStrings {
                open_schedule: "Розклад".to_string(),
                settings: "Налаштування".to_string(),
            },
        },
    );
    langs
}

fn subscription(chat_id: i64, group_id: i64, lang_code: &str) -> Subscription {
    Subscription {
        chat_id,
        group_id,
        lang_code: lang_code.to_string(),
    }
}

fn store_with(class: NotificationClass, subs: Vec<Subscription>) -> Arc<FakeStore> {
    Arc::new(FakeStore {
        subscriptions: HashMap::from([(class, subs)]),
        ..FakeStore::default()
    })
}

fn notifier(api: FakeApi, store: Arc<FakeStore>, messenger: Arc<RecordingMessenger>) -> Notifier {
    Notifier::new(
        Arc::new(api),
        store,
        messenger,
        langs(),
        "en".to_string(),
        calls(),
        Kyiv,
    )
}

#[tokio::test]
async fn test_sends_to_every_subscribed_chat() {
    let api = FakeApi {
        days: HashMap::from([
            (10, lesson_day(2, "Алгоритми")),
            (20, lesson_day(2, "Фізика")),
        ]),
        ..FakeApi::default()
    };
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![
            subscription(1, 10, "en"),
            subscription(2, 10, "en"),
            subscription(3, 20, "uk"),
        ],
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await
        .unwrap();

    let sent = messenger.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].0, 1);
    assert!(sent[0].1.starts_with("Classes start in 15m\n"));
    assert_eq!(sent[2].0, 3);
    assert!(sent[2].1.starts_with("Пари через 15m\n"));
}

#[tokio::test]
async fn test_forwards_both_reply_actions() {
    let api = FakeApi {
        days: HashMap::from([(10, lesson_day(2, "Алгоритми"))]),
        ..FakeApi::default()
    };
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![subscription(1, 10, "en")],
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await
        .unwrap();

    let sent = messenger.sent.lock().unwrap();
    let actions = &sent[0].2;
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].label, "Schedule");
    assert_eq!(
        actions[0].data,
        "open.schedule.day#from=notification&date=2024-09-02"
    );
    assert_eq!(actions[1].data, "open.settings#from=notification");
}

#[tokio::test]
async fn test_failing_schedule_fetch_only_skips_that_chat() {
    let api = FakeApi {
        days: HashMap::from([
            (10, lesson_day(2, "Алгоритми")),
            (20, lesson_day(2, "Фізика")),
        ]),
        failing_groups: HashSet::from([66]),
        ..FakeApi::default()
    };
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![
            subscription(1, 10, "en"),
            subscription(2, 66, "en"),
            subscription(3, 20, "en"),
        ],
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await
        .unwrap();

    let sent = messenger.sent.lock().unwrap();
    let chat_ids: Vec<i64> = sent.iter().map(|entry| entry.0).collect();
    assert_eq!(chat_ids, vec![1, 3]);
}

#[tokio::test]
async fn test_failing_send_does_not_abort_the_batch() {
    let api = FakeApi {
        days: HashMap::from([(10, lesson_day(2, "Алгоритми"))]),
        ..FakeApi::default()
    };
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![
            subscription(1, 10, "en"),
            subscription(2, 10, "en"),
            subscription(3, 10, "en"),
        ],
    );
    let messenger = Arc::new(RecordingMessenger {
        failing_chats: HashSet::from([2]),
        ..RecordingMessenger::default()
    });
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await
        .unwrap();

    let sent = messenger.sent.lock().unwrap();
    let chat_ids: Vec<i64> = sent.iter().map(|entry| entry.0).collect();
    assert_eq!(chat_ids, vec![1, 3]);
}

#[tokio::test]
async fn test_unknown_language_skips_only_that_chat() {
    let api = FakeApi {
        days: HashMap::from([(10, lesson_day(2, "Алгоритми"))]),
        ..FakeApi::default()
    };
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![subscription(1, 10, "de"), subscription(2, 10, "en")],
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await
        .unwrap();

    let sent = messenger.sent.lock().unwrap();
    let chat_ids: Vec<i64> = sent.iter().map(|entry| entry.0).collect();
    assert_eq!(chat_ids, vec![2]);
}

#[tokio::test]
async fn test_empty_language_falls_back_to_the_default() {
    let api = FakeApi {
        days: HashMap::from([(10, lesson_day(2, "Алгоритми"))]),
        ..FakeApi::default()
    };
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![subscription(1, 10, "")],
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await
        .unwrap();

    let sent = messenger.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.starts_with("Classes start in 15m\n"));
}

#[tokio::test]
async fn test_outside_the_window_sends_nothing() {
    let api = FakeApi {
        days: HashMap::from([(10, lesson_day(2, "Алгоритми"))]),
        ..FakeApi::default()
    };
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![subscription(1, 10, "en")],
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(9, 40))
        .await
        .unwrap();

    assert!(messenger.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_hidden_lessons_send_nothing() {
    let api = FakeApi {
        days: HashMap::from([(10, lesson_day(2, "Приховано з 02.09"))]),
        ..FakeApi::default()
    };
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![subscription(1, 10, "en")],
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await
        .unwrap();

    assert!(messenger.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_a_chat_without_lessons_today_is_skipped() {
    let api = FakeApi::default();
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![subscription(1, 10, "en")],
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await
        .unwrap();

    assert!(messenger.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failure_aborts_the_batch() {
    let api = FakeApi {
        days: HashMap::from([(10, lesson_day(2, "Алгоритми"))]),
        ..FakeApi::default()
    };
    let store = Arc::new(FakeStore {
        fail: true,
        ..FakeStore::default()
    });
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    let result = notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await;

    assert!(result.is_err());
    assert!(messenger.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_each_firing_is_independent() {
    let api = FakeApi {
        days: HashMap::from([(10, lesson_day(2, "Алгоритми"))]),
        ..FakeApi::default()
    };
    let store = store_with(
        NotificationClass::FifteenMinutes,
        vec![subscription(1, 10, "en")],
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store, messenger.clone());

    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 49))
        .await
        .unwrap();
    notifier
        .send_notifications(NotificationClass::FifteenMinutes, kyiv(8, 50))
        .await
        .unwrap();

    assert_eq!(messenger.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_routes_the_requested_class_to_the_store() {
    let api = FakeApi {
        days: HashMap::from([(10, lesson_day(2, "Алгоритми"))]),
        ..FakeApi::default()
    };
    let store = store_with(NotificationClass::OneMinute, vec![subscription(1, 10, "en")]);
    let messenger = Arc::new(RecordingMessenger::default());
    let notifier = notifier(api, store.clone(), messenger.clone());

    notifier
        .send_notifications(NotificationClass::OneMinute, kyiv(8, 49))
        .await
        .unwrap();

    assert_eq!(
        *store.queried.lock().unwrap(),
        vec![NotificationClass::OneMinute]
    );
    let sent = messenger.sent.lock().unwrap();
    assert!(sent[0].1.starts_with("Classes start in 1m\n"));
}

#[tokio::test]
async fn test_setup_compiles_trigger_times() {
    let api = FakeApi {
        calls: calls(),
        ..FakeApi::default()
    };
    let store = Arc::new(FakeStore::default());
    let messenger = Arc::new(RecordingMessenger::default());

    let service = NotifierService::setup(
        Arc::new(api),
        store,
        messenger,
        langs(),
        "en".to_string(),
        Kyiv,
    )
    .await
    .unwrap();

    let time = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
    assert_eq!(
        service.trigger_times().fifteen_minutes,
        vec![time(7, 45), time(8, 35)]
    );
    assert_eq!(
        service.trigger_times().one_minute,
        vec![time(7, 59), time(8, 49)]
    );
}

#[tokio::test]
async fn test_setup_rejects_an_empty_call_schedule() {
    let api = FakeApi::default();
    let store = Arc::new(FakeStore::default());
    let messenger = Arc::new(RecordingMessenger::default());

    let result = NotifierService::setup(
        Arc::new(api),
        store,
        messenger,
        langs(),
        "en".to_string(),
        Kyiv,
    )
    .await;

    let err = result.err().unwrap();
    assert!(format!("{err:#}").contains("call schedule is empty"));
}

#[tokio::test]
async fn test_setup_fails_when_the_call_schedule_cannot_be_loaded() {
    let api = FakeApi {
        failing_call_schedule: true,
        ..FakeApi::default()
    };
    let store = Arc::new(FakeStore::default());
    let messenger = Arc::new(RecordingMessenger::default());

    let result = NotifierService::setup(
        Arc::new(api),
        store,
        messenger,
        langs(),
        "en".to_string(),
        Kyiv,
    )
    .await;

    let err = result.err().unwrap();
    assert!(format!("{err:#}").contains("failed to load the call schedule"));
}

#[tokio::test]
async fn test_send_notifications_now_queries_the_store() {
    let api = FakeApi {
        calls: calls(),
        ..FakeApi::default()
    };
    let store = Arc::new(FakeStore::default());
    let messenger = Arc::new(RecordingMessenger::default());

    let service = NotifierService::setup(
        Arc::new(api),
        store.clone(),
        messenger,
        langs(),
        "en".to_string(),
        Kyiv,
    )
    .await
    .unwrap();

    service
        .send_notifications_now(NotificationClass::FifteenMinutes)
        .await
        .unwrap();

    assert_eq!(
        *store.queried.lock().unwrap(),
        vec![NotificationClass::FifteenMinutes]
    );
}
