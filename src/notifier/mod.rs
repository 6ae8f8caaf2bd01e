//! Class notification scheduling and dispatch.
//!
//! The [`NotifierService`] compiles the daily call schedule into
//! trigger times, registers a timezone aware cron job for each one,
//! and dispatches notifications to subscribed chats when a job fires.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

use crate::api::{Call, ScheduleApi};
use crate::i18n::{self, Language};

mod message;
mod telegram;
mod triggers;
mod window;

pub use self::message::ReplyAction;
pub use self::telegram::TelegramMessenger;
pub use self::triggers::TriggerTimes;

/// How far ahead of a class start a notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationClass {
    FifteenMinutes,
    OneMinute,
}

impl NotificationClass {
    pub const ALL: [NotificationClass; 2] = [
        NotificationClass::FifteenMinutes,
        NotificationClass::OneMinute,
    ];

    /// Lead time between the trigger and the class start.
    pub fn offset(self) -> Duration {
        match self {
            NotificationClass::FifteenMinutes => Duration::minutes(15),
            NotificationClass::OneMinute => Duration::minutes(1),
        }
    }

    /// Short label used in messages and logs.
    pub fn label(self) -> &'static str {
        match self {
            NotificationClass::FifteenMinutes => "15m",
            NotificationClass::OneMinute => "1m",
        }
    }
}

impl fmt::Display for NotificationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors in schedule data the notifier cannot work around.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("call schedule is empty")]
    EmptyCallSchedule,
    #[error("invalid call schedule time {value:?}")]
    InvalidCallTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("call schedule has no call number {number}")]
    UnknownCallNumber { number: i32 },
    #[error("local time {date} {time} does not exist in {timezone}")]
    NonexistentLocalTime {
        date: NaiveDate,
        time: NaiveTime,
        timezone: Tz,
    },
}

/// A chat eligible for notifications: its id, chosen group and language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub chat_id: i64,
    pub group_id: i64,
    pub lang_code: String,
}

/// Lists chats subscribed to a notification class.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn subscribed(&self, class: NotificationClass) -> Result<Vec<Subscription>>;
}

/// Delivers a rendered notification to one chat. Actions render as a
/// single row of inline buttons.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_notification(
        &self,
        chat_id: i64,
        text: &str,
        actions: &[ReplyAction],
    ) -> Result<()>;
}

/// Dispatches one notification batch to every subscribed chat.
pub struct Notifier {
    api: Arc<dyn ScheduleApi>,
    store: Arc<dyn SubscriberStore>,
    messenger: Arc<dyn Messenger>,
    langs: HashMap<String, Language>,
    default_lang: String,
    calls: Vec<Call>,
    timezone: Tz,
    // Read-held by every firing; stop() takes it exclusively to drain.
    in_flight: RwLock<()>,
}

impl Notifier {
    pub fn new(
        api: Arc<dyn ScheduleApi>,
        store: Arc<dyn SubscriberStore>,
        messenger: Arc<dyn Messenger>,
        langs: HashMap<String, Language>,
        default_lang: String,
        calls: Vec<Call>,
        timezone: Tz,
    ) -> Self {
        Self {
            api,
            store,
            messenger,
            langs,
            default_lang,
            calls,
            timezone,
            in_flight: RwLock::new(()),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Sends one batch of `class` notifications, evaluated at `now`.
    ///
    /// A failure for one chat never aborts the batch; it is logged and
    /// the remaining chats are still notified.
    pub async fn send_notifications(&self, class: NotificationClass, now: DateTime<Tz>) -> Result<()> {
        let _firing = self.in_flight.read().await;
        let subscribers = self
            .store
            .subscribed(class)
            .await
            .context("failed to load subscribed chats")?;
        if subscribers.is_empty() {
            debug!("No chats subscribed to {} notifications", class);
            return Ok(());
        }

        info!(
            "Sending {} notifications to {} chats",
            class,
            subscribers.len()
        );
        let today = now.date_naive();
        let mut sent = 0;
        let mut skipped = 0;
        let mut failed = 0;
        for chat in &subscribers {
            match self.notify_chat(chat, class, today, now).await {
                Ok(true) => sent += 1,
                Ok(false) => skipped += 1,
                Err(e) => {
                    failed += 1;
                    warn!("Failed to notify chat {}: {:#}", chat.chat_id, e);
                }
            }
        }
        info!(
            "Finished {} notifications: {} sent, {} skipped, {} failed",
            class, sent, skipped, failed
        );
        Ok(())
    }

    async fn notify_chat(
        &self,
        chat: &Subscription,
        class: NotificationClass,
        today: NaiveDate,
        now: DateTime<Tz>,
    ) -> Result<bool> {
        let day = self
            .api
            .group_schedule_day(chat.group_id, today)
            .await
            .context("failed to fetch the group schedule")?;
        if !window::has_upcoming_lesson(&day, &self.calls, now)? {
            return Ok(false);
        }

        let lang = i18n::resolve(&self.langs, &chat.lang_code, &self.default_lang)?;
        let (text, actions) = message::build_notification(lang, &day, class);
        self.messenger
            .send_notification(chat.chat_id, &text, &actions)
            .await
            .context("failed to send the notification")?;
        Ok(true)
    }
}

/// Owns the cron scheduler and the compiled trigger times.
pub struct NotifierService {
    notifier: Arc<Notifier>,
    trigger_times: TriggerTimes,
    scheduler: JobScheduler,
}

impl NotifierService {
    /// Loads the call schedule, compiles trigger times and registers
    /// one daily job per distinct trigger time.
    pub async fn setup(
        api: Arc<dyn ScheduleApi>,
        store: Arc<dyn SubscriberStore>,
        messenger: Arc<dyn Messenger>,
        langs: HashMap<String, Language>,
        default_lang: String,
        timezone: Tz,
    ) -> Result<Self> {
        let calls = api
            .call_schedule()
            .await
            .context("failed to load the call schedule")?;
        let trigger_times = triggers::compile_trigger_times(&calls)?;
        info!(
            "Compiled notification triggers for {} calls in {}",
            calls.len(),
            timezone
        );

        let notifier = Arc::new(Notifier::new(
            api,
            store,
            messenger,
            langs,
            default_lang,
            calls,
            timezone,
        ));
        let scheduler = JobScheduler::new().await?;

        let service = Self {
            notifier,
            trigger_times,
            scheduler,
        };
        service.register_jobs().await?;
        Ok(service)
    }

    async fn register_jobs(&self) -> Result<()> {
        let timezone = self.notifier.timezone();
        let mut jobs = 0;
        for class in NotificationClass::ALL {
            for time in triggers::distinct_times(self.trigger_times.for_class(class)) {
                let schedule = format!("0 {} {} * * *", time.minute(), time.hour());
                let notifier = Arc::clone(&self.notifier);
                let job = Job::new_async_tz(schedule.as_str(), timezone, move |_uuid, _lock| {
                    let notifier = notifier.clone();
                    Box::pin(async move {
                        let now = Utc::now().with_timezone(&notifier.timezone());
                        if let Err(e) = notifier.send_notifications(class, now).await {
                            tracing::error!("Failed to send {} notifications: {:#}", class, e);
                        }
                    })
                })?;
                self.scheduler.add(job).await?;
                jobs += 1;
            }
        }
        debug!("Registered {} notification jobs", jobs);
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler.start().await?;
        info!(
            "Notifier service started in {}",
            self.notifier.timezone()
        );
        Ok(())
    }

    /// Stops the scheduler and waits for a firing already in progress
    /// to finish its batch.
    pub async fn stop(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        let drained = self.notifier.in_flight.write().await;
        drop(drained);
        Ok(())
    }

    // Manual trigger for testing
    pub async fn send_notifications_now(&self, class: NotificationClass) -> Result<()> {
        let now = Utc::now().with_timezone(&self.notifier.timezone());
        self.notifier.send_notifications(class, now).await
    }

    pub fn trigger_times(&self) -> &TriggerTimes {
        &self.trigger_times
    }
}
