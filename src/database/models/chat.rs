use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::notifier::NotificationClass;

/// A Telegram chat known to the bot, with its notification settings.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: i64,
    pub group_id: Option<i64>,
    pub lang_code: String,
    pub cl_notif_15m: bool,
    pub cl_notif_1m: bool,
    pub created_at: String,
}

impl Chat {
    pub async fn find(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Chat>(
            "SELECT chat_id, group_id, lang_code, cl_notif_15m, cl_notif_1m, created_at FROM chats WHERE chat_id = ?"
        )
        .bind(chat_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &sqlx::SqlitePool, chat_id: i64) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query("INSERT OR IGNORE INTO chats (chat_id, created_at) VALUES (?, ?)")
            .bind(chat_id)
            .bind(now.to_rfc3339())
            .execute(pool)
            .await?;

        // Fetch the created chat
        Self::find(pool, chat_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn set_group(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
        group_id: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE chats SET group_id = ? WHERE chat_id = ?")
            .bind(group_id)
            .bind(chat_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_language(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
        lang_code: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE chats SET lang_code = ? WHERE chat_id = ?")
            .bind(lang_code)
            .bind(chat_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_notification(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
        class: NotificationClass,
        enabled: bool,
    ) -> Result<(), sqlx::Error> {
        let query = match class {
            NotificationClass::FifteenMinutes => {
                "UPDATE chats SET cl_notif_15m = ? WHERE chat_id = ?"
            }
            NotificationClass::OneMinute => "UPDATE chats SET cl_notif_1m = ? WHERE chat_id = ?",
        };
        sqlx::query(query)
            .bind(enabled)
            .bind(chat_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Chats subscribed to the given notification class with a group selected.
    pub async fn find_subscribed(
        pool: &sqlx::SqlitePool,
        class: NotificationClass,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = match class {
            NotificationClass::FifteenMinutes => {
                "SELECT chat_id, group_id, lang_code, cl_notif_15m, cl_notif_1m, created_at FROM chats WHERE cl_notif_15m = 1 AND group_id IS NOT NULL"
            }
            NotificationClass::OneMinute => {
                "SELECT chat_id, group_id, lang_code, cl_notif_15m, cl_notif_1m, created_at FROM chats WHERE cl_notif_1m = 1 AND group_id IS NOT NULL"
            }
        };
        sqlx::query_as::<_, Chat>(query).fetch_all(pool).await
    }
}
