use anyhow::Result;
use async_trait::async_trait;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::info;

use crate::database::models::Chat;
use crate::notifier::{NotificationClass, SubscriberStore, Subscription};

#[derive(Clone)]
pub struct DatabaseManager {
    pub pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            info!("Creating database {}", database_url);
            Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SubscriberStore for DatabaseManager {
    async fn subscribed(&self, class: NotificationClass) -> Result<Vec<Subscription>> {
        let chats = Chat::find_subscribed(&self.pool, class).await?;
        Ok(chats
            .into_iter()
            .filter_map(|chat| {
                chat.group_id.map(|group_id| Subscription {
                    chat_id: chat.chat_id,
                    group_id,
                    lang_code: chat.lang_code,
                })
            })
            .collect())
    }
}
