//! Database maintenance tool.
//!
//! Applies migrations, reports what the database holds, or wipes it
//! for a clean start. Reads `DATABASE_URL` like the bot itself.

use std::env;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use class_reminder_bot::database::{Chat, DatabaseManager};
use class_reminder_bot::notifier::NotificationClass;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/class-reminder.db";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let database_url = resolve_database_url(env::var("DATABASE_URL").ok());
    let command = env::args().nth(1).unwrap_or_else(|| "migrate".to_string());

    match command.as_str() {
        "migrate" | "up" => migrate(&database_url).await,
        "status" => status(&database_url).await,
        "reset" => reset(&database_url).await,
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            std::process::exit(2);
        }
    }
}

async fn migrate(database_url: &str) -> Result<()> {
    info!("Using database {}", database_url);
    let db = DatabaseManager::new(database_url).await?;
    db.run_migrations().await?;
    println!("✅ Database ready");
    Ok(())
}

/// Prints the applied migrations and what the chats table holds.
async fn status(database_url: &str) -> Result<()> {
    let db = DatabaseManager::new(database_url).await?;

    let migrations: Vec<(i64, String)> =
        sqlx::query_as("SELECT version, description FROM _sqlx_migrations ORDER BY version")
            .fetch_all(&db.pool)
            .await
            .unwrap_or_default();

    if migrations.is_empty() {
        println!("⚠️  No migrations applied, run `migrate` first");
        return Ok(());
    }

    println!("Applied migrations:");
    for (version, description) in &migrations {
        println!("  {version} {description}");
    }

    let chats: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats")
        .fetch_one(&db.pool)
        .await?;
    println!("Chats: {chats}");
    for class in NotificationClass::ALL {
        let subscribers = Chat::find_subscribed(&db.pool, class).await?.len();
        println!("  subscribed to {class} reminders: {subscribers}");
    }

    Ok(())
}

/// Deletes the database file and re-applies every migration.
async fn reset(database_url: &str) -> Result<()> {
    let file = sqlite_file(database_url)
        .ok_or_else(|| anyhow!("reset needs a file backed sqlite url, got {database_url}"))?;

    println!("⚠️  This deletes {file} and every chat's settings with it.");
    print!("Type 'yes' to continue: ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    if answer.trim() != "yes" {
        println!("Aborted");
        return Ok(());
    }

    // Sqlite keeps WAL sidecar files next to the database
    for path in [file.to_string(), format!("{file}-shm"), format!("{file}-wal")] {
        if Path::new(&path).exists() {
            std::fs::remove_file(&path)?;
            info!("Removed {}", path);
        }
    }

    migrate(database_url).await
}

fn resolve_database_url(env_value: Option<String>) -> String {
    match env_value {
        Some(url) if !url.trim().is_empty() => url,
        _ => DEFAULT_DATABASE_URL.to_string(),
    }
}

/// File path behind a sqlite url, if it has one.
fn sqlite_file(url: &str) -> Option<&str> {
    let path = url.strip_prefix("sqlite:")?;
    let path = path.strip_prefix("//").unwrap_or(path);
    (!path.is_empty() && path != ":memory:").then_some(path)
}

fn print_usage() {
    println!("Usage: migrate [COMMAND]");
    println!();
    println!("Commands:");
    println!("  migrate  Apply pending migrations (default)");
    println!("  status   Show applied migrations and subscriber counts");
    println!("  reset    Delete the database file and migrate from scratch");
    println!("  help     Show this help");
}
