//! # Class Reminder Bot Main Entry Point
//!
//! This is the main entry point for the Class Reminder Bot application.
//! It initializes logging, loads configuration and languages, sets up
//! the database, starts the notifier service, and serves health checks.

use anyhow::Result;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use class_reminder_bot::api::TimetableClient;
use class_reminder_bot::config::Config;
use class_reminder_bot::database::connection::DatabaseManager;
use class_reminder_bot::i18n;
use class_reminder_bot::notifier::{NotifierService, TelegramMessenger};
use class_reminder_bot::services::health::HealthService;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "class_reminder_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Class Reminder Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, Timezone: {}, HTTP Port: {}",
        config.database_url, config.timezone, config.http_port
    );

    // Initialize database
    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    // Load languages
    info!("Loading languages from {}...", config.langs_dir);
    let langs = i18n::load_languages(Path::new(&config.langs_dir))?;
    anyhow::ensure!(
        langs.contains_key(&config.default_lang),
        "default language {:?} is missing from {}",
        config.default_lang,
        config.langs_dir
    );
    info!("Loaded {} languages", langs.len());

    // Initialize bot
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram_bot_token);
    let messenger = Arc::new(TelegramMessenger::new(bot));
    info!("Telegram bot initialized successfully");

    // Initialize and start notifier service
    info!("Initializing notifier service...");
    let api = Arc::new(TimetableClient::new(&config.timetable_api_url)?);
    let mut notifier_service = match NotifierService::setup(
        api,
        db_arc.clone(),
        messenger,
        langs,
        config.default_lang.clone(),
        config.timezone,
    )
    .await
    {
        Ok(service) => {
            info!("Notifier service initialized successfully");
            service
        }
        Err(e) => {
            tracing::error!("Failed to create notifier service: {:#}", e);
            return Err(e);
        }
    };

    if let Err(e) = notifier_service.start().await {
        tracing::error!("Failed to start notifier service: {:#}", e);
    } else {
        info!("Notifier service started successfully");
    }

    // Initialize health service
    let health_service = HealthService::new(db_arc.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // Run until interrupted or the health server exits
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
            }
        }
        result = health_task => {
            if let Err(e) = result {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    // Stop notifier service on shutdown
    if let Err(e) = notifier_service.stop().await {
        tracing::warn!("Error stopping notifier service: {:#}", e);
    }

    info!("Application stopped");
    Ok(())
}
